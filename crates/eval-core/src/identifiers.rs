//! The identifier set extracted from a parsed query, and the alias map that
//! ties table/CTE/subquery references together.
//!
//! Design note (see SPEC_FULL §9): CTEs and subqueries are *not* tagged by
//! sentinel strings. `Alias` is a tagged enum the detector matches on, which
//! is the "cleaner systems-language design" the original design notes call
//! out as preferable to `"(cte)"` / `"(subquery)"` string sentinels.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What a name in the alias map actually refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Alias {
    /// A real table or view, possibly qualified.
    Real(String),
    /// A common table expression introduced by `WITH`.
    Cte,
    /// A derived table (`FROM (SELECT ...) AS x`).
    Subquery,
}

impl Alias {
    pub fn is_cte_or_subquery(&self) -> bool {
        matches!(self, Alias::Cte | Alias::Subquery)
    }
}

/// Deduplicated, order-preserving extraction of every identifier a parsed
/// query references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierSet {
    /// Table references, preserving qualification (`schema.table`,
    /// `catalog.schema.table`), in first-seen order.
    pub tables: Vec<String>,
    /// Column references, qualified where present (`table.column`).
    pub columns: Vec<String>,
    /// Function calls, canonicalized to uppercase.
    pub functions: Vec<String>,
    /// alias -> what it names.
    pub aliases: BTreeMap<String, Alias>,
    /// Output-column aliases from SELECT lists, lowercased.
    pub select_aliases: BTreeSet<String>,
    /// CTE/subquery alias -> the column names it produces.
    pub cte_columns: BTreeMap<String, BTreeSet<String>>,
}

impl IdentifierSet {
    pub fn add_table(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.tables.contains(&name) {
            self.tables.push(name);
        }
    }

    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
    }

    pub fn add_function(&mut self, name: impl Into<String>) {
        let name = name.into().to_uppercase();
        if !self.functions.contains(&name) {
            self.functions.push(name);
        }
    }

    pub fn set_alias(&mut self, alias: impl Into<String>, target: Alias) {
        self.aliases.insert(alias.into(), target);
    }

    pub fn add_select_alias(&mut self, name: impl Into<String>) {
        self.select_aliases.insert(name.into().to_lowercase());
    }

    pub fn add_cte_column(&mut self, cte_alias: impl Into<String>, column: impl Into<String>) {
        self.cte_columns
            .entry(cte_alias.into())
            .or_default()
            .insert(column.into());
    }

    /// Resolves a possibly-aliased table reference to what it actually
    /// names; `None` if `name` isn't a known alias (i.e. it's a direct
    /// table/schema-qualified reference).
    pub fn resolve_alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.get(name)
    }

    /// The total count used as the denominator of the base hallucination
    /// score: every extracted table, column, and function reference.
    pub fn total_identifier_count(&self) -> usize {
        self.tables.len() + self.columns.len() + self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_table_deduplicates() {
        let mut set = IdentifierSet::default();
        set.add_table("orders");
        set.add_table("orders");
        assert_eq!(set.tables.len(), 1);
    }

    #[test]
    fn add_function_canonicalizes_uppercase() {
        let mut set = IdentifierSet::default();
        set.add_function("sum");
        set.add_function("SUM");
        assert_eq!(set.functions, vec!["SUM".to_string()]);
    }

    #[test]
    fn cte_alias_is_tagged_not_stringly() {
        let mut set = IdentifierSet::default();
        set.set_alias("m", Alias::Cte);
        assert!(set.resolve_alias("m").unwrap().is_cte_or_subquery());
        assert!(matches!(set.resolve_alias("m"), Some(Alias::Cte)));
    }
}
