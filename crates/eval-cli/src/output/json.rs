//! JSON output formatting.

use eval_core::MultiDimensionalScore;

/// Format the score as JSON. Minified when `compact`, otherwise pretty.
pub fn format_json(score: &MultiDimensionalScore, compact: bool) -> String {
    if compact {
        serde_json::to_string(score).expect("serialization cannot fail")
    } else {
        serde_json::to_string_pretty(score).expect("serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_score;

    #[test]
    fn pretty_output_is_multiline() {
        let json = format_json(&sample_score(), false);
        assert!(json.contains('\n'));
        assert!(json.contains("overall"));
    }

    #[test]
    fn compact_output_has_no_leading_newline() {
        let json = format_json(&sample_score(), true);
        assert!(!json.starts_with("{\n"));
    }
}
