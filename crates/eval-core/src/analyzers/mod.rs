//! Advanced Analyzers (component H): independent signal generators the
//! scorer blends into a `MultiDimensionalScore`. Each submodule is
//! self-contained and can be exercised directly in tests without going
//! through the scorer.

pub mod best_practices;
pub mod complexity;
pub mod error_taxonomy;
pub mod performance;
pub mod plan;
pub mod semantic;
