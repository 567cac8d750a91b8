//! Scorer (component I): combines every upstream signal into a single
//! `MultiDimensionalScore`. Pure — takes already-computed component outputs
//! and a weight vector, does no parsing or execution of its own.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzers::best_practices::BestPracticesReport;
use crate::analyzers::complexity::ComplexityReport;
use crate::analyzers::error_taxonomy;
use crate::analyzers::plan::PlanReport;
use crate::analyzers::semantic::SemanticReport;
use crate::comparator::ComparisonResult;
use crate::detector::{HallucinationReport, ValidationResult};
use crate::dialect::Dialect;
use crate::engine::ExecutionResult;
use crate::task::issue_codes;

/// The seven scoring dimensions and their weights, as a plain record so a
/// caller can supply an explicit vector instead of a named preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub correctness: f64,
    pub safety: f64,
    pub efficiency: f64,
    pub result_completeness: f64,
    pub semantic_accuracy: f64,
    pub best_practices: f64,
    pub plan_quality: f64,
}

impl ScoreWeights {
    pub const DEFAULT: Self = Self {
        correctness: 0.35,
        safety: 0.20,
        efficiency: 0.15,
        result_completeness: 0.10,
        semantic_accuracy: 0.10,
        best_practices: 0.05,
        plan_quality: 0.05,
    };

    pub const STRICT: Self = Self {
        correctness: 0.45,
        safety: 0.30,
        efficiency: 0.05,
        result_completeness: 0.05,
        semantic_accuracy: 0.10,
        best_practices: 0.025,
        plan_quality: 0.025,
    };

    pub const PERFORMANCE: Self = Self {
        correctness: 0.20,
        safety: 0.15,
        efficiency: 0.35,
        result_completeness: 0.10,
        semantic_accuracy: 0.05,
        best_practices: 0.05,
        plan_quality: 0.10,
    };

    pub const QUALITY: Self = Self {
        correctness: 0.25,
        safety: 0.15,
        efficiency: 0.10,
        result_completeness: 0.10,
        semantic_accuracy: 0.15,
        best_practices: 0.15,
        plan_quality: 0.10,
    };

    pub fn sum(&self) -> f64 {
        self.correctness
            + self.safety
            + self.efficiency
            + self.result_completeness
            + self.semantic_accuracy
            + self.best_practices
            + self.plan_quality
    }

    /// Validates the sum-to-one invariant an explicit weight map must
    /// satisfy (§6 `EvalOptions.weights_preset`).
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() <= 1e-6
    }
}

/// `weights_preset` (§6): one of the named presets, or an explicit vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WeightsPreset {
    Default,
    Strict,
    Performance,
    Quality,
    Custom(ScoreWeights),
}

impl Default for WeightsPreset {
    fn default() -> Self {
        WeightsPreset::Default
    }
}

impl WeightsPreset {
    pub fn resolve(&self) -> ScoreWeights {
        match self {
            WeightsPreset::Default => ScoreWeights::DEFAULT,
            WeightsPreset::Strict => ScoreWeights::STRICT,
            WeightsPreset::Performance => ScoreWeights::PERFORMANCE,
            WeightsPreset::Quality => ScoreWeights::QUALITY,
            WeightsPreset::Custom(weights) => *weights,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDimensions {
    pub correctness: f64,
    pub safety: f64,
    pub efficiency: f64,
    pub result_completeness: f64,
    pub semantic_accuracy: f64,
    pub best_practices: f64,
    pub plan_quality: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub validation_score: f64,
    pub performance_score: f64,
    pub hallucination_score: f64,
    pub error_severity_score: f64,
}

/// Structured analysis blobs carried alongside the score, for traceability
/// (§4.I "structured analysis blobs").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAnalysis {
    pub complexity: ComplexityReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanReport>,
    pub best_practices: BestPracticesReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticReport>,
    pub hallucination: HallucinationReport,
    pub comparison: ComparisonResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiDimensionalScore {
    pub overall: f64,
    pub dimensions: ScoreDimensions,
    pub sub_scores: SubScores,
    pub weights: ScoreWeights,
    pub analysis: ScoreAnalysis,
}

/// Everything the scorer needs, gathered from the other components. Kept as
/// one struct since the scorer's only job is to combine these — it performs
/// no parsing, execution, or analysis of its own.
pub struct ScoringInputs<'a> {
    pub validation: &'a ValidationResult,
    pub hallucination: &'a HallucinationReport,
    pub execution: Option<&'a ExecutionResult>,
    pub insights: &'a [String],
    pub comparison: &'a ComparisonResult,
    pub complexity: &'a ComplexityReport,
    pub best_practices: &'a BestPracticesReport,
    pub dialect: Dialect,
    pub row_estimate: Option<u64>,
    pub plan: Option<&'a PlanReport>,
    pub semantic: Option<&'a SemanticReport>,
}

/// `validation_score`: 1.0 when there are no validation errors; otherwise
/// tiered by error count (§4.I). The specification's prose gives the tiers
/// as "0.5/0.3/0.1 for 0/1/many errors", which is internally inconsistent
/// with "1.0 if valid" when read literally as error *counts* of 0/1/many;
/// we resolve it as zero errors -> 1.0, one error -> 0.5, a handful (2-4) ->
/// 0.3, five or more -> 0.1 (documented as an Open Question resolution).
fn validation_score(validation: &ValidationResult) -> f64 {
    match validation.error_count() {
        0 => 1.0,
        1 => 0.5,
        2..=4 => 0.3,
        _ => 0.1,
    }
}

fn result_completeness_score(execution: Option<&ExecutionResult>, insights: &[String]) -> f64 {
    let Some(execution) = execution else {
        return 0.0;
    };
    if !execution.success {
        return 0.0;
    }
    let mut score = 1.0;
    if insights.iter().any(|i| i == issue_codes::EMPTY_RESULT) {
        score -= 0.2;
    } else {
        score += 0.1;
    }
    if insights.iter().any(|i| i == issue_codes::POSSIBLE_TRUNCATION) {
        score -= 0.1;
    }
    let null_heavy_count = insights
        .iter()
        .filter(|i| i.starts_with(issue_codes::NULL_HEAVY_COLUMN))
        .count();
    score -= 0.05 * null_heavy_count as f64;
    if insights.iter().any(|i| i == issue_codes::SLOW_EXECUTION) {
        score -= 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn error_severity_score(execution: Option<&ExecutionResult>) -> f64 {
    match execution {
        Some(exec) if !exec.success => {
            let category = exec
                .error
                .as_deref()
                .map(error_taxonomy::classify_message)
                .unwrap_or(error_taxonomy::ErrorCategory::Unknown);
            error_taxonomy::aggregate_error_score(&[category])
        }
        _ => 1.0,
    }
}

/// Combines every signal into a `MultiDimensionalScore` (§4.I). The overall
/// score is the weighted sum of the seven dimensions, guaranteed within
/// `1e-9` of `Σ weights[d]·score[d]` by construction (§8 invariant 1).
pub fn score(inputs: ScoringInputs<'_>, weights_preset: &WeightsPreset) -> MultiDimensionalScore {
    let weights = weights_preset.resolve();

    let validation_score = validation_score(inputs.validation);
    let performance_score = inputs.execution.map_or(0.0, |exec| {
        let thresholds = crate::analyzers::performance::adaptive_thresholds(
            inputs.dialect,
            inputs.complexity.level,
            inputs.row_estimate,
        );
        crate::analyzers::performance::score_execution_time(exec.execution_time_ms, &thresholds)
    });
    let error_severity = error_severity_score(inputs.execution);

    let correctness = inputs.comparison.match_score;
    let safety = 0.4 * validation_score + 0.6 * inputs.hallucination.weighted_score;
    let efficiency = performance_score;
    let result_completeness = result_completeness_score(inputs.execution, inputs.insights);
    let semantic_accuracy = inputs
        .semantic
        .map(|s| s.semantic_score)
        .unwrap_or(inputs.comparison.match_score);
    let best_practices = inputs.best_practices.score;
    let plan_quality = inputs.plan.map(|p| p.plan_score).unwrap_or(1.0);

    let dimensions = ScoreDimensions {
        correctness,
        safety,
        efficiency,
        result_completeness,
        semantic_accuracy,
        best_practices,
        plan_quality,
    };

    let overall = weights.correctness * dimensions.correctness
        + weights.safety * dimensions.safety
        + weights.efficiency * dimensions.efficiency
        + weights.result_completeness * dimensions.result_completeness
        + weights.semantic_accuracy * dimensions.semantic_accuracy
        + weights.best_practices * dimensions.best_practices
        + weights.plan_quality * dimensions.plan_quality;

    MultiDimensionalScore {
        overall: overall.clamp(0.0, 1.0),
        dimensions,
        sub_scores: SubScores {
            validation_score,
            performance_score,
            hallucination_score: inputs.hallucination.weighted_score,
            error_severity_score: error_severity,
        },
        weights,
        analysis: ScoreAnalysis {
            complexity: inputs.complexity.clone(),
            plan: inputs.plan.cloned(),
            best_practices: inputs.best_practices.clone(),
            semantic: inputs.semantic.cloned(),
            hallucination: inputs.hallucination.clone(),
            comparison: inputs.comparison.clone(),
        },
    }
}
