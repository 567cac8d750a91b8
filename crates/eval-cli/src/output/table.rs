//! Human-readable table output formatting.

use eval_core::MultiDimensionalScore;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Format the score as human-readable text with optional colors.
pub fn format_table(score: &MultiDimensionalScore, quiet: bool, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    write_header(&mut out, colored);
    write_dimensions(&mut out, score, colored);
    write_sub_scores(&mut out, score, colored);

    if !quiet {
        write_hallucinations(&mut out, score, colored);
        write_best_practices(&mut out, score, colored);
    }

    out
}

fn write_header(out: &mut String, colored: bool) {
    let title = "Evaluation Score";
    let line = "═".repeat(40);
    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn score_cell(value: f64, colored: bool) -> String {
    let rendered = format!("{value:.3}");
    if !colored {
        return rendered;
    }
    if value >= 0.8 {
        rendered.green().to_string()
    } else if value >= 0.5 {
        rendered.yellow().to_string()
    } else {
        rendered.red().to_string()
    }
}

fn write_dimensions(out: &mut String, score: &MultiDimensionalScore, colored: bool) {
    let d = &score.dimensions;
    let w = &score.weights;
    for (name, value, weight) in [
        ("correctness", d.correctness, w.correctness),
        ("safety", d.safety, w.safety),
        ("efficiency", d.efficiency, w.efficiency),
        ("result_completeness", d.result_completeness, w.result_completeness),
        ("semantic_accuracy", d.semantic_accuracy, w.semantic_accuracy),
        ("best_practices", d.best_practices, w.best_practices),
        ("plan_quality", d.plan_quality, w.plan_quality),
    ] {
        writeln!(
            out,
            "  {name:<20} {}  (weight {weight:.2})",
            score_cell(value, colored)
        )
        .unwrap();
    }
    writeln!(out).unwrap();

    let overall_label = "overall";
    let overall = score_cell(score.overall, colored);
    if colored {
        writeln!(out, "{}: {}", overall_label.bold(), overall).unwrap();
    } else {
        writeln!(out, "{overall_label}: {overall}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_sub_scores(out: &mut String, score: &MultiDimensionalScore, colored: bool) {
    let s = &score.sub_scores;
    let heading = "Sub-scores:";
    if colored {
        writeln!(out, "{}", heading.bold()).unwrap();
    } else {
        writeln!(out, "{heading}").unwrap();
    }
    writeln!(
        out,
        "  validation={:.3}  performance={:.3}  hallucination={:.3}  error_severity={:.3}",
        s.validation_score, s.performance_score, s.hallucination_score, s.error_severity_score
    )
    .unwrap();
    writeln!(
        out,
        "  complexity={:?} ({:.3})",
        score.analysis.complexity.level, score.analysis.complexity.complexity_score
    )
    .unwrap();
    writeln!(out).unwrap();
}

fn write_hallucinations(out: &mut String, score: &MultiDimensionalScore, colored: bool) {
    let report = &score.analysis.hallucination;
    if report.is_clean() {
        return;
    }
    let heading = "Phantom identifiers:";
    if colored {
        writeln!(out, "{}", heading.bold()).unwrap();
    } else {
        writeln!(out, "{heading}").unwrap();
    }
    for t in &report.phantom_tables {
        let label = if colored { "table".red().to_string() } else { "table".to_string() };
        writeln!(out, "  [{label}] {t}").unwrap();
    }
    for c in &report.phantom_columns {
        let label = if colored { "column".red().to_string() } else { "column".to_string() };
        writeln!(out, "  [{label}] {c}").unwrap();
    }
    for f in &report.phantom_functions {
        let label = if colored { "function".yellow().to_string() } else { "function".to_string() };
        writeln!(out, "  [{label}] {f}").unwrap();
    }
    writeln!(out).unwrap();
}

fn write_best_practices(out: &mut String, score: &MultiDimensionalScore, colored: bool) {
    let report = &score.analysis.best_practices;
    if report.violations.is_empty() && report.suggestions.is_empty() {
        return;
    }
    let heading = "Best-practices:";
    if colored {
        writeln!(out, "{}", heading.bold()).unwrap();
    } else {
        writeln!(out, "{heading}").unwrap();
    }
    for v in &report.violations {
        writeln!(out, "  - {v}").unwrap();
    }
    for s in &report.suggestions {
        writeln!(out, "  * {s}").unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_score;

    #[test]
    fn renders_header_and_dimensions() {
        let output = format_table(&sample_score(), false, false);
        assert!(output.contains("Evaluation Score"));
        assert!(output.contains("overall"));
        assert!(output.contains("correctness"));
    }

    #[test]
    fn quiet_mode_omits_best_practices_section() {
        let score = sample_score();
        let verbose = format_table(&score, false, false);
        let quiet = format_table(&score, true, false);
        assert!(quiet.len() <= verbose.len());
    }
}
