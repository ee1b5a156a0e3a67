use querylab_core::Value;

use crate::compare::RowDiff;
use crate::validator::Verdict;

/// Render a deterministic markdown report for an answer check.
pub fn render_report(verdict: &Verdict, max_examples: usize) -> String {
    let outcome = &verdict.outcome;
    let mut lines = Vec::new();

    lines.push("# Querylab Answer Report".to_string());
    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(format!("- question: {}", verdict.question));
    lines.push(format!(
        "- result: {}",
        if outcome.is_match { "MATCH" } else { "MISMATCH" }
    ));
    lines.push(format!("- columns: {}", verdict.expected.columns().join(", ")));
    lines.push(String::new());

    lines.push("## Row counts".to_string());
    lines.push("| expected | actual |".to_string());
    lines.push("| --- | --- |".to_string());
    lines.push(format!(
        "| {} | {} |",
        verdict.expected.row_count(),
        verdict.actual.row_count()
    ));
    lines.push(String::new());

    if !outcome.row_diffs.is_empty() {
        lines.push("## Mismatched rows".to_string());
        lines.push(format!(
            "{} of {} sorted row(s) differ.",
            outcome.row_diffs.len(),
            verdict.expected.row_count()
        ));
        lines.push(String::new());
        lines.push("| row | column | expected | actual |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for diff in outcome.row_diffs.iter().take(max_examples) {
            push_row_diff(&mut lines, diff);
        }
        if outcome.row_diffs.len() > max_examples {
            lines.push(String::new());
            lines.push(format!(
                "_{} more mismatched row(s) omitted._",
                outcome.row_diffs.len() - max_examples
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Next steps".to_string());
    lines.extend(next_steps(verdict));
    lines.join("\n")
}

fn push_row_diff(lines: &mut Vec<String>, diff: &RowDiff) {
    for cell in &diff.cells {
        lines.push(format!(
            "| {} | {} | {} | {} |",
            diff.index,
            cell.column,
            describe(&cell.expected),
            describe(&cell.actual)
        ));
    }
}

fn describe(value: &Value) -> String {
    let text = value.to_string().replace('|', "\\|");
    format!("{text} ({})", value.type_name())
}

fn next_steps(verdict: &Verdict) -> Vec<String> {
    let outcome = &verdict.outcome;
    let mut lines = Vec::new();
    if let Some((expected, actual)) = outcome.row_count_mismatch {
        if actual > expected {
            lines.push("- the answer returns extra rows; tighten the filter or joins.".to_string());
        } else {
            lines.push("- the answer misses rows; relax the filter or use an outer join.".to_string());
        }
    }
    if !outcome.row_diffs.is_empty() {
        let type_only = outcome.row_diffs.iter().all(|diff| {
            diff.cells
                .iter()
                .all(|cell| cell.expected.to_csv() == cell.actual.to_csv())
        });
        if type_only {
            lines.push("- values look equal but types differ; check casts.".to_string());
        } else {
            lines.push("- compare the listed cells; row order is ignored.".to_string());
        }
    }
    if outcome.is_match {
        lines.push("- answer matches the expected result.".to_string());
    }
    lines
}
