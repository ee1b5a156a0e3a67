use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use querylab_core::{Error, QueryResult, Result, Value};

/// One differing cell of a mismatched row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDiff {
    pub column: String,
    pub expected: Value,
    pub actual: Value,
}

/// A mismatched row (index into the sorted rows) and its differing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowDiff {
    pub index: usize,
    pub cells: Vec<CellDiff>,
}

/// Result of comparing an actual query result with the expected one.
///
/// Column mismatches never produce an outcome; they surface as
/// `Error::ColumnMismatch` instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub is_match: bool,
    /// `(expected, actual)` row counts when they differ.
    pub row_count_mismatch: Option<(usize, usize)>,
    pub mismatched_row_indices: Vec<usize>,
    pub row_diffs: Vec<RowDiff>,
}

/// Compare two results, ignoring row order.
///
/// Column sequences must be identical. Rows are sorted on every column
/// before a row-by-row comparison with strict value equality.
pub fn compare(actual: &QueryResult, expected: &QueryResult) -> Result<ComparisonOutcome> {
    if actual.columns() != expected.columns() {
        let expected_set: BTreeSet<&String> = expected.columns().iter().collect();
        let actual_set: BTreeSet<&String> = actual.columns().iter().collect();
        let difference = expected_set
            .symmetric_difference(&actual_set)
            .map(|name| (*name).clone())
            .collect();
        return Err(Error::ColumnMismatch {
            expected: expected.columns().to_vec(),
            actual: actual.columns().to_vec(),
            difference,
        });
    }

    if actual.row_count() != expected.row_count() {
        debug!(
            expected = expected.row_count(),
            actual = actual.row_count(),
            "row count mismatch"
        );
        return Ok(ComparisonOutcome {
            is_match: false,
            row_count_mismatch: Some((expected.row_count(), actual.row_count())),
            mismatched_row_indices: Vec::new(),
            row_diffs: Vec::new(),
        });
    }

    let expected_rows = expected.sorted_rows();
    let actual_rows = actual.sorted_rows();

    let row_diffs: Vec<RowDiff> = expected_rows
        .iter()
        .zip(&actual_rows)
        .enumerate()
        .filter_map(|(index, (expected_row, actual_row))| {
            let cells: Vec<CellDiff> = expected
                .columns()
                .iter()
                .zip(expected_row.iter().zip(actual_row))
                .filter(|(_, (left, right))| left != right)
                .map(|(column, (left, right))| CellDiff {
                    column: column.clone(),
                    expected: left.clone(),
                    actual: right.clone(),
                })
                .collect();
            (!cells.is_empty()).then_some(RowDiff { index, cells })
        })
        .collect();

    let mismatched_row_indices: Vec<usize> = row_diffs.iter().map(|diff| diff.index).collect();
    Ok(ComparisonOutcome {
        is_match: mismatched_row_indices.is_empty(),
        row_count_mismatch: None,
        mismatched_row_indices,
        row_diffs,
    })
}
