use serde::Serialize;
use tracing::{info, warn};

use querylab_core::{QueryResult, Result};

use crate::compare::{ComparisonOutcome, compare};
use crate::executor::{QueryExecutor, Store};
use crate::expected::{read_expected, write_expected};
use crate::question::{QuestionPaths, load_sql};

/// Actual and expected results of one answer check with their comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub question: String,
    pub actual: QueryResult,
    pub expected: QueryResult,
    pub outcome: ComparisonOutcome,
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        self.outcome.is_match
    }
}

/// Checks submitted answers against a question's expected result.
#[derive(Debug, Clone)]
pub struct AnswerValidator<S> {
    executor: QueryExecutor<S>,
}

impl<S: Store> AnswerValidator<S> {
    pub fn new(store: S) -> Self {
        Self {
            executor: QueryExecutor::new(store),
        }
    }

    pub fn executor(&self) -> &QueryExecutor<S> {
        &self.executor
    }

    /// Run the question's reference query and store its result as the
    /// expected artifact.
    pub async fn record_expected(&self, question: &QuestionPaths) -> Result<QueryResult> {
        let sql = load_sql(&question.solution_sql())?;
        let result = self.executor.execute(&sql).await?;
        let path = question.expected_csv();
        write_expected(&path, &result)?;
        info!(
            question = %question.name(),
            rows = result.row_count(),
            path = %path.display(),
            "expected result recorded"
        );
        Ok(result)
    }

    /// Run a submitted query and compare it with the expected artifact.
    pub async fn check(&self, question: &QuestionPaths, sql: &str) -> Result<Verdict> {
        let actual = self.executor.execute(sql).await?;
        let expected = read_expected(&question.expected_csv())?;
        let outcome = compare(&actual, &expected).inspect_err(|err| {
            warn!(question = %question.name(), error = %err, "answer columns differ");
        })?;

        info!(
            question = %question.name(),
            is_match = outcome.is_match,
            mismatched_rows = outcome.mismatched_row_indices.len(),
            "answer checked"
        );
        Ok(Verdict {
            question: question.name(),
            actual,
            expected,
            outcome,
        })
    }
}
