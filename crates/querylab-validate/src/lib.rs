//! Answer validation for querylab.
//!
//! Submitted queries pass a lexical safety gate, run read-only against the
//! SQLite store, and are compared order-insensitively with a stored
//! expected result.

pub mod compare;
pub mod executor;
pub mod expected;
pub mod gate;
pub mod question;
pub mod report;
pub mod validator;

pub use compare::{CellDiff, ComparisonOutcome, RowDiff, compare};
pub use executor::{QueryExecutor, SqliteStore, Store};
pub use expected::{
    CellType, ColumnLayout, ExpectedLayout, expected_layout_path, read_expected, write_expected,
};
pub use gate::{FORBIDDEN_KEYWORDS, check_query};
pub use question::{EXPECTED_CSV_FILE, QuestionPaths, SOLUTION_SQL_FILE, load_sql};
pub use report::render_report;
pub use validator::{AnswerValidator, Verdict};
