use std::fs;
use std::path::{Path, PathBuf};

use querylab_core::{Error, Result};

use crate::expected::expected_layout_path;

/// Reference query file inside a question directory.
pub const SOLUTION_SQL_FILE: &str = "example_solution.sql";

/// Expected-result artifact relative to a question directory.
pub const EXPECTED_CSV_FILE: &str = "solutions/solution_df.csv";

/// File layout of one practice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPaths {
    dir: PathBuf,
}

impl QuestionPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory name, used as the question's identifier.
    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dir.display().to_string())
    }

    pub fn solution_sql(&self) -> PathBuf {
        self.dir.join(SOLUTION_SQL_FILE)
    }

    pub fn expected_csv(&self) -> PathBuf {
        self.dir.join(EXPECTED_CSV_FILE)
    }

    /// Cell-type sidecar of the expected CSV.
    pub fn expected_layout(&self) -> PathBuf {
        expected_layout_path(&self.expected_csv())
    }
}

/// Read a query from a `.sql` file.
pub fn load_sql(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::file_io(path, err))
}
