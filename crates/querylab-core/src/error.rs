use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::Path;

use thiserror::Error;

/// Error type shared across querylab crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration document fails structural or type validation.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A runtime value is invalid (record counts, seed records, results).
    #[error("validation error: {0}")]
    Validation(String),
    /// Result column sequences differ; carries their symmetric difference.
    #[error(
        "validation error: result columns differ (expected [{}], actual [{}], mismatched {{{}}})",
        .expected.join(", "),
        .actual.join(", "),
        .difference.iter().cloned().collect::<Vec<_>>().join(", ")
    )]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
        difference: BTreeSet<String>,
    },
    /// A submitted query was rejected by the safety gate.
    #[error("security error: {0}")]
    Security(String),
    /// Backing store connection or execution failure.
    #[error("database error: {0}")]
    Database(String),
    /// File read/write failure.
    #[error("file io error: {0}")]
    FileIo(String),
}

/// Coarse error category, one per failure class callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Security,
    Database,
    FileIo,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Validation(_) | Error::ColumnMismatch { .. } => ErrorKind::Validation,
            Error::Security(_) => ErrorKind::Security,
            Error::Database(_) => ErrorKind::Database,
            Error::FileIo(_) => ErrorKind::FileIo,
        }
    }

    /// Wrap a store failure with the context it happened in.
    pub fn database(context: impl Display, err: impl Display) -> Self {
        Error::Database(format!("{context}: {err}"))
    }

    /// Wrap a file failure with the offending path.
    pub fn file_io(path: &Path, err: impl Display) -> Self {
        Error::FileIo(format!("'{}': {err}", path.display()))
    }
}

/// Convenience alias for results returned by querylab crates.
pub type Result<T> = std::result::Result<T, Error>;
