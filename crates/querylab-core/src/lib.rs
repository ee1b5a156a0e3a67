//! Core contracts shared by the querylab crates.
//!
//! Defines the error taxonomy, the dynamic cell value, tabular query
//! results and the validated dataset schema consumed by the generator.

pub mod dataset;
pub mod error;
pub mod table;
pub mod value;

pub use dataset::{
    Dataset, DatasetSchema, FieldSpec, Kind, MAX_RECORD_COUNT, Record, is_identifier,
};
pub use error::{Error, ErrorKind, Result};
pub use table::QueryResult;
pub use value::Value;

/// File name of the synthesized CSV inside an output directory.
pub const DATASET_CSV_FILE: &str = "generated_data.csv";

/// File name of the SQLite store inside an output directory.
pub const DATASET_DB_FILE: &str = "generated_data.db";
