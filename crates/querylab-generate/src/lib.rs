//! Synthetic data generation for querylab.
//!
//! Draws seeded records from a validated `DatasetSchema`, writes them to a
//! CSV file and replaces the matching table in a SQLite store. Also builds
//! the related multi-table practice schema.

pub mod engine;
pub mod model;
pub mod output;
pub mod practice;
pub mod synth;

pub use engine::{GenerationEngine, GenerationResult};
pub use model::{GenerateOptions, GenerationReport};
pub use output::{CsvSummary, SqliteMaterializer, TableDefinition, TableLoad, write_dataset_csv};
pub use practice::{PracticeData, PracticeSchema, PracticeSummary};
pub use synth::{Synthesizer, check_seed_records};
