//! Configuration documents for querylab: loading, validation and the
//! question catalog.

pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, ValidationIssue, ValidationReport};
pub use load::{ConfigOverrides, apply_overrides, load_document};
pub use model::{
    ConfigDocument, DataGeneration, Difficulty, FieldEntry, FieldType, FieldValues, Question,
    QuestionCatalog,
};
pub use schema::{catalog_json_schema, config_json_schema};
pub use validate::{
    ValidatedConfig, validate_catalog, validate_catalog_json, validate_config,
};
