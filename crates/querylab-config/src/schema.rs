use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::{ConfigDocument, QuestionCatalog};

/// Emit the JSON Schema for dataset configuration documents.
pub fn config_json_schema() -> RootSchema {
    schema_for!(ConfigDocument)
}

/// Emit the JSON Schema for question catalogs.
pub fn catalog_json_schema() -> RootSchema {
    schema_for!(QuestionCatalog)
}
