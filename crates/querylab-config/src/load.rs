use std::fs;
use std::path::Path;

use querylab_core::{Error, Result};
use serde_json::{Map, Value};

/// Read a configuration document from a `.toml` or `.json` file.
pub fn load_document(path: &Path) -> Result<Value> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let raw = fs::read_to_string(path).map_err(|err| Error::file_io(path, err))?;

    match extension.as_deref() {
        Some("json") => serde_json::from_str(&raw).map_err(|err| {
            Error::Configuration(format!("failed to parse {}: {err}", path.display()))
        }),
        Some("toml") => {
            let parsed: toml::Value = toml::from_str(&raw).map_err(|err| {
                Error::Configuration(format!("failed to parse {}: {err}", path.display()))
            })?;
            serde_json::to_value(parsed).map_err(|err| {
                Error::Configuration(format!("failed to convert {}: {err}", path.display()))
            })
        }
        _ => Err(Error::Configuration(format!(
            "unsupported configuration format for {} (expected .toml or .json)",
            path.display()
        ))),
    }
}

/// Command-line overrides applied to a parsed document before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub num_records: Option<u64>,
    pub seed: Option<u64>,
    pub table_name: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.num_records.is_none() && self.seed.is_none() && self.table_name.is_none()
    }
}

/// Write overrides into `data_generation`, creating the section if needed.
///
/// A non-mapping document or section is left untouched so the validator
/// reports it.
pub fn apply_overrides(document: &mut Value, overrides: &ConfigOverrides) {
    if overrides.is_empty() {
        return;
    }
    let Some(root) = document.as_object_mut() else {
        return;
    };
    let section = root
        .entry("data_generation")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(section) = section.as_object_mut() else {
        return;
    };

    if let Some(count) = overrides.num_records {
        section.remove("record_count");
        section.insert("num_records".to_string(), Value::from(count));
    }
    if let Some(seed) = overrides.seed {
        section.insert("seed".to_string(), Value::from(seed));
    }
    if let Some(table) = &overrides.table_name {
        section.insert("table_name".to_string(), Value::from(table.as_str()));
    }
}
