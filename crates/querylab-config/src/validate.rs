use std::collections::BTreeSet;

use jsonschema::JSONSchema;
use querylab_core::{
    DatasetSchema, Error, FieldSpec, Kind, MAX_RECORD_COUNT, Result, is_identifier,
};
use serde_json::{Map, Value};

use crate::errors::{ValidationIssue, ValidationReport};
use crate::model::QuestionCatalog;
use crate::schema::catalog_json_schema;

/// Validated dataset schema with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub schema: DatasetSchema,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a parsed configuration document and build its dataset schema.
///
/// Checks run in a fixed order (generation section, field list, field
/// entries, domains) and the first violation is returned as a
/// configuration error.
pub fn validate_config(document: &Value) -> Result<ValidatedConfig> {
    let root = document.as_object().ok_or_else(|| {
        ValidationIssue::error(
            "document_not_mapping",
            "/",
            "configuration document must be a mapping",
            None,
        )
        .into_error()
    })?;

    let mut warnings = Vec::new();
    let (record_count, seed, table_name) = check_generation(root)?;
    let entries = check_field_list(root)?;

    let mut names = BTreeSet::new();
    let mut fields = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let field = check_field(entry, &format!("/fields/{idx}"), &mut warnings)?;
        if !names.insert(field.name.clone()) {
            return Err(ValidationIssue::error(
                "duplicate_field",
                format!("/fields/{idx}/name"),
                format!("duplicate field name '{}'", field.name),
                Some("field names become column names and must be unique"),
            )
            .into_error());
        }
        fields.push(field);
    }

    let schema = DatasetSchema::new(fields, record_count, seed, table_name)
        .map_err(|err| Error::Configuration(err.to_string()))?;

    Ok(ValidatedConfig { schema, warnings })
}

fn check_generation(root: &Map<String, Value>) -> Result<(u64, Option<u64>, String)> {
    let section = root
        .get("data_generation")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ValidationIssue::error(
                "missing_data_generation",
                "/data_generation",
                "a data_generation mapping is required",
                Some("add num_records and table_name under data_generation"),
            )
            .into_error()
        })?;

    let (key, count) = match (section.get("num_records"), section.get("record_count")) {
        (Some(value), _) => ("num_records", value),
        (None, Some(value)) => ("record_count", value),
        (None, None) => {
            return Err(ValidationIssue::error(
                "missing_record_count",
                "/data_generation/num_records",
                "num_records is required",
                None,
            )
            .into_error());
        }
    };
    let record_count = count
        .as_u64()
        .filter(|value| (1..=MAX_RECORD_COUNT).contains(value))
        .ok_or_else(|| {
            ValidationIssue::error(
                "invalid_record_count",
                format!("/data_generation/{key}"),
                format!("{key} must be an integer in 1..={MAX_RECORD_COUNT}, got {count}"),
                None,
            )
            .into_error()
        })?;

    let seed = match section.get("seed") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.as_u64().ok_or_else(|| {
            ValidationIssue::error(
                "invalid_seed",
                "/data_generation/seed",
                format!("seed must be a non-negative integer, got {value}"),
                None,
            )
            .into_error()
        })?),
    };

    let table_name = section
        .get("table_name")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ValidationIssue::error(
                "missing_table_name",
                "/data_generation/table_name",
                "table_name must be a string",
                None,
            )
            .into_error()
        })?;
    if !is_identifier(table_name) {
        return Err(ValidationIssue::error(
            "invalid_table_name",
            "/data_generation/table_name",
            format!("table_name '{table_name}' is not an identifier"),
            Some("use letters, digits and underscores, not starting with a digit"),
        )
        .into_error());
    }

    Ok((record_count, seed, table_name.to_string()))
}

fn check_field_list(root: &Map<String, Value>) -> Result<&Vec<Value>> {
    match root.get("fields").and_then(Value::as_array) {
        Some(entries) if !entries.is_empty() => Ok(entries),
        Some(_) => Err(ValidationIssue::error(
            "fields_empty",
            "/fields",
            "at least one field is required",
            None,
        )
        .into_error()),
        None => Err(ValidationIssue::error(
            "missing_fields",
            "/fields",
            "a fields list is required",
            None,
        )
        .into_error()),
    }
}

fn check_field(
    entry: &Value,
    path: &str,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<FieldSpec> {
    let entry = entry.as_object().ok_or_else(|| {
        ValidationIssue::error("field_not_mapping", path, "field entry must be a mapping", None)
            .into_error()
    })?;

    let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
        ValidationIssue::error(
            "missing_field_name",
            format!("{path}/name"),
            "field name must be a string",
            None,
        )
        .into_error()
    })?;
    if !is_identifier(name) {
        return Err(ValidationIssue::error(
            "invalid_field_name",
            format!("{path}/name"),
            format!("field name '{name}' is not an identifier"),
            Some("use letters, digits and underscores, not starting with a digit"),
        )
        .into_error());
    }

    let (kind_key, kind) = match (entry.get("type"), entry.get("kind")) {
        (Some(value), _) => ("type", value),
        (None, Some(value)) => ("kind", value),
        (None, None) => {
            return Err(ValidationIssue::error(
                "missing_field_type",
                format!("{path}/type"),
                format!("field '{name}' has no type"),
                None,
            )
            .into_error());
        }
    };
    let Some(kind) = kind.as_str() else {
        return Err(ValidationIssue::error(
            "unknown_field_type",
            format!("{path}/{kind_key}"),
            format!("field '{name}' has type {kind}, expected one of int, str, bool"),
            None,
        )
        .into_error());
    };

    let (values_key, values) = match (entry.get("values"), entry.get("domain")) {
        (Some(value), _) => ("values", value),
        (None, Some(value)) => ("domain", value),
        (None, None) => {
            return Err(ValidationIssue::error(
                "missing_field_values",
                format!("{path}/values"),
                format!("field '{name}' has no values"),
                None,
            )
            .into_error());
        }
    };
    let values_path = format!("{path}/{values_key}");

    let kind = match kind {
        "int" => check_int_domain(name, values, &values_path)?,
        "str" => check_str_domain(name, values, &values_path, warnings)?,
        "bool" => check_bool_domain(name, values, &values_path, warnings)?,
        other => {
            return Err(ValidationIssue::error(
                "unknown_field_type",
                format!("{path}/{kind_key}"),
                format!("field '{name}' has type '{other}', expected one of int, str, bool"),
                None,
            )
            .into_error());
        }
    };

    Ok(FieldSpec::new(name, kind))
}

fn check_int_domain(name: &str, values: &Value, path: &str) -> Result<Kind> {
    let bound = |key: &str| {
        values.get(key).and_then(Value::as_i64).ok_or_else(|| {
            ValidationIssue::error(
                "invalid_int_bound",
                format!("{path}/{key}"),
                format!("int field '{name}' needs an integer {key}"),
                Some("declare values as a mapping with integer min and max"),
            )
            .into_error()
        })
    };
    let min = bound("min")?;
    let max = bound("max")?;
    if min > max {
        return Err(ValidationIssue::error(
            "inverted_int_range",
            path,
            format!("int field '{name}' has min {min} greater than max {max}"),
            None,
        )
        .into_error());
    }
    Ok(Kind::Integer { min, max })
}

fn check_str_domain(
    name: &str,
    values: &Value,
    path: &str,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<Kind> {
    let items = non_empty_list(name, "str", values, path)?;
    let mut candidates = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let text = item.as_str().ok_or_else(|| {
            ValidationIssue::error(
                "invalid_str_value",
                format!("{path}/{idx}"),
                format!("str field '{name}' lists non-string value {item}"),
                None,
            )
            .into_error()
        })?;
        candidates.push(text.to_string());
    }

    let distinct: BTreeSet<&String> = candidates.iter().collect();
    if distinct.len() != candidates.len() {
        warnings.push(ValidationIssue::warning(
            "duplicate_candidates",
            path,
            format!("str field '{name}' repeats candidate values"),
            Some("repeated candidates are drawn proportionally more often"),
        ));
    }

    Ok(Kind::Text { candidates })
}

fn check_bool_domain(
    name: &str,
    values: &Value,
    path: &str,
    warnings: &mut Vec<ValidationIssue>,
) -> Result<Kind> {
    let items = non_empty_list(name, "bool", values, path)?;
    let mut flags = BTreeSet::new();
    for (idx, item) in items.iter().enumerate() {
        let flag = item.as_bool().ok_or_else(|| {
            ValidationIssue::error(
                "invalid_bool_value",
                format!("{path}/{idx}"),
                format!("bool field '{name}' lists non-boolean value {item}"),
                None,
            )
            .into_error()
        })?;
        flags.insert(flag);
    }

    if flags.len() != 2 {
        warnings.push(ValidationIssue::warning(
            "partial_bool_domain",
            path,
            format!("bool field '{name}' does not list both true and false"),
            Some("bool fields always draw from {true, false}"),
        ));
    }

    Ok(Kind::Boolean)
}

fn non_empty_list<'a>(
    name: &str,
    label: &str,
    values: &'a Value,
    path: &str,
) -> Result<&'a Vec<Value>> {
    match values.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ValidationIssue::error(
            "invalid_candidate_list",
            path,
            format!("{label} field '{name}' needs a non-empty list of values"),
            None,
        )
        .into_error()),
    }
}

/// Validate a question catalog document against the catalog JSON Schema.
pub fn validate_catalog_json(document: &Value, catalog_schema: &Value) -> Result<ValidationReport> {
    let compiled = JSONSchema::compile(catalog_schema)
        .map_err(|err| Error::Configuration(format!("invalid catalog schema: {err}")))?;

    let mut report = ValidationReport::default();
    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::error(
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate and parse a question catalog document.
pub fn validate_catalog(document: &Value) -> Result<QuestionCatalog> {
    let schema = serde_json::to_value(catalog_json_schema())
        .map_err(|err| Error::Configuration(format!("invalid catalog schema: {err}")))?;

    let report = validate_catalog_json(document, &schema)?;
    if !report.is_ok() {
        return Err(report.into_error("question catalog"));
    }

    let catalog: QuestionCatalog = serde_json::from_value(document.clone())
        .map_err(|err| Error::Configuration(format!("invalid question catalog: {err}")))?;

    let mut seen = BTreeSet::new();
    for (idx, question) in catalog.questions.iter().enumerate() {
        if !seen.insert(question.name.as_str()) {
            return Err(ValidationIssue::error(
                "duplicate_question",
                format!("/questions/{idx}/name"),
                format!("duplicate question name '{}'", question.name),
                None,
            )
            .into_error());
        }
    }

    Ok(catalog)
}

fn normalized_json_pointer(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}
