use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::value::Value;

static NULL: Value = Value::Null;

/// Upper bound on the number of records a schema may request.
pub const MAX_RECORD_COUNT: u64 = 10_000_000;

/// Closed set of field kinds with their value domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Integer drawn from the inclusive range `[min, max]`.
    Integer { min: i64, max: i64 },
    /// String drawn from a non-empty ordered candidate list.
    Text { candidates: Vec<String> },
    /// Boolean drawn from `{true, false}`.
    Boolean,
}

impl Kind {
    /// Label used by configuration documents (`int`, `str`, `bool`).
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Integer { .. } => "int",
            Kind::Text { .. } => "str",
            Kind::Boolean => "bool",
        }
    }

    /// SQLite column type used when the field is materialized.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Kind::Integer { .. } | Kind::Boolean => "INTEGER",
            Kind::Text { .. } => "TEXT",
        }
    }

    /// True when the value has the variant this kind produces.
    pub fn accepts_type(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Kind::Integer { .. }, Value::Integer(_))
                | (Kind::Text { .. }, Value::Text(_))
                | (Kind::Boolean, Value::Boolean(_))
        )
    }

    /// True when the value lies inside the declared domain.
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Kind::Integer { min, max }, Value::Integer(v)) => min <= v && v <= max,
            (Kind::Text { candidates }, Value::Text(v)) => candidates.contains(v),
            (Kind::Boolean, Value::Boolean(_)) => true,
            _ => false,
        }
    }
}

/// One declared column of the synthetic dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: Kind,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Validated, immutable description of a dataset to synthesize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSchema {
    fields: Vec<FieldSpec>,
    record_count: u64,
    seed: Option<u64>,
    table_name: String,
}

impl DatasetSchema {
    /// Build a schema, enforcing the invariants the synthesizer relies on.
    pub fn new(
        fields: Vec<FieldSpec>,
        record_count: u64,
        seed: Option<u64>,
        table_name: impl Into<String>,
    ) -> Result<Self> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(Error::Validation(format!(
                "table name '{table_name}' is not a valid identifier"
            )));
        }
        if record_count == 0 || record_count > MAX_RECORD_COUNT {
            return Err(Error::Validation(format!(
                "record count {record_count} is outside 1..={MAX_RECORD_COUNT}"
            )));
        }
        if fields.is_empty() {
            return Err(Error::Validation("schema declares no fields".to_string()));
        }

        let mut seen = BTreeSet::new();
        for field in &fields {
            if !is_identifier(&field.name) {
                return Err(Error::Validation(format!(
                    "field name '{}' is not a valid identifier",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            match &field.kind {
                Kind::Integer { min, max } if min > max => {
                    return Err(Error::Validation(format!(
                        "field '{}' has min {min} greater than max {max}",
                        field.name
                    )));
                }
                Kind::Text { candidates } if candidates.is_empty() => {
                    return Err(Error::Validation(format!(
                        "field '{}' has no candidate values",
                        field.name
                    )));
                }
                _ => {}
            }
        }

        Ok(Self {
            fields,
            record_count,
            seed,
            table_name,
        })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.name.clone()).collect()
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// One synthesized record keyed by field name.
pub type Record = BTreeMap<String, Value>;

/// Ordered records of one generation run with their column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of each record laid out in column order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        self.records.iter().map(move |record| {
            self.columns
                .iter()
                .map(|column| record.get(column).unwrap_or(&NULL))
                .collect()
        })
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
