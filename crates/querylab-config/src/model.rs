use querylab_core::{DatasetSchema, Kind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Dataset configuration document (`data_generation` + `fields`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigDocument {
    /// Generation parameters.
    pub data_generation: DataGeneration,
    /// Declared columns, in output order.
    #[schemars(length(min = 1))]
    pub fields: Vec<FieldEntry>,
}

/// Generation parameters of a configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DataGeneration {
    /// Number of records to synthesize.
    #[serde(alias = "record_count")]
    #[schemars(range(min = 1, max = 10000000))]
    pub num_records: u64,
    /// Seed for reproducible generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Table the dataset is materialized into.
    pub table_name: String,
}

/// One field entry of a configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type", alias = "kind")]
    pub field_type: FieldType,
    #[serde(alias = "domain")]
    pub values: FieldValues,
}

/// Field type labels accepted by configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int,
    Str,
    Bool,
}

/// Value domain of a field; the shape depends on the field type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValues {
    Range { min: i64, max: i64 },
    Texts(Vec<String>),
    Flags(Vec<bool>),
}

impl From<&DatasetSchema> for ConfigDocument {
    fn from(schema: &DatasetSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|field| {
                let (field_type, values) = match &field.kind {
                    Kind::Integer { min, max } => (
                        FieldType::Int,
                        FieldValues::Range {
                            min: *min,
                            max: *max,
                        },
                    ),
                    Kind::Text { candidates } => {
                        (FieldType::Str, FieldValues::Texts(candidates.clone()))
                    }
                    Kind::Boolean => (FieldType::Bool, FieldValues::Flags(vec![true, false])),
                };
                FieldEntry {
                    name: field.name.clone(),
                    field_type,
                    values,
                }
            })
            .collect();

        Self {
            data_generation: DataGeneration {
                num_records: schema.record_count(),
                seed: schema.seed(),
                table_name: schema.table_name().to_string(),
            },
            fields,
        }
    }
}

/// Difficulty tier a question is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// Catalog entry describing one practice question.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    /// Directory name of the question.
    pub name: String,
    pub difficulty: Difficulty,
    #[schemars(range(min = 1))]
    pub time_limit_seconds: u32,
    pub hints_available: u32,
    pub tags: Vec<String>,
    pub active: bool,
    pub description: String,
    pub prerequisite_questions: Vec<String>,
    pub sql_features: Vec<String>,
    pub learning_objectives: Vec<String>,
}

/// Question catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionCatalog {
    #[schemars(length(min = 1))]
    pub questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Active questions in document order.
    pub fn active(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|question| question.active)
    }

    pub fn find(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.name == name)
    }
}
