use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory receiving the CSV file and the SQLite store.
    pub out_dir: PathBuf,
    /// Skip the SQLite store and only write the CSV file.
    pub csv_only: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("output"),
            csv_only: false,
        }
    }
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub table: String,
    pub fields: Vec<String>,
    pub rows_requested: u64,
    pub rows_generated: u64,
    pub seed_records: u64,
    /// Seed actually used, drawn from OS entropy when none was configured.
    pub seed: u64,
    pub seed_configured: bool,
    pub csv_path: PathBuf,
    pub csv_bytes: u64,
    pub csv_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_materialized: Option<u64>,
    pub duration_ms: u64,
}
