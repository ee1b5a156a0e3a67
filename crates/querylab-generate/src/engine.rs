use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use querylab_core::{
    DATASET_CSV_FILE, DATASET_DB_FILE, Dataset, DatasetSchema, Error, Record, Result,
};

use crate::model::{GenerateOptions, GenerationReport};
use crate::output::{CsvSummary, SqliteMaterializer, write_dataset_csv};
use crate::synth::Synthesizer;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub dataset: Dataset,
    pub report: GenerationReport,
}

struct Artifacts {
    dataset: Dataset,
    csv_path: PathBuf,
    csv: CsvSummary,
    db: Option<(PathBuf, u64)>,
}

/// Entry point for synthesizing and materializing a dataset.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Synthesize the dataset, write the CSV file and replace the table.
    pub async fn run(
        &self,
        schema: &DatasetSchema,
        seed_records: Vec<Record>,
    ) -> Result<GenerationResult> {
        let start = Instant::now();
        let out_dir = &self.options.out_dir;
        std::fs::create_dir_all(out_dir).map_err(|err| Error::file_io(out_dir, err))?;

        let mut synthesizer = Synthesizer::for_schema(schema);
        let seed_count = seed_records.len() as u64;
        info!(
            table = %schema.table_name(),
            rows = schema.record_count(),
            seed = synthesizer.seed(),
            seed_configured = schema.seed().is_some(),
            seed_records = seed_count,
            "generation started"
        );

        let outcome = self
            .materialize(schema, &mut synthesizer, seed_records, out_dir)
            .await;
        let Artifacts {
            dataset,
            csv_path,
            csv,
            db,
        } = match outcome {
            Ok(parts) => parts,
            Err(err) => {
                warn!(table = %schema.table_name(), error = %err, "generation failed");
                return Err(err);
            }
        };

        let report = GenerationReport {
            table: schema.table_name().to_string(),
            fields: schema.field_names(),
            rows_requested: schema.record_count(),
            rows_generated: dataset.len() as u64,
            seed_records: seed_count,
            seed: synthesizer.seed(),
            seed_configured: schema.seed().is_some(),
            csv_path,
            csv_bytes: csv.bytes_written,
            csv_sha256: csv.sha256,
            db_path: db.as_ref().map(|(path, _)| path.clone()),
            rows_materialized: db.map(|(_, rows)| rows),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            table = %report.table,
            rows_generated = report.rows_generated,
            bytes_written = report.csv_bytes,
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult { dataset, report })
    }

    async fn materialize(
        &self,
        schema: &DatasetSchema,
        synthesizer: &mut Synthesizer,
        seed_records: Vec<Record>,
        out_dir: &Path,
    ) -> Result<Artifacts> {
        let dataset = synthesizer.synthesize(schema, seed_records)?;

        let csv_path = out_dir.join(DATASET_CSV_FILE);
        let csv = write_dataset_csv(&csv_path, &dataset)?;

        let db = if self.options.csv_only {
            None
        } else {
            let db_path = out_dir.join(DATASET_DB_FILE);
            let rows = SqliteMaterializer::new(&db_path)
                .replace_dataset(schema, &dataset)
                .await?;
            Some((db_path, rows))
        };

        Ok(Artifacts {
            dataset,
            csv_path,
            csv,
            db,
        })
    }
}
