use std::collections::BTreeSet;

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use querylab_core::{Dataset, DatasetSchema, Error, FieldSpec, Kind, Record, Result, Value};

/// Seeded record synthesizer.
///
/// The generator state is owned by the synthesizer, so two synthesizers
/// built from the same seed produce the same sequence of records.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    seed: u64,
    rng: ChaCha8Rng,
}

impl Synthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed from the schema, or draw one from OS entropy when it has none.
    pub fn for_schema(schema: &DatasetSchema) -> Self {
        let seed = schema.seed().unwrap_or_else(|| rand::rng().random());
        Self::new(seed)
    }

    /// Seed the generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw one value uniformly from the kind's domain.
    pub fn draw(&mut self, kind: &Kind) -> Value {
        match kind {
            Kind::Integer { min, max } => Value::Integer(self.rng.random_range(*min..=*max)),
            Kind::Text { candidates } => candidates
                .choose(&mut self.rng)
                .cloned()
                .map_or(Value::Null, Value::Text),
            Kind::Boolean => Value::Boolean(self.rng.random_bool(0.5)),
        }
    }

    /// Draw one record, visiting fields in schema order.
    pub fn record(&mut self, fields: &[FieldSpec]) -> Record {
        fields
            .iter()
            .map(|field| (field.name.clone(), self.draw(&field.kind)))
            .collect()
    }

    /// Produce exactly `record_count` records, seed records first.
    pub fn synthesize(&mut self, schema: &DatasetSchema, seed_records: Vec<Record>) -> Result<Dataset> {
        check_seed_records(schema, &seed_records)?;

        let total = usize::try_from(schema.record_count()).map_err(|_| {
            Error::Validation(format!(
                "record count {} does not fit in memory on this platform",
                schema.record_count()
            ))
        })?;
        let provided = seed_records.len();

        let mut records = seed_records;
        records.reserve(total - provided);
        for _ in provided..total {
            records.push(self.record(schema.fields()));
        }

        debug!(
            table = %schema.table_name(),
            seed = self.seed,
            seed_records = provided,
            rows = records.len(),
            "records synthesized"
        );

        Ok(Dataset::new(schema.field_names(), records))
    }
}

/// Check that pre-supplied records fit the schema and its record count.
pub fn check_seed_records(schema: &DatasetSchema, seed_records: &[Record]) -> Result<()> {
    if seed_records.len() as u64 > schema.record_count() {
        return Err(Error::Validation(format!(
            "{} seed record(s) exceed the record count {}",
            seed_records.len(),
            schema.record_count()
        )));
    }

    let expected: BTreeSet<&str> = schema
        .fields()
        .iter()
        .map(|field| field.name.as_str())
        .collect();

    for (index, record) in seed_records.iter().enumerate() {
        let actual: BTreeSet<&str> = record.keys().map(String::as_str).collect();
        if actual != expected {
            let missing: Vec<&str> = expected.difference(&actual).copied().collect();
            let unknown: Vec<&str> = actual.difference(&expected).copied().collect();
            return Err(Error::Validation(format!(
                "seed record {index} does not match the schema fields (missing [{}], unknown [{}])",
                missing.join(", "),
                unknown.join(", ")
            )));
        }
        for field in schema.fields() {
            let Some(value) = record.get(&field.name) else {
                continue;
            };
            if !field.kind.accepts_type(value) {
                return Err(Error::Validation(format!(
                    "seed record {index} field '{}' expects {} but holds {} {value}",
                    field.name,
                    field.kind.label(),
                    value.type_name()
                )));
            }
        }
    }

    Ok(())
}
