mod registry;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use querylab_config::{
    ConfigDocument, ConfigOverrides, Question, QuestionCatalog, apply_overrides, config_json_schema,
    load_document, validate_catalog, validate_config,
};
use querylab_core::{Error as CoreError, Record, Value};
use querylab_generate::{GenerateOptions, GenerationEngine, PracticeSchema};
use querylab_validate::{AnswerValidator, QuestionPaths, SqliteStore, load_sql, render_report};
use registry::{
    RunContext, RunPaths, init_console_logging, init_run_logging, start_run, write_json,
    write_text,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// SQLite store holding the multi-table practice schema.
const PRACTICE_DB: &str = "output/practice.db";

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("invalid seed data: {0}")]
    SeedData(String),
    #[error("answer for '{0}' does not match the expected result")]
    Mismatch(String),
}

#[derive(Parser, Debug)]
#[command(name = "querylab", version, about = "SQL practice dataset and answer tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synthesize a dataset from a configuration file.
    Generate(GenerateArgs),
    /// Build the related departments/employees/projects practice tables.
    PracticeSchema(PracticeArgs),
    /// Run a question's reference query and store its expected result.
    RecordSolution(RecordArgs),
    /// Check an answer query against a question's expected result.
    Check(CheckArgs),
    /// List questions from a catalog.
    Questions(QuestionsArgs),
    /// Print the configuration JSON Schema.
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Serialize)]
struct GenerateArgs {
    /// Configuration document (.json or .toml).
    #[arg(long)]
    config: PathBuf,
    /// Directory receiving the CSV file and the SQLite store.
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
    /// Override `num_records`.
    #[arg(long)]
    num_records: Option<u64>,
    /// Override `seed`.
    #[arg(long)]
    seed: Option<u64>,
    /// Override `table_name`.
    #[arg(long)]
    table: Option<String>,
    /// JSON array of records emitted before the synthesized ones.
    #[arg(long)]
    seed_data: Option<PathBuf>,
    /// Only write the CSV file.
    #[arg(long, default_value_t = false)]
    csv_only: bool,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
}

#[derive(Args, Debug)]
struct PracticeArgs {
    #[arg(long, default_value = PRACTICE_DB)]
    db: PathBuf,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 8)]
    departments: usize,
    #[arg(long, default_value_t = 50)]
    employees: usize,
    #[arg(long, default_value_t = 10)]
    projects: usize,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Question directory.
    #[arg(long)]
    question: PathBuf,
    #[arg(long, default_value = PRACTICE_DB)]
    db: PathBuf,
}

#[derive(Args, Debug, Serialize)]
struct CheckArgs {
    /// Question directory.
    #[arg(long)]
    question: PathBuf,
    /// Answer query file; defaults to the question's reference query.
    #[arg(long)]
    answer: Option<PathBuf>,
    #[arg(long, default_value = PRACTICE_DB)]
    db: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Mismatched rows listed in the report.
    #[arg(long, default_value_t = 20)]
    max_examples: usize,
}

#[derive(Args, Debug)]
struct QuestionsArgs {
    #[arg(long, default_value = "questions/catalog.json")]
    catalog: PathBuf,
    /// Include inactive questions.
    #[arg(long, default_value_t = false)]
    all: bool,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args).await,
        Command::PracticeSchema(args) => run_practice_schema(args).await,
        Command::RecordSolution(args) => run_record_solution(args).await,
        Command::Check(args) => run_check(args).await,
        Command::Questions(args) => run_questions(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn begin_run<T: Serialize>(
    command: &str,
    run_dir: &Path,
    options: &T,
) -> Result<RunPaths, CliError> {
    let run_id = Uuid::new_v4().to_string();
    let ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        run_dir: run_dir.to_path_buf(),
        options: serde_json::to_value(options).map_err(registry::RegistryError::from)?,
    };
    let paths = start_run(&ctx)?;
    init_run_logging(&paths.logs_path)?;
    tracing::info!(event = "run_started", run_id = %run_id, command = command);
    Ok(paths)
}

async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let paths = begin_run("generate", &args.run_dir, &args)?;

    let mut document = load_document(&args.config)?;
    let overrides = ConfigOverrides {
        num_records: args.num_records,
        seed: args.seed,
        table_name: args.table.clone(),
    };
    apply_overrides(&mut document, &overrides);

    let validated = validate_config(&document)?;
    for warning in &validated.warnings {
        tracing::warn!(event = "config_warning", code = %warning.code, "{warning}");
    }

    write_json(
        &paths.artifact("dataset.json"),
        &ConfigDocument::from(&validated.schema),
    )?;

    let seed_records = match &args.seed_data {
        Some(path) => load_seed_records(path)?,
        None => Vec::new(),
    };

    let engine = GenerationEngine::new(GenerateOptions {
        out_dir: args.out_dir.clone(),
        csv_only: args.csv_only,
    });
    let result = engine.run(&validated.schema, seed_records).await?;

    let report_path = paths.artifact("generation_report.json");
    write_json(&report_path, &result.report)?;
    tracing::info!(event = "report_written", path = %report_path.display());

    let report = &result.report;
    println!(
        "generated {} row(s) for '{}' (seed {})",
        report.rows_generated, report.table, report.seed
    );
    println!("csv: {} ({})", report.csv_path.display(), report.csv_sha256);
    if let Some(db_path) = &report.db_path {
        println!("sqlite: {}", db_path.display());
    }
    tracing::info!(event = "run_finished", status = "success", duration_ms = report.duration_ms);
    Ok(())
}

/// Parse a JSON array of objects into seed records.
fn load_seed_records(path: &Path) -> Result<Vec<Record>, CliError> {
    let text = fs::read_to_string(path).map_err(|err| CoreError::file_io(path, err))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| CliError::SeedData(format!("'{}': {err}", path.display())))?;
    let serde_json::Value::Array(items) = document else {
        return Err(CliError::SeedData(format!(
            "'{}': expected an array of records",
            path.display()
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let serde_json::Value::Object(fields) = item else {
                return Err(CliError::SeedData(format!("record {index} is not an object")));
            };
            fields
                .into_iter()
                .map(|(name, value)| {
                    let cell = json_cell(value).ok_or_else(|| {
                        CliError::SeedData(format!("record {index}: field '{name}' is not a scalar"))
                    })?;
                    Ok((name, cell))
                })
                .collect::<Result<Record, CliError>>()
        })
        .collect()
}

fn json_cell(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(flag) => Some(Value::Boolean(flag)),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_f64().map(Value::Real)),
        serde_json::Value::String(text) => Some(Value::Text(text)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

async fn run_practice_schema(args: PracticeArgs) -> Result<(), CliError> {
    init_console_logging()?;

    let practice = PracticeSchema {
        seed: args.seed,
        departments: args.departments,
        employees: args.employees,
        projects: args.projects,
    };
    let summary = practice.materialize(&args.db).await?;
    println!("practice schema written to {}", args.db.display());
    for (table, rows) in &summary.tables {
        println!("  {table}: {rows} row(s)");
    }
    Ok(())
}

async fn run_record_solution(args: RecordArgs) -> Result<(), CliError> {
    init_console_logging()?;

    let question = QuestionPaths::new(&args.question);
    let validator = AnswerValidator::new(SqliteStore::new(&args.db));
    let result = validator.record_expected(&question).await?;
    println!(
        "recorded {} row(s) for '{}' at {}",
        result.row_count(),
        question.name(),
        question.expected_csv().display()
    );
    Ok(())
}

async fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let paths = begin_run("check", &args.run_dir, &args)?;

    let question = QuestionPaths::new(&args.question);
    let answer_path = args
        .answer
        .clone()
        .unwrap_or_else(|| question.solution_sql());
    let sql = load_sql(&answer_path)?;

    let validator = AnswerValidator::new(SqliteStore::new(&args.db));
    let verdict = match validator.check(&question, &sql).await {
        Ok(verdict) => verdict,
        Err(err) => {
            tracing::error!(event = "run_finished", status = "error", error = %err);
            return Err(err.into());
        }
    };

    write_json(&paths.artifact("outcome.json"), &verdict)?;
    let report = render_report(&verdict, args.max_examples);
    write_text(&paths.artifact("report.md"), &report)?;
    println!("{report}");

    let status = if verdict.is_match() { "match" } else { "mismatch" };
    tracing::info!(event = "run_finished", status = status, run_root = %paths.root.display());
    if verdict.is_match() {
        Ok(())
    } else {
        Err(CliError::Mismatch(verdict.question))
    }
}

fn run_questions(args: QuestionsArgs) -> Result<(), CliError> {
    let document = load_document(&args.catalog)?;
    let catalog = validate_catalog(&document)?;

    for question in listed_questions(&catalog, args.all) {
        let marker = if question.active { "" } else { " (inactive)" };
        println!(
            "{} [{:?}, {}s]{marker}",
            question.name, question.difficulty, question.time_limit_seconds
        );
        println!("    {}", question.description);
        if !question.tags.is_empty() {
            println!("    tags: {}", question.tags.join(", "));
        }
    }
    Ok(())
}

fn listed_questions(catalog: &QuestionCatalog, all: bool) -> Vec<&Question> {
    if all {
        catalog.questions.iter().collect()
    } else {
        catalog.active().collect()
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = config_json_schema();
    match args.out {
        Some(path) => write_json(&path, &schema)?,
        None => {
            let json = serde_json::to_string_pretty(&schema).map_err(registry::RegistryError::from)?;
            println!("{json}");
        }
    }
    Ok(())
}
