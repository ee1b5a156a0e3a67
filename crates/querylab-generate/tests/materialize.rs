use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Row, SqliteConnection};

use querylab_core::{DATASET_CSV_FILE, DatasetSchema, ErrorKind, FieldSpec, Kind, Value};
use querylab_generate::output::ColumnDefinition;
use querylab_generate::{
    GenerateOptions, GenerationEngine, SqliteMaterializer, TableDefinition, TableLoad,
};

fn temp_out_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("querylab_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn hash_file(path: &Path) -> Result<String, std::io::Error> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn schema(record_count: u64) -> DatasetSchema {
    DatasetSchema::new(
        vec![
            FieldSpec::new("id", Kind::Integer { min: 1, max: 5 }),
            FieldSpec::new(
                "dept",
                Kind::Text {
                    candidates: vec!["Sales".to_string(), "Eng".to_string()],
                },
            ),
            FieldSpec::new("active", Kind::Boolean),
        ],
        record_count,
        Some(1),
        "employees",
    )
    .expect("valid schema")
}

fn engine(out_dir: &Path) -> GenerationEngine {
    GenerationEngine::new(GenerateOptions {
        out_dir: out_dir.to_path_buf(),
        ..GenerateOptions::default()
    })
}

async fn open(path: &Path) -> SqliteConnection {
    SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .connect()
        .await
        .expect("open sqlite")
}

#[tokio::test]
async fn csv_output_is_byte_identical_across_runs() {
    let dir_a = temp_out_dir("gen_a");
    let dir_b = temp_out_dir("gen_b");

    let a = engine(&dir_a).run(&schema(25), Vec::new()).await.expect("run a");
    let b = engine(&dir_b).run(&schema(25), Vec::new()).await.expect("run b");

    let hash_a = hash_file(&dir_a.join(DATASET_CSV_FILE)).expect("hash a");
    let hash_b = hash_file(&dir_b.join(DATASET_CSV_FILE)).expect("hash b");
    assert_eq!(hash_a, hash_b);
    assert_eq!(a.report.csv_sha256, hash_a);
    assert_eq!(b.report.csv_sha256, hash_b);
    assert_eq!(
        a.report.csv_bytes,
        fs::metadata(dir_a.join(DATASET_CSV_FILE)).expect("metadata").len()
    );
    assert!(!dir_a.join(format!("{DATASET_CSV_FILE}.tmp")).exists());
}

#[tokio::test]
async fn csv_has_header_and_one_line_per_record() {
    let dir = temp_out_dir("gen_csv");
    let result = engine(&dir).run(&schema(12), Vec::new()).await.expect("run");

    let mut reader = csv::Reader::from_path(&result.report.csv_path).expect("open csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["id", "dept", "active"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(|row| row.expect("row")).collect();
    assert_eq!(rows.len(), 12);
    for row in rows {
        assert!(matches!(&row[2], "true" | "false"), "boolean cell {:?}", &row[2]);
    }
}

#[tokio::test]
async fn regenerating_replaces_the_table() {
    let dir = temp_out_dir("gen_replace");
    let engine = engine(&dir);

    engine.run(&schema(30), Vec::new()).await.expect("first run");
    let second = engine.run(&schema(30), Vec::new()).await.expect("second run");
    assert_eq!(second.report.rows_materialized, Some(30));

    let db_path = second.report.db_path.expect("db path");
    let mut conn = open(&db_path).await;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&mut conn)
        .await
        .expect("count rows");
    assert_eq!(count, 30);

    let smaller = engine.run(&schema(4), Vec::new()).await.expect("third run");
    assert_eq!(smaller.report.rows_generated, 4);
    let mut conn = open(&db_path).await;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&mut conn)
        .await
        .expect("count rows");
    assert_eq!(count, 4);
}

#[tokio::test]
async fn table_rows_match_the_dataset() {
    let dir = temp_out_dir("gen_rows");
    let result = engine(&dir).run(&schema(8), Vec::new()).await.expect("run");
    let db_path = result.report.db_path.clone().expect("db path");

    let mut conn = open(&db_path).await;
    let rows = sqlx::query("SELECT id, dept, active FROM employees ORDER BY rowid")
        .fetch_all(&mut conn)
        .await
        .expect("select rows");
    assert_eq!(rows.len(), result.dataset.len());

    for (row, record) in rows.iter().zip(result.dataset.records()) {
        let id: i64 = row.try_get("id").expect("id");
        let dept: String = row.try_get("dept").expect("dept");
        let active: i64 = row.try_get("active").expect("active");
        assert_eq!(Some(id), record["id"].as_i64());
        assert_eq!(Some(dept.as_str()), record["dept"].as_str());
        assert_eq!(record["active"].as_bool(), Some(active == 1));
        assert!(active == 0 || active == 1);
    }
}

#[tokio::test]
async fn csv_only_skips_the_store() {
    let dir = temp_out_dir("gen_csv_only");
    let engine = GenerationEngine::new(GenerateOptions {
        out_dir: dir.clone(),
        csv_only: true,
    });
    let result = engine.run(&schema(3), Vec::new()).await.expect("run");
    assert!(result.report.db_path.is_none());
    assert!(result.report.csv_path.exists());
}

#[tokio::test]
async fn unwritable_output_is_a_file_error() {
    let dir = temp_out_dir("gen_blocked");
    let blocker = dir.join("not_a_dir");
    fs::write(&blocker, "x").expect("write blocker");

    let err = engine(&blocker)
        .run(&schema(3), Vec::new())
        .await
        .expect_err("output dir is a file");
    assert_eq!(err.kind(), ErrorKind::FileIo);
}

fn strict_table(name: &str) -> TableDefinition {
    TableDefinition {
        name: name.to_string(),
        columns: vec![ColumnDefinition::new("id", "INTEGER").not_null()],
        primary_key: Vec::new(),
        foreign_keys: Vec::new(),
    }
}

#[tokio::test]
async fn failed_replace_keeps_the_previous_table() {
    let dir = temp_out_dir("gen_rollback");
    let first = engine(&dir).run(&schema(4), Vec::new()).await.expect("first run");
    let db_path = first.report.db_path.expect("db path");

    let one = Value::Integer(1);
    let null = Value::Null;
    let loads = [
        TableLoad {
            definition: strict_table("audit"),
            rows: vec![vec![&one]],
        },
        TableLoad {
            definition: strict_table("employees"),
            rows: vec![vec![&one], vec![&null]],
        },
    ];
    let err = SqliteMaterializer::new(&db_path)
        .replace_tables(&loads)
        .await
        .expect_err("NULL in a NOT NULL column");
    assert_eq!(err.kind(), ErrorKind::Database);

    let mut conn = open(&db_path).await;
    let rows = sqlx::query("SELECT id, dept, active FROM employees")
        .fetch_all(&mut conn)
        .await
        .expect("old table still has its columns");
    assert_eq!(rows.len(), 4);
    let audit: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'audit'",
    )
    .fetch_one(&mut conn)
    .await
    .expect("count tables");
    assert_eq!(audit, 0);
}
