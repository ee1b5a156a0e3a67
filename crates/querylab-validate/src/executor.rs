use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row, Statement, TypeInfo, ValueRef};
use tracing::{debug, info};

use querylab_core::{Error, QueryResult, Result, Value};

use crate::gate::check_query;

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Backing store a query executor reads from.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable location used in logs and errors.
    fn describe(&self) -> String;

    /// Run one statement and return every row with its column names.
    async fn fetch(&self, sql: &str) -> Result<QueryResult>;
}

/// SQLite file opened read-only for each query.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))
            .connect()
            .await
            .map_err(|err| {
                Error::database(format!("failed to open '{}'", self.path.display()), err)
            })
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    async fn fetch(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self.connect().await?;

        let (columns, rows) = {
            // Column names come from the prepared statement so empty results
            // still carry their header.
            let statement = (&mut conn).prepare(sql).await.map_err(|err| {
                Error::database(format!("failed to prepare query `{sql}`"), err)
            })?;
            let columns: Vec<String> = statement
                .columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect();

            let fetched = statement
                .query()
                .fetch_all(&mut conn)
                .await
                .map_err(|err| Error::database(format!("failed to execute query `{sql}`"), err))?;
            let rows = fetched.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
            (columns, rows)
        };

        conn.close()
            .await
            .map_err(|err| Error::database("failed to close connection", err))?;

        QueryResult::new(columns, rows)
    }
}

fn decode_row(row: &SqliteRow) -> Result<Vec<Value>> {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

fn decode_cell(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|err| Error::database(format!("failed to read column {index}"), err))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_string();

    let decode_err = |err: sqlx::Error| {
        Error::database(format!("failed to decode {storage} value in column {index}"), err)
    };
    let value = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Integer(row.try_get_unchecked(index).map_err(decode_err)?),
        "REAL" | "NUMERIC" => Value::Real(row.try_get_unchecked(index).map_err(decode_err)?),
        "BLOB" => Value::Blob(row.try_get_unchecked(index).map_err(decode_err)?),
        _ => Value::Text(row.try_get_unchecked(index).map_err(decode_err)?),
    };
    Ok(value)
}

/// Runs gate-approved queries against a store.
///
/// The safety gate runs on every call, before the store is touched.
#[derive(Debug, Clone)]
pub struct QueryExecutor<S> {
    store: S,
}

impl<S: Store> QueryExecutor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn execute(&self, sql: &str) -> Result<QueryResult> {
        check_query(sql)?;

        let start = Instant::now();
        debug!(store = %self.store.describe(), query_len = sql.len(), "executing query");
        let result = self.store.fetch(sql).await?;
        info!(
            store = %self.store.describe(),
            columns = result.columns().len(),
            rows = result.row_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "query executed"
        );
        Ok(result)
    }
}
