use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, QueryBuilder, Sqlite};
use tracing::{debug, info};

use querylab_core::{Dataset, DatasetSchema, Error, Result, Value};

/// SQLite caps bound parameters per statement at 999 on older builds.
const MAX_BIND_PARAMS: usize = 999;

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Column of a materialized table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub unique: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            unique: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Foreign key from `columns` to `referenced_table(referenced_columns)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Table layout rendered into `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDefinition {
    /// Single table with one column per schema field and no keys.
    pub fn from_schema(schema: &DatasetSchema) -> Self {
        Self {
            name: schema.table_name().to_string(),
            columns: schema
                .fields()
                .iter()
                .map(|field| ColumnDefinition::new(&field.name, field.kind.sql_type()))
                .collect(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn create_sql(&self) -> String {
        let mut parts: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut part = format!("{} {}", quote_ident(&column.name), column.sql_type);
                if column.not_null {
                    part.push_str(" NOT NULL");
                }
                if column.unique {
                    part.push_str(" UNIQUE");
                }
                part
            })
            .collect();
        if !self.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", quote_list(&self.primary_key)));
        }
        for fk in &self.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_list(&fk.columns),
                quote_ident(&fk.referenced_table),
                quote_list(&fk.referenced_columns)
            ));
        }
        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.name),
            parts.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(&self.name))
    }
}

/// One table to (re)create together with its rows in column order.
#[derive(Debug, Clone)]
pub struct TableLoad<'a> {
    pub definition: TableDefinition,
    pub rows: Vec<Vec<&'a Value>>,
}

/// Writes tables into a SQLite file with replace-on-write semantics.
#[derive(Debug, Clone)]
pub struct SqliteMaterializer {
    path: PathBuf,
}

impl SqliteMaterializer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the schema's table with the dataset's records.
    pub async fn replace_dataset(&self, schema: &DatasetSchema, dataset: &Dataset) -> Result<u64> {
        let load = TableLoad {
            definition: TableDefinition::from_schema(schema),
            rows: dataset.rows().collect(),
        };
        let counts = self.replace_tables(&[load]).await?;
        Ok(counts.first().map(|(_, rows)| *rows).unwrap_or(0))
    }

    /// Drop and recreate every table, then insert their rows, in one
    /// transaction.
    ///
    /// Tables are dropped in reverse order and created in the given order,
    /// so parents must precede the tables that reference them. A failure
    /// rolls back and leaves the previous tables in place.
    pub async fn replace_tables(&self, loads: &[TableLoad<'_>]) -> Result<Vec<(String, u64)>> {
        let mut conn = self.connect().await?;
        let mut tx = conn
            .begin()
            .await
            .map_err(|err| Error::database("failed to begin transaction", err))?;

        for load in loads.iter().rev() {
            let sql = load.definition.drop_sql();
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|err| Error::database(&sql, err))?;
        }

        let mut counts = Vec::with_capacity(loads.len());
        for load in loads {
            let sql = load.definition.create_sql();
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|err| Error::database(&sql, err))?;

            let inserted = insert_rows(&mut tx, load).await?;
            debug!(table = %load.definition.name, rows = inserted, "table rows inserted");
            counts.push((load.definition.name.clone(), inserted));
        }

        tx.commit()
            .await
            .map_err(|err| Error::database("failed to commit transaction", err))?;
        conn.close()
            .await
            .map_err(|err| Error::database("failed to close connection", err))?;

        info!(
            db = %self.path.display(),
            tables = counts.len(),
            "tables replaced"
        );
        Ok(counts)
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_millis(SQLITE_BUSY_TIMEOUT_MS))
            .connect()
            .await
            .map_err(|err| {
                Error::database(format!("failed to open '{}'", self.path.display()), err)
            })
    }
}

async fn insert_rows(conn: &mut SqliteConnection, load: &TableLoad<'_>) -> Result<u64> {
    let columns = &load.definition.columns;
    if columns.is_empty() || load.rows.is_empty() {
        return Ok(0);
    }

    let names: Vec<String> = columns.iter().map(|column| column.name.clone()).collect();
    let prefix = format!(
        "INSERT INTO {} ({}) ",
        quote_ident(&load.definition.name),
        quote_list(&names)
    );
    let batch = (MAX_BIND_PARAMS / columns.len()).max(1);

    let mut inserted = 0_u64;
    for chunk in load.rows.chunks(batch) {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(&prefix);
        builder.push_values(chunk, |mut row, values| {
            for value in values {
                match value {
                    Value::Null => {
                        row.push_bind(None::<i64>);
                    }
                    Value::Boolean(flag) => {
                        row.push_bind(i64::from(*flag));
                    }
                    Value::Integer(number) => {
                        row.push_bind(*number);
                    }
                    Value::Real(number) => {
                        row.push_bind(*number);
                    }
                    Value::Text(text) => {
                        row.push_bind(text.clone());
                    }
                    Value::Blob(bytes) => {
                        row.push_bind(bytes.clone());
                    }
                }
            }
        });
        let result = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|err| Error::database(format!("failed to insert into {}", load.definition.name), err))?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Quote an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}
