//! Expected-result artifact: a CSV file with a header row plus a JSON
//! layout sidecar recording the type of every cell.
//!
//! The CSV alone cannot tell `NULL` from `''` or the text `'042'` from the
//! integer 42, so cells are decoded through the sidecar, never guessed.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use querylab_core::{Error, QueryResult, Result, Value};

/// Storage type of one cell of an expected result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Null,
    Boolean,
    Integer,
    Real,
    Text,
    Blob,
}

impl CellType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => CellType::Null,
            Value::Boolean(_) => CellType::Boolean,
            Value::Integer(_) => CellType::Integer,
            Value::Real(_) => CellType::Real,
            Value::Text(_) => CellType::Text,
            Value::Blob(_) => CellType::Blob,
        }
    }

    /// Parse a CSV cell written by `Value::to_csv` back into this type.
    fn decode(self, cell: &str) -> Option<Value> {
        match self {
            CellType::Null => cell.is_empty().then_some(Value::Null),
            CellType::Boolean => match cell {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            CellType::Integer => cell.parse().ok().map(Value::Integer),
            CellType::Real => cell.parse().ok().map(Value::Real),
            CellType::Text => Some(Value::Text(cell.to_string())),
            CellType::Blob => hex::decode(cell).ok().map(Value::Blob),
        }
    }
}

/// Types of one column.
///
/// `cell_type` is shared by every non-null cell and `nulls` lists the NULL
/// rows. Columns whose non-null cells disagree carry one type per row in
/// `cells` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub name: String,
    #[serde(rename = "type")]
    pub cell_type: CellType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nulls: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<CellType>>,
}

/// Sidecar describing the cell types of an expected-result CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedLayout {
    pub rows: usize,
    pub columns: Vec<ColumnLayout>,
}

impl ExpectedLayout {
    pub fn of(result: &QueryResult) -> Self {
        let columns = result
            .columns()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let types: Vec<CellType> = result
                    .rows()
                    .iter()
                    .map(|row| row.get(index).map_or(CellType::Null, CellType::of))
                    .collect();
                let distinct: BTreeSet<CellType> = types
                    .iter()
                    .copied()
                    .filter(|cell_type| *cell_type != CellType::Null)
                    .collect();
                let nulls = types
                    .iter()
                    .enumerate()
                    .filter(|(_, cell_type)| **cell_type == CellType::Null)
                    .map(|(row, _)| row)
                    .collect();

                match distinct.len() {
                    0 | 1 => ColumnLayout {
                        name: name.clone(),
                        cell_type: distinct.first().copied().unwrap_or(CellType::Null),
                        nulls,
                        cells: None,
                    },
                    _ => ColumnLayout {
                        name: name.clone(),
                        cell_type: CellType::Text,
                        nulls: Vec::new(),
                        cells: Some(types),
                    },
                }
            })
            .collect();

        Self {
            rows: result.row_count(),
            columns,
        }
    }

    fn cell_types(&self) -> Vec<Vec<CellType>> {
        self.columns
            .iter()
            .map(|column| match &column.cells {
                Some(cells) => cells.clone(),
                None => {
                    let nulls: BTreeSet<usize> = column.nulls.iter().copied().collect();
                    (0..self.rows)
                        .map(|row| {
                            if nulls.contains(&row) {
                                CellType::Null
                            } else {
                                column.cell_type
                            }
                        })
                        .collect()
                }
            })
            .collect()
    }
}

/// Sidecar path for an expected-result CSV (`x.csv` -> `x.types.json`).
pub fn expected_layout_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("types.json")
}

/// Persist a query result as CSV plus its layout sidecar, each via a temp
/// file and rename.
pub fn write_expected(path: &Path, result: &QueryResult) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| Error::file_io(parent, err))?;
        }
    }

    let layout_path = expected_layout_path(path);
    let layout = serde_json::to_vec_pretty(&ExpectedLayout::of(result))
        .map_err(|err| Error::file_io(&layout_path, err))?;
    write_atomic(&layout_path, |file_path| write_bytes(file_path, &layout))?;
    write_atomic(path, |file_path| write_rows(file_path, result))
}

fn write_atomic(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let tmp_path = temp_path(path)?;
    write(&tmp_path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })?;
    fs::rename(&tmp_path, path).map_err(|err| Error::file_io(path, err))
}

fn write_bytes(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|err| Error::file_io(path, err))?;
    file.write_all(data).map_err(|err| Error::file_io(path, err))?;
    file.sync_all().map_err(|err| Error::file_io(path, err))
}

fn write_rows(path: &Path, result: &QueryResult) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::file_io(path, err))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    let csv_err = |err: csv::Error| Error::file_io(path, err);

    writer.write_record(result.columns()).map_err(csv_err)?;
    for row in result.rows() {
        writer
            .write_record(row.iter().map(Value::to_csv))
            .map_err(csv_err)?;
    }

    let mut inner = writer
        .into_inner()
        .map_err(|err| Error::file_io(path, err.into_error()))?;
    inner.flush().map_err(|err| Error::file_io(path, err))?;
    inner
        .get_ref()
        .sync_all()
        .map_err(|err| Error::file_io(path, err))
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::FileIo(format!("'{}': not a file path", path.display())))?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

/// Load an expected-result CSV, decoding each cell with the type recorded
/// in its layout sidecar.
pub fn read_expected(path: &Path) -> Result<QueryResult> {
    let layout = read_layout(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| Error::file_io(path, err))?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(|err| Error::file_io(path, err))?
        .iter()
        .map(str::to_string)
        .collect();
    let layout_columns: Vec<&str> = layout.columns.iter().map(|c| c.name.as_str()).collect();
    if columns != layout_columns {
        return Err(Error::Validation(format!(
            "'{}': header [{}] disagrees with the layout [{}]",
            path.display(),
            columns.join(", "),
            layout_columns.join(", ")
        )));
    }

    let cell_types = layout.cell_types();
    let mut rows = Vec::with_capacity(layout.rows);
    for (row_index, record) in reader.records().enumerate() {
        let record = record.map_err(|err| Error::file_io(path, err))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(column, cell)| {
                let cell_type = cell_types
                    .get(column)
                    .and_then(|types| types.get(row_index))
                    .copied()
                    .ok_or_else(|| {
                        Error::Validation(format!(
                            "'{}': row {row_index} is not described by the layout",
                            path.display()
                        ))
                    })?;
                cell_type.decode(cell).ok_or_else(|| {
                    Error::Validation(format!(
                        "'{}': row {row_index} column '{}' holds '{cell}', not a {cell_type:?} value",
                        path.display(),
                        columns.get(column).map_or("?", String::as_str)
                    ))
                })
            })
            .collect::<Result<Vec<Value>>>()?;
        rows.push(row);
    }

    if rows.len() != layout.rows {
        return Err(Error::Validation(format!(
            "'{}': {} row(s) but the layout records {}",
            path.display(),
            rows.len(),
            layout.rows
        )));
    }

    QueryResult::new(columns, rows)
        .map_err(|err| Error::Validation(format!("'{}': {err}", path.display())))
}

fn read_layout(csv_path: &Path) -> Result<ExpectedLayout> {
    let path = expected_layout_path(csv_path);
    let text = fs::read_to_string(&path).map_err(|err| Error::file_io(&path, err))?;
    serde_json::from_str(&text)
        .map_err(|err| Error::Validation(format!("'{}': {err}", path.display())))
}
