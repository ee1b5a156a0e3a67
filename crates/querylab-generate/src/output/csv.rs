use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use querylab_core::{Dataset, Error, Result};

/// Size and digest of a written CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvSummary {
    pub rows: u64,
    pub bytes_written: u64,
    pub sha256: String,
}

/// Write a dataset as CSV, header first, columns in dataset order.
///
/// Rows go to a sibling temp file that is renamed over `path` once
/// complete, so readers never see a truncated file.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<CsvSummary> {
    let tmp_path = temp_path(path)?;
    let summary = write_rows(&tmp_path, dataset).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })?;
    fs::rename(&tmp_path, path).map_err(|err| Error::file_io(path, err))?;
    Ok(summary)
}

fn write_rows(path: &Path, dataset: &Dataset) -> Result<CsvSummary> {
    let file = File::create(path).map_err(|err| Error::file_io(path, err))?;
    let counting = CountingWriter::new(BufWriter::new(file));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    let csv_err = |err: csv::Error| Error::file_io(path, err);

    writer.write_record(dataset.columns()).map_err(csv_err)?;
    let mut rows = 0_u64;
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|value| value.to_csv()))
            .map_err(csv_err)?;
        rows += 1;
    }

    writer.flush().map_err(|err| Error::file_io(path, err))?;
    let mut counting = writer
        .into_inner()
        .map_err(|err| Error::file_io(path, err.into_error()))?;
    counting.flush().map_err(|err| Error::file_io(path, err))?;

    Ok(CsvSummary {
        rows,
        bytes_written: counting.bytes_written(),
        sha256: hex::encode(counting.hasher.finalize()),
    })
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::FileIo(format!("'{}': not a file path", path.display())))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
    hasher: Sha256,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            bytes: 0,
            hasher: Sha256::new(),
        }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.hasher.update(&buf[..size]);
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
