//! Supplemental-feed export
//!
//! CSV uses the result set's column list as the header with missing values
//! left empty. JSON is an array of flat objects, one per record, carrying
//! only the keys that record has.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::domain::ResultSet;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Write the header row and one row per record.
pub fn write_csv<W: Write>(results: &ResultSet, writer: W) -> ExportResult<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    w.write_record(results.columns())?;
    for row in results.rows() {
        w.write_record(&row)?;
    }
    w.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn export_csv(results: &ResultSet, path: &Path) -> ExportResult<()> {
    let file = create(path)?;
    write_csv(results, BufWriter::new(file))?;
    info!("Wrote {} records to {}", results.len(), path.display());
    Ok(())
}

pub fn to_json_string(results: &ResultSet) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

pub fn export_json(results: &ResultSet, path: &Path) -> ExportResult<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote {} records to {}", results.len(), path.display());
    Ok(())
}

fn create(path: &Path) -> ExportResult<File> {
    File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
