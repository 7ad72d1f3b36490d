use crate::error::Error;
use crate::record::{UnifiedRecord, CSV_HEADER};
use chrono::Local;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<YYYY_MM_DD>_BrowserExport.csv` for today's date.
pub fn default_file_name() -> String {
    format!("{}_BrowserExport.csv", Local::now().format("%Y_%m_%d"))
}

pub fn output_path(dir: &Path, file_name: Option<&str>) -> PathBuf {
    match file_name {
        Some(name) => dir.join(name),
        None => dir.join(default_file_name()),
    }
}

/// Write records as CSV. The header row is written even when `records` is empty.
pub fn write_records<W: Write>(writer: W, records: &[UnifiedRecord]) -> Result<usize, Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(records.len())
}

pub fn write_csv(path: &Path, records: &[UnifiedRecord]) -> Result<usize, Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let rows = write_records(file, records)?;
    debug!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}
