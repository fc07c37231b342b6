use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::models::{DetailRow, ListingRecord};
use crate::{Result, ScoutError};

const BOM: char = '\u{feff}';

/// Appends rows to a CSV file for the length of a run.
///
/// The header goes in only when the file is new or empty, so reopening an
/// existing result file never duplicates it.
pub struct CsvAppender {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl CsvAppender {
    pub fn open(path: &Path, header: &[&str]) -> Result<Self> {
        ensure_parent(path)?;
        let is_new = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(header)?;
            writer.flush()?;
            debug!("Created {} with header", path.display());
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }

    pub fn append(&mut self, row: &[&str]) -> Result<()> {
        self.writer.write_record(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Append a single row, writing the header first if the file is new
pub fn append_csv(path: &Path, header: &[&str], row: &[&str]) -> Result<()> {
    let mut appender = CsvAppender::open(path, header)?;
    appender.append(row)?;
    appender.flush()
}

/// Serialize `records` as one pretty JSON array, replacing any previous file
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Rewrite `path` with the joined listing + detail columns
pub fn write_detail_csv(path: &Path, rows: &[DetailRow]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(DetailRow::header())?;
    for row in rows {
        writer.write_record(row.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

/// Load listings produced by a listing run, from `.json` or `.csv`
pub fn read_listings(path: &Path) -> Result<Vec<ListingRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        Some("csv") => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .from_path(path)?;
            let header: Vec<String> = reader
                .headers()?
                .iter()
                .map(|h| h.trim_start_matches(BOM).to_string())
                .collect();
            let mut records = Vec::new();
            for row in reader.records() {
                let row: Vec<String> = row?.iter().map(String::from).collect();
                records.push(ListingRecord::from_row(&header, &row));
            }
            Ok(records)
        }
        _ => Err(ScoutError::Configuration(format!(
            "input {} must be a .json or .csv listing file",
            path.display()
        ))),
    }
}

/// `<stem>_details.csv` / `.json` beside the input unless `output` names the CSV
pub fn detail_output_paths(input: &Path, output: Option<&Path>) -> (PathBuf, PathBuf) {
    let csv_path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "listings".to_string());
            input.with_file_name(format!("{stem}_details.csv"))
        }
    };
    let json_path = csv_path.with_extension("json");
    (csv_path, json_path)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
