//! Source files into raw tables.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use fmv_model::{CellValue, Domain, RawRow, RawTable, SourceFile};
use polars::prelude::*;
use tracing::{debug, warn};

use crate::as_of::detect_as_of;
use crate::discovery::SourceFormat;
use crate::error::{IngestError, Result};
use crate::workbook::read_workbook_table;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Rejects UTF-16 files (by BOM); UTF-8 with or without BOM passes.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = open(path)?;
    let mut buffer = [0u8; 4];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read >= 2 {
        if buffer[0..2] == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer[0..2] == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }
    Ok(())
}

/// Reads the header line, without BOM.
fn read_header_line(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(open(path)?);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    let line = line.strip_prefix('\u{feff}').unwrap_or(&line).trim_end().to_string();
    if line.trim().is_empty() {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    Ok(line)
}

/// Spreadsheet exports in Spanish locales use `;` between fields.
fn detect_separator(header: &str) -> u8 {
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn cell_from_any(value: AnyValue<'_>) -> CellValue {
    match value {
        AnyValue::Null => CellValue::Empty,
        AnyValue::String(s) => CellValue::from_text(s),
        AnyValue::StringOwned(s) => CellValue::from_text(s.as_str()),
        other => CellValue::from_text(other.to_string()),
    }
}

/// Reads a CSV or Excel file into a [`RawTable`], by extension. Unknown extensions are
/// read as CSV.
pub fn read_raw_table(path: &Path, source: SourceFile) -> Result<RawTable> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::Workbook) => read_workbook_table(path, source),
        Some(SourceFormat::Csv) | None => read_csv_table(path, source),
    }
}

/// Reads a CSV file into a [`RawTable`]. Every column is read as text; empty rows are
/// dropped but the remaining rows keep their position in the file.
pub fn read_csv_table(path: &Path, source: SourceFile) -> Result<RawTable> {
    validate_encoding(path)?;
    let header = read_header_line(path)?;
    let separator = detect_separator(&header);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut table = RawTable::new(source, headers.clone());
    let columns = df.get_columns();
    let mut blank = 0usize;
    for idx in 0..df.height() {
        let mut row = RawRow::new(idx + 1);
        for (label, column) in headers.iter().zip(columns) {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            row.cells.insert(label.clone(), cell_from_any(value));
        }
        if row.is_blank() {
            blank += 1;
            continue;
        }
        table.push_row(row);
    }

    debug!(
        path = %path.display(),
        rows = table.rows.len(),
        blank_rows = blank,
        columns = table.headers.len(),
        separator = %char::from(separator),
        "read source file"
    );
    Ok(table)
}

/// A file that could not be read.
#[derive(Debug)]
pub struct FileFailure {
    pub file: String,
    pub error: IngestError,
}

/// Readable tables of one domain plus the files that failed to load.
#[derive(Debug, Default)]
pub struct DomainTables {
    pub tables: Vec<RawTable>,
    pub failures: Vec<FileFailure>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

/// Reads every file of a domain in the given order.
///
/// Ingestion order follows `paths`; the as-of date comes from the file name, falling back
/// to `default_as_of`. A file that fails to load is reported, not fatal.
pub fn read_domain_tables(
    domain: Domain,
    paths: &[PathBuf],
    default_as_of: Option<NaiveDate>,
) -> DomainTables {
    let mut result = DomainTables::default();
    for (order, path) in paths.iter().enumerate() {
        let name = file_name(path);
        let stem = path.file_stem().and_then(|v| v.to_str()).unwrap_or("");
        let as_of = detect_as_of(stem).or(default_as_of);
        match read_raw_table(path, SourceFile::new(name.clone(), as_of, order)) {
            Ok(table) => result.tables.push(table),
            Err(error) => {
                warn!(%domain, file = %name, %error, "failed to read source file");
                result.failures.push(FileFailure { file: name, error });
            }
        }
    }
    result
}
