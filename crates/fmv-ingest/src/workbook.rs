//! Excel workbooks into raw tables.
//!
//! The first worksheet is read; its first non-empty row is the header. Number and date
//! cells keep their type, so amounts and dates skip text parsing.

use std::fmt::Display;
use std::path::Path;

use calamine::{Data, DataType, Reader, open_workbook_auto};
use fmv_model::{CellValue, RawRow, RawTable, SourceFile};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::debug;

use crate::error::{IngestError, Result};

fn workbook_error(path: &Path, err: impl Display) -> IngestError {
    IngestError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn cell_from_data(value: &Data) -> CellValue {
    match value {
        Data::Empty => CellValue::Empty,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => {
            CellValue::from_text(text.as_str())
        }
        Data::Int(number) => CellValue::Number(Decimal::from(*number)),
        Data::Float(number) => Decimal::from_f64(*number).map_or_else(
            || CellValue::from_text(number.to_string()),
            |number| CellValue::Number(number.normalize()),
        ),
        Data::DateTime(_) => value
            .as_date()
            .map_or_else(|| CellValue::from_text(value.to_string()), CellValue::Date),
        Data::Bool(flag) => CellValue::Text(flag.to_string()),
        // Formula errors (`#DIV/0!`) stay visible as text and fail coercion downstream.
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}

fn header_label(value: &Data, index: usize) -> String {
    let label = value.to_string().trim().to_string();
    if label.is_empty() {
        format!("column_{}", index + 1)
    } else {
        label
    }
}

/// Reads the first worksheet of an `.xlsx`/`.xls` file into a [`RawTable`].
///
/// Rows are numbered from the header like CSV rows; blank rows are dropped but keep
/// their slot in the numbering.
pub fn read_workbook_table(path: &Path, source: SourceFile) -> Result<RawTable> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(path, e))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(IngestError::EmptySheet {
            path: path.to_path_buf(),
        });
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| workbook_error(path, e))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(IngestError::EmptySheet {
            path: path.to_path_buf(),
        });
    };
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(index, value)| header_label(value, index))
        .collect();

    let mut table = RawTable::new(source, headers.clone());
    let mut blank = 0usize;
    for (idx, cells) in rows.enumerate() {
        let mut row = RawRow::new(idx + 1);
        for (label, value) in headers.iter().zip(cells) {
            row.cells.insert(label.clone(), cell_from_data(value));
        }
        if row.is_blank() {
            blank += 1;
            continue;
        }
        table.push_row(row);
    }

    debug!(
        path = %path.display(),
        sheet = %sheet,
        rows = table.rows.len(),
        blank_rows = blank,
        columns = table.headers.len(),
        "read workbook"
    );
    Ok(table)
}
