use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A raw spreadsheet cell as handed over by the file reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    /// Builds a cell from text, mapping blank strings to `Empty`.
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) | CellValue::Date(_) => false,
        }
    }

    /// Renders the cell back to text (dates as `YYYY-MM-DD`).
    pub fn render(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => value.normalize().to_string(),
            CellValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

/// File-level metadata of an ingested source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Stable source identifier, usually the file name.
    pub name: String,
    /// Recency of the file's data. Undated files lose against dated ones.
    pub as_of: Option<NaiveDate>,
    /// Ingestion order within the run (0 = first seen).
    pub order: usize,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, as_of: Option<NaiveDate>, order: usize) -> Self {
        Self {
            name: name.into(),
            as_of,
            order,
        }
    }

    /// Precedence used when two files disagree: later as-of date, then later ingestion.
    pub fn precedence(&self) -> (Option<NaiveDate>, usize) {
        (self.as_of, self.order)
    }
}

/// One spreadsheet row: column label to raw cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based data row number within the file (header excluded).
    pub row: usize,
    pub cells: BTreeMap<String, CellValue>,
}

impl RawRow {
    pub fn new(row: usize) -> Self {
        Self {
            row,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, label: impl Into<String>, value: CellValue) -> Self {
        self.cells.insert(label.into(), value);
        self
    }

    pub fn get(&self, label: &str) -> &CellValue {
        self.cells.get(label).unwrap_or(&CellValue::Empty)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_empty)
    }
}

/// A parsed source file: header plus rows, tagged with its file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub source: SourceFile,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(source: SourceFile, headers: Vec<String>) -> Self {
        Self {
            source,
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row built from `(label, text)` pairs; row numbers follow insertion order.
    pub fn push_text_row<'a>(&mut self, cells: impl IntoIterator<Item = (&'a str, &'a str)>) {
        let mut row = RawRow::new(self.rows.len() + 1);
        for (label, value) in cells {
            row.cells.insert(label.to_string(), CellValue::from_text(value));
        }
        self.rows.push(row);
    }

    pub fn push_row(&mut self, row: RawRow) {
        self.rows.push(row);
    }
}
