//! Flat per-domain CSV export.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fmv_model::{ConsolidatedSet, DerivedFields, Domain, ProcessedRecord};
use polars::prelude::*;
use tracing::info;

const LEADING_COLUMNS: &[&str] = &["key", "source", "row"];
const TRAILING_COLUMNS: &[&str] = &["valid", "errors", "warnings", "issues"];

fn derived_columns(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::CreditLine => &[
            "usage_percent",
            "available_amount",
            "days_to_expiry",
            "alert_level",
        ],
        Domain::Contact => &[
            "duplicate_flag",
            "duplicate_email_flag",
            "missing_field_flag",
            "missing_fields",
        ],
        Domain::Disbursement | Domain::DocumentStatus => &[],
    }
}

/// Column names of the export, in order.
pub fn frame_columns(domain: Domain) -> Vec<&'static str> {
    LEADING_COLUMNS
        .iter()
        .copied()
        .chain(domain.fields().iter().map(|field| field.name))
        .chain(derived_columns(domain).iter().copied())
        .chain(TRAILING_COLUMNS.iter().copied())
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn derived_values(derived: Option<&DerivedFields>) -> Vec<Option<String>> {
    match derived {
        Some(DerivedFields::CreditLine(line)) => vec![
            line.usage.percent().map(|p| p.normalize().to_string()),
            line.available_amount.map(|a| a.normalize().to_string()),
            line.days_to_expiry.map(|d| d.to_string()),
            Some(line.alert_level.as_str().to_string()),
        ],
        Some(DerivedFields::Contact(contact)) => vec![
            Some(contact.duplicate_flag.to_string()),
            Some(contact.duplicate_email_flag.to_string()),
            Some(contact.missing_field_flag.to_string()),
            non_empty(contact.missing_fields.join(";")),
        ],
        Some(DerivedFields::Disbursement | DerivedFields::DocumentStatus) | None => Vec::new(),
    }
}

pub(crate) fn row_values(domain: Domain, record: &ProcessedRecord) -> Vec<Option<String>> {
    let mut values = vec![
        Some(record.key.to_string()),
        Some(record.source.name.clone()),
        Some(record.row.to_string()),
    ];
    values.extend(domain.fields().iter().map(|field| record.record.render_field(field.name)));

    let mut derived = derived_values(record.derived.as_ref());
    derived.resize(derived_columns(domain).len(), None);
    values.extend(derived);

    let issues = record
        .issues
        .iter()
        .map(|issue| format!("{} {}: {}", issue.severity, issue.field, issue.message))
        .collect::<Vec<_>>()
        .join(" | ");
    values.extend([
        Some(record.is_valid().to_string()),
        Some(record.error_count().to_string()),
        Some(record.warning_count().to_string()),
        non_empty(issues),
    ]);
    values
}

/// Builds a string-typed frame with one row per consolidated record.
pub fn build_frame(set: &ConsolidatedSet) -> PolarsResult<DataFrame> {
    let names = frame_columns(set.domain);
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(set.len()); names.len()];
    for record in &set.records {
        for (column, value) in columns.iter_mut().zip(row_values(set.domain, record)) {
            column.push(value);
        }
    }
    let columns: Vec<Column> = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new((*name).into(), values).into_column())
        .collect();
    DataFrame::new(columns)
}

/// Writes `<domain>.csv` into `output_dir` and returns its path.
pub fn write_domain_csv(set: &ConsolidatedSet, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.csv", set.domain.as_str()));
    let mut df = build_frame(set).with_context(|| format!("build {} frame", set.domain))?;
    let mut file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write {}", path.display()))?;
    info!(domain = %set.domain, path = %path.display(), rows = df.height(), "wrote domain export");
    Ok(path)
}
