//! Excel workbook export: a summary sheet plus one sheet per domain.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fmv_model::{ConsolidatedSet, FieldKind, RunOutcome};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use tracing::info;

use crate::csv::{frame_columns, row_values};
use crate::summary::summarize;

pub const WORKBOOK_FILE: &str = "fmv_tracker_report.xlsx";
pub const SUMMARY_SHEET: &str = "summary";

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x2563EB))
        .set_font_color(Color::RGB(0xFFFFFF))
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], format: &Format) -> Result<()> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, u16::try_from(col)?, *name, format)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, outcome: &RunOutcome, header: &Format) -> Result<()> {
    sheet.set_name(SUMMARY_SHEET)?;
    write_header(sheet, &["domain", "metric", "value"], header)?;
    let mut row = 1u32;
    for domain in &outcome.domains {
        let summary = summarize(domain);
        let counts = [
            ("Records", summary.records),
            ("Invalid", summary.invalid),
            ("Warnings", summary.warnings),
            ("Merged", summary.merges),
            ("Skipped files", summary.skipped_files),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_string(), count.to_string()));
        for (metric, value) in counts.chain(summary.metrics.rows()) {
            sheet.write_string(row, 0, summary.domain.as_str())?;
            sheet.write_string(row, 1, &metric)?;
            sheet.write_string(row, 2, &value)?;
            row += 1;
        }
    }
    for failed in &outcome.failed {
        sheet.write_string(row, 0, failed.domain.as_str())?;
        sheet.write_string(row, 1, "Failed")?;
        sheet.write_string(row, 2, &failed.reason)?;
        row += 1;
    }
    sheet.set_column_width(0, 18)?;
    sheet.set_column_width(1, 22)?;
    Ok(())
}

/// One row per consolidated record, same columns as the CSV export. Amount fields are
/// written as numbers.
fn write_domain_sheet(sheet: &mut Worksheet, set: &ConsolidatedSet, header: &Format) -> Result<()> {
    let domain = set.domain;
    sheet.set_name(domain.as_str())?;
    let columns = frame_columns(domain);
    write_header(sheet, &columns, header)?;
    let amount_format = Format::new()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);

    for (index, record) in set.records.iter().enumerate() {
        let row = u32::try_from(index + 1)?;
        for (col, (name, value)) in columns.iter().zip(row_values(domain, record)).enumerate() {
            let col = u16::try_from(col)?;
            let number = domain
                .field(name)
                .filter(|spec| spec.kind == FieldKind::Amount)
                .and_then(|_| record.record.field(name).as_amount())
                .and_then(|amount| amount.to_f64());
            match (number, value) {
                (Some(number), _) => {
                    sheet.write_number_with_format(row, col, number, &amount_format)?;
                }
                (None, Some(text)) => {
                    sheet.write_string(row, col, &text)?;
                }
                (None, None) => {}
            }
        }
    }
    Ok(())
}

/// Writes `fmv_tracker_report.xlsx` into `output_dir` and returns its path.
pub fn write_report_workbook(output_dir: &Path, outcome: &RunOutcome) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let path = output_dir.join(WORKBOOK_FILE);
    let header = header_format();

    let mut workbook = Workbook::new();
    write_summary_sheet(workbook.add_worksheet(), outcome, &header)?;
    for domain in &outcome.domains {
        write_domain_sheet(workbook.add_worksheet(), &domain.set, &header)?;
    }
    workbook
        .save(&path)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), domains = outcome.domains.len(), "wrote report workbook");
    Ok(path)
}
