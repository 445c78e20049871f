//! FMV Tracker reporting.
//!
//! - **Summaries**: per-domain dashboard metrics over a consolidated set
//! - **CSV**: one flat export per domain (canonical, derived and issue columns)
//! - **JSON**: the full run outcome with records, issues, merge notes and summaries
//! - **Excel**: one workbook with a summary sheet and a sheet per domain

mod csv;
mod json;
mod summary;
mod workbook;

pub use csv::{build_frame, frame_columns, write_domain_csv};
pub use json::{REPORT_SCHEMA, REPORT_SCHEMA_VERSION, write_report_json};
pub use summary::{
    ContactMetrics, CreditLineMetrics, DisbursementMetrics, DocumentStatusMetrics,
    DomainMetrics, DomainSummary, summarize, summarize_run,
};
pub use workbook::{SUMMARY_SHEET, WORKBOOK_FILE, write_report_workbook};
