use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use fmv_model::{
    ConsolidatedSet, Domain, FailedDomain, MergeNote, ProcessedRecord, RunOutcome, SkippedFile,
};
use serde::Serialize;
use tracing::info;

use crate::summary::{DomainSummary, summarize};

pub const REPORT_SCHEMA: &str = "fmv-tracker.run-report";
pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct RunReportPayload<'a> {
    schema: &'static str,
    schema_version: u32,
    generated_at: String,
    today: NaiveDate,
    domains: Vec<DomainReport<'a>>,
    failed: &'a [FailedDomain],
}

#[derive(Debug, Serialize)]
struct DomainReport<'a> {
    domain: Domain,
    summary: DomainSummary,
    skipped_files: &'a [SkippedFile],
    merge_notes: &'a [MergeNote],
    records: &'a [ProcessedRecord],
}

impl<'a> DomainReport<'a> {
    fn new(summary: DomainSummary, set: &'a ConsolidatedSet, skipped: &'a [SkippedFile]) -> Self {
        Self {
            domain: set.domain,
            summary,
            skipped_files: skipped,
            merge_notes: &set.merge_notes,
            records: &set.records,
        }
    }
}

/// Writes `run_report.json` into `output_dir` and returns its path.
pub fn write_report_json(
    output_dir: &Path,
    today: NaiveDate,
    outcome: &RunOutcome,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let output_path = output_dir.join("run_report.json");
    let payload = RunReportPayload {
        schema: REPORT_SCHEMA,
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        today,
        domains: outcome
            .domains
            .iter()
            .map(|domain| DomainReport::new(summarize(domain), &domain.set, &domain.skipped_files))
            .collect(),
        failed: &outcome.failed,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(&output_path, format!("{json}\n"))
        .with_context(|| format!("write {}", output_path.display()))?;
    info!(path = %output_path.display(), domains = outcome.domains.len(), "wrote run report");
    Ok(output_path)
}
