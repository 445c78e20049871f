//! Folder run: ingest, consolidate, export.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fmv_core::{DomainInput, Engine};
use fmv_ingest::{discover_domain_files, list_source_files, read_domain_tables};
use fmv_model::{Domain, EngineConfig, RunOutcome, SkippedFile};
use fmv_report::{summarize_run, write_domain_csv, write_report_json, write_report_workbook};
use tracing::{debug, info, info_span, warn};

use crate::cli::RunArgs;
use crate::logging::redact_value;
use crate::types::{RunOutputs, RunResult};

/// Parsed tables per domain, plus the source files that matched no domain.
#[derive(Debug)]
pub struct IngestResult {
    pub inputs: Vec<DomainInput>,
    pub ignored: Vec<String>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

/// Loads the configuration file (if any) and applies command line overrides.
pub fn load_config(path: Option<&Path>, lookahead_days: Option<i64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(days) = lookahead_days {
        config = config.with_lookahead_days(days);
    }
    Ok(config)
}

/// Reads every recognised CSV or Excel file in `folder`. Unreadable files become skipped files of
/// their domain; only an unreadable folder is an error.
pub fn ingest(folder: &Path, default_as_of: Option<NaiveDate>) -> Result<IngestResult> {
    let files = list_source_files(folder)
        .with_context(|| format!("list source files in {}", folder.display()))?;
    let discovered = discover_domain_files(&files);
    let ignored: Vec<String> = discovered.ignored.iter().map(|p| display_name(p)).collect();
    for name in &ignored {
        warn!(file = %name, "no domain matches file name, ignored");
    }

    let mut inputs = Vec::new();
    for (domain, paths) in &discovered.domains {
        let tables = read_domain_tables(*domain, paths, default_as_of);
        let skipped = tables
            .failures
            .into_iter()
            .map(|failure| SkippedFile {
                file: failure.file,
                reason: failure.error.to_string(),
            })
            .collect();
        debug!(%domain, files = paths.len(), "domain files read");
        inputs.push(DomainInput::new(*domain, tables.tables).with_skipped(skipped));
    }
    Ok(IngestResult { inputs, ignored })
}

/// Logs row issues at debug level. Messages quote cell values, so they are redacted.
fn log_issues(outcome: &RunOutcome) {
    for domain in &outcome.domains {
        for issue in domain.set.issues() {
            debug!(
                domain = %domain.domain,
                record = %issue.record,
                field = %issue.field,
                severity = %issue.severity,
                message = redact_value(&issue.message),
                "validation issue"
            );
        }
    }
}

/// Writes one CSV per finished domain, the JSON run report and the Excel workbook.
pub fn export(outcome: &RunOutcome, output_dir: &Path, today: NaiveDate) -> Result<RunOutputs> {
    let domain_csv = outcome
        .domains
        .iter()
        .map(|domain| write_domain_csv(&domain.set, output_dir))
        .collect::<Result<Vec<PathBuf>>>()?;
    let report_json = write_report_json(output_dir, today, outcome)?;
    let workbook = write_report_workbook(output_dir, outcome)?;
    Ok(RunOutputs {
        output_dir: output_dir.to_path_buf(),
        domain_csv,
        report_json,
        workbook,
    })
}

pub fn run_folder(args: &RunArgs, today: NaiveDate) -> Result<RunResult> {
    let folder = &args.folder;
    let run_span = info_span!("run", folder = %folder.display(), %today);
    let _run_guard = run_span.enter();

    let config = load_config(args.config.as_deref(), args.lookahead_days)?;

    let ingest_start = Instant::now();
    let IngestResult { inputs, ignored } = ingest(folder, args.as_of)?;
    info!(
        domain_count = inputs.len(),
        table_count = inputs.iter().map(|input| input.tables.len()).sum::<usize>(),
        ignored = ignored.len(),
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );

    let engine = Engine::new(config, today);
    let outcome = engine.run(inputs);
    log_issues(&outcome);
    for failed in &outcome.failed {
        warn!(domain = %failed.domain, reason = %failed.reason, "domain not consolidated");
    }

    let outputs = if args.dry_run {
        info!("dry run, no files written");
        None
    } else {
        let output_dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| folder.join("output"));
        Some(export(&outcome, &output_dir, today)?)
    };

    let missing: Vec<Domain> = Domain::ALL
        .into_iter()
        .filter(|domain| outcome.domain(*domain).is_none())
        .filter(|domain| !outcome.failed.iter().any(|failed| failed.domain == *domain))
        .collect();
    if !missing.is_empty() {
        info!(?missing, "domains without source files");
    }

    Ok(RunResult {
        folder: folder.clone(),
        today,
        summaries: summarize_run(&outcome),
        outcome,
        ignored_files: ignored,
        outputs,
    })
}
