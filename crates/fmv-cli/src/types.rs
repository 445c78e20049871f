use std::path::PathBuf;

use chrono::NaiveDate;
use fmv_model::RunOutcome;
use fmv_report::DomainSummary;

#[derive(Debug)]
pub struct RunResult {
    pub folder: PathBuf,
    pub today: NaiveDate,
    pub outcome: RunOutcome,
    pub summaries: Vec<DomainSummary>,
    /// Source files no domain keyword matched.
    pub ignored_files: Vec<String>,
    pub outputs: Option<RunOutputs>,
}

impl RunResult {
    /// A failed domain or a skipped file makes the run unclean.
    pub fn has_problems(&self) -> bool {
        !self.outcome.is_clean()
    }
}

#[derive(Debug)]
pub struct RunOutputs {
    pub output_dir: PathBuf,
    pub domain_csv: Vec<PathBuf>,
    pub report_json: PathBuf,
    pub workbook: PathBuf,
}
