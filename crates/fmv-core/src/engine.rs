use std::time::Instant;

use chrono::NaiveDate;
use fmv_model::{
    ConsolidationError, Domain, DomainOutcome, EngineConfig, FailedDomain, RawTable,
    RunOutcome, SkippedFile,
};
use tracing::{error, info, info_span};

use crate::context::ProcessingContext;
use crate::pipeline::{DomainPipeline, build_default_pipeline};

/// Everything the engine needs for one domain: parsed tables plus files that were
/// already rejected upstream (unreadable, wrong encoding).
#[derive(Debug, Clone)]
pub struct DomainInput {
    pub domain: Domain,
    pub tables: Vec<RawTable>,
    pub skipped_files: Vec<SkippedFile>,
}

impl DomainInput {
    pub fn new(domain: Domain, tables: Vec<RawTable>) -> Self {
        Self {
            domain,
            tables,
            skipped_files: Vec::new(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<SkippedFile>) -> Self {
        self.skipped_files.extend(skipped);
        self
    }
}

/// Runs the domain pipeline with an explicit configuration and run date.
pub struct Engine {
    config: EngineConfig,
    today: NaiveDate,
    pipeline: DomainPipeline,
}

impl Engine {
    pub fn new(config: EngineConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            pipeline: build_default_pipeline(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: DomainPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Processes one domain; upstream skipped files are carried into the outcome.
    pub fn process_domain(&self, input: DomainInput) -> Result<DomainOutcome, ConsolidationError> {
        let ctx = ProcessingContext::new(&self.config, self.today);
        let mut outcome = self.pipeline.execute(input.domain, &ctx, input.tables)?;
        let mut skipped = input.skipped_files;
        skipped.append(&mut outcome.skipped_files);
        outcome.skipped_files = skipped;
        Ok(outcome)
    }

    /// Processes every domain independently. A failing domain is recorded and the rest
    /// still run.
    pub fn run(&self, inputs: Vec<DomainInput>) -> RunOutcome {
        let _run = info_span!("run", today = %self.today, domains = inputs.len()).entered();
        let mut outcome = RunOutcome::default();
        for input in inputs {
            let domain = input.domain;
            let _span = info_span!("domain", domain = %domain).entered();
            let start = Instant::now();
            let files = input.tables.len();
            match self.process_domain(input) {
                Ok(result) => {
                    info!(
                        files,
                        records = result.set.len(),
                        invalid = result.set.invalid_count(),
                        warnings = result.set.warning_count(),
                        merges = result.set.merge_notes.len(),
                        skipped_files = result.skipped_files.len(),
                        duration_ms = start.elapsed().as_millis(),
                        "domain consolidated"
                    );
                    outcome.domains.push(result);
                }
                Err(err) => {
                    error!(error = %err, "domain failed");
                    outcome.failed.push(FailedDomain {
                        domain,
                        reason: err.to_string(),
                    });
                }
            }
        }
        outcome
    }
}
