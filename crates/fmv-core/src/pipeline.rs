//! Domain processing pipeline with ordered step execution.
//!
//! # Standard Pipeline Order
//!
//! 1. **NormalizeStep** - Resolve headers and coerce cells; files missing required
//!    columns are skipped
//! 2. **ValidateStep** - Run the domain rule set on every record
//! 3. **DeriveStep** - Compute derived fields per source file
//! 4. **ConsolidateStep** - Merge all files into one keyed set

use std::mem;

use fmv_model::{
    ConsolidatedSet, ConsolidationError, Domain, DomainOutcome, ProcessedRecord, RawTable,
    SkippedFile,
};
use fmv_validate::{RuleSet, validate};
use tracing::{debug, warn};

use crate::consolidate::consolidate;
use crate::context::ProcessingContext;
use crate::derive::{ValidatedRow, derive_batch};
use crate::normalize::{NormalizedRow, normalize_table};

/// A single processing step in the domain pipeline.
pub trait ProcessingStep: Send + Sync {
    /// Execute this step, reading and updating the shared state.
    fn execute(
        &self,
        domain: Domain,
        ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError>;

    /// Human-readable name for this step (for logging/debugging).
    fn step_name(&self) -> &str;
}

/// Mutable state shared across pipeline steps. Batches are per source file.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub tables: Vec<RawTable>,
    pub normalized: Vec<Vec<NormalizedRow>>,
    pub validated: Vec<Vec<ValidatedRow>>,
    pub processed: Vec<ProcessedRecord>,
    pub skipped_files: Vec<SkippedFile>,
    pub set: Option<ConsolidatedSet>,
    pub executed_steps: Vec<String>,
}

impl PipelineState {
    pub fn new(tables: Vec<RawTable>) -> Self {
        Self {
            tables,
            ..Self::default()
        }
    }
}

/// An ordered pipeline of processing steps.
pub struct DomainPipeline {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl Default for DomainPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the end of the pipeline.
    pub fn add_step(mut self, step: Box<dyn ProcessingStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Remove a step by name.
    pub fn remove_step(mut self, step_name: &str) -> Self {
        self.steps.retain(|s| s.step_name() != step_name);
        self
    }

    /// Execute all steps with provided state.
    pub fn execute_with_state(
        &self,
        domain: Domain,
        ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError> {
        for step in &self.steps {
            step.execute(domain, ctx, state)?;
            state.executed_steps.push(step.step_name().to_string());
        }
        Ok(())
    }

    /// Runs every step over `tables` and returns the domain outcome.
    ///
    /// A pipeline without a consolidation step yields an empty set.
    pub fn execute(
        &self,
        domain: Domain,
        ctx: &ProcessingContext<'_>,
        tables: Vec<RawTable>,
    ) -> Result<DomainOutcome, ConsolidationError> {
        let mut state = PipelineState::new(tables);
        self.execute_with_state(domain, ctx, &mut state)?;
        Ok(DomainOutcome {
            domain,
            set: state
                .set
                .unwrap_or_else(|| ConsolidatedSet::empty(domain)),
            skipped_files: state.skipped_files,
        })
    }

    /// List step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }
}

/// Step 1: header resolution and cell coercion.
pub struct NormalizeStep;

impl ProcessingStep for NormalizeStep {
    fn execute(
        &self,
        domain: Domain,
        ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError> {
        for table in mem::take(&mut state.tables) {
            let file = table.source.name.clone();
            match normalize_table(&table, domain, ctx.config) {
                Ok(normalized) => {
                    for column in &normalized.mapping.unmapped {
                        match &column.suggestion {
                            Some(suggestion) => warn!(
                                file = %file,
                                header = %column.header,
                                suggestion = suggestion.field,
                                score = suggestion.score,
                                "unmapped column resembles a known field"
                            ),
                            None => debug!(file = %file, header = %column.header, "unmapped column"),
                        }
                    }
                    for duplicate in &normalized.mapping.duplicates {
                        warn!(
                            file = %file,
                            header = %duplicate.header,
                            field = duplicate.field,
                            kept = %duplicate.kept,
                            "duplicate column ignored"
                        );
                    }
                    debug!(file = %file, rows = normalized.rows.len(), "normalized file");
                    state.normalized.push(normalized.rows);
                }
                Err(err) => {
                    warn!(file = %file, error = %err, "skipping file");
                    state.skipped_files.push(SkippedFile {
                        file,
                        reason: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn step_name(&self) -> &str {
        "normalize"
    }
}

/// Step 2: rule validation. Flags, never drops.
pub struct ValidateStep;

impl ProcessingStep for ValidateStep {
    fn execute(
        &self,
        domain: Domain,
        ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError> {
        let rules = RuleSet::for_domain(domain, ctx.config);
        let validation_ctx = ctx.validation_context();
        for batch in mem::take(&mut state.normalized) {
            let validated = batch
                .into_iter()
                .map(|row| {
                    let record_ref = row.record_ref();
                    let checked = validate(
                        row.record,
                        &record_ref,
                        row.coercion_issues,
                        &rules,
                        &validation_ctx,
                    );
                    ValidatedRow {
                        source: row.source,
                        row: row.row,
                        record: checked.record,
                        issues: checked.issues,
                    }
                })
                .collect();
            state.validated.push(validated);
        }
        Ok(())
    }

    fn step_name(&self) -> &str {
        "validate"
    }
}

/// Step 3: derived fields, valid records only.
pub struct DeriveStep;

impl ProcessingStep for DeriveStep {
    fn execute(
        &self,
        _domain: Domain,
        ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError> {
        let derive_ctx = ctx.derive_context();
        for batch in mem::take(&mut state.validated) {
            state.processed.extend(derive_batch(batch, &derive_ctx));
        }
        Ok(())
    }

    fn step_name(&self) -> &str {
        "derive"
    }
}

/// Step 4: cross-file merge.
pub struct ConsolidateStep;

impl ProcessingStep for ConsolidateStep {
    fn execute(
        &self,
        domain: Domain,
        _ctx: &ProcessingContext<'_>,
        state: &mut PipelineState,
    ) -> Result<(), ConsolidationError> {
        state.set = Some(consolidate(domain, mem::take(&mut state.processed))?);
        Ok(())
    }

    fn step_name(&self) -> &str {
        "consolidate"
    }
}

/// Build the standard pipeline.
pub fn build_default_pipeline() -> DomainPipeline {
    DomainPipeline::new()
        .add_step(Box::new(NormalizeStep))
        .add_step(Box::new(ValidateStep))
        .add_step(Box::new(DeriveStep))
        .add_step(Box::new(ConsolidateStep))
}
