use chrono::NaiveDate;
use fmv_model::EngineConfig;
use fmv_validate::ValidationContext;

use crate::derive::DeriveContext;

/// Run-wide inputs: configuration plus the run date. The engine never reads the clock.
#[derive(Debug, Clone, Copy)]
pub struct ProcessingContext<'a> {
    pub config: &'a EngineConfig,
    pub today: NaiveDate,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext::new(self.today).with_far_future_years(self.config.far_future_years)
    }

    pub fn derive_context(&self) -> DeriveContext {
        DeriveContext {
            today: self.today,
            lookahead_days: self.config.lookahead_days,
            completeness_fields: self.config.completeness_fields.clone(),
        }
    }
}
