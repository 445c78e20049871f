#![deny(unsafe_code)]

//! The consolidation engine.
//!
//! Raw rows flow through normalize, validate, derive and consolidate; see
//! [`pipeline::build_default_pipeline`]. [`Engine`] runs that pipeline for every domain.

pub mod consolidate;
pub mod context;
pub mod derive;
pub mod engine;
pub mod normalize;
pub mod pipeline;

pub use consolidate::{consolidate, reconsolidate};
pub use context::ProcessingContext;
pub use derive::{DeriveContext, ValidatedRow, derive_batch};
pub use engine::{DomainInput, Engine};
pub use normalize::{NormalizedRow, NormalizedTable, normalize_table};
pub use pipeline::{DomainPipeline, PipelineState, ProcessingStep, build_default_pipeline};
