//! CLI library components for the FMV Tracker.

pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod types;
