#![deny(unsafe_code)]

//! Per-domain record validation.
//!
//! Rules are plain values grouped in a [`RuleSet`]; every rule runs against every record
//! and only reports. Nothing here drops or edits a record.

mod checks;
mod rules;

pub use checks::{ValidatedRecord, ValidationContext, validate};
pub use rules::{Rule, RuleSet};
