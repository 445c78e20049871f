#![deny(unsafe_code)]

//! Resolves spreadsheet headers to canonical domain fields.

pub mod mapping;
pub mod patterns;
pub mod score;
pub mod utils;

pub use mapping::{ColumnMapping, DuplicateColumn, UnmappedColumn, resolve_columns};
pub use patterns::{FieldPatterns, build_field_patterns};
pub use score::{SUGGESTION_MIN, Suggestion, suggest_field};
pub use utils::normalize_label;
