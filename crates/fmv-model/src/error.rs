use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Domain;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
    #[error("unknown document status: {0}")]
    UnknownStatus(String),
}

/// File-level failure: the header lacks a column the domain cannot do without.
///
/// Aborts processing of that file only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{file}: missing required column(s) for {domain}: {}", .columns.join(", "))]
    MissingColumns {
        file: String,
        domain: Domain,
        columns: Vec<String>,
    },
}

/// Internal invariant violation while merging a domain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsolidationError {
    #[error("record '{key}' is a {found} record inside the {expected} run")]
    DomainMismatch {
        key: String,
        expected: Domain,
        found: Domain,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {source}")]
    Toml {
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown field '{field}' for {domain} in {setting}")]
    UnknownField {
        domain: Domain,
        field: String,
        setting: &'static str,
    },

    #[error("unknown domain section '{0}'")]
    UnknownDomain(String),

    #[error("status alias '{alias}' points to unknown status '{target}'")]
    UnknownStatus { alias: String, target: String },

    #[error("at least one date format is required")]
    NoDateFormats,
}
