//! Header resolution for one source file.

use std::collections::BTreeMap;

use fmv_model::{Domain, DomainConfig, SchemaError, StandIn};
use serde::Serialize;

use crate::patterns::build_field_patterns;
use crate::score::{Suggestion, suggest_field};
use crate::utils::normalize_label;

/// A header that matched no canonical field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedColumn {
    pub header: String,
    pub suggestion: Option<Suggestion>,
}

/// A header ignored because an earlier header already supplies the same field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateColumn {
    pub header: String,
    pub field: &'static str,
    pub kept: String,
}

/// Canonical field to source header, plus what could not be used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMapping {
    pub domain: Domain,
    pub columns: BTreeMap<&'static str, String>,
    pub unmapped: Vec<UnmappedColumn>,
    pub duplicates: Vec<DuplicateColumn>,
}

impl ColumnMapping {
    pub fn header_for(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    pub fn is_mapped(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    /// The stand-in column supplying `field`, when `field` has no header of its own.
    pub fn stand_in_for(&self, field: &str) -> Option<(&'static StandIn, &str)> {
        if self.is_mapped(field) {
            return None;
        }
        self.domain
            .stand_ins_for(field)
            .find_map(|stand_in| Some((stand_in, self.header_for(stand_in.spec.name)?)))
    }
}

/// Maps `headers` of `file` onto the fields of `domain`.
///
/// Each field takes the first header matching its own name or one of its synonyms.
/// Fails when any required column has neither a header nor a stand-in column.
pub fn resolve_columns(
    file: &str,
    headers: &[String],
    domain: Domain,
    config: &DomainConfig,
) -> Result<ColumnMapping, SchemaError> {
    let patterns = build_field_patterns(domain, config);
    let mut columns: BTreeMap<&'static str, String> = BTreeMap::new();
    let mut unmapped = Vec::new();
    let mut duplicates = Vec::new();

    for header in headers {
        let label = normalize_label(header);
        match patterns.lookup(&label) {
            Some(field) => match columns.get(field) {
                Some(kept) => duplicates.push(DuplicateColumn {
                    header: header.clone(),
                    field,
                    kept: kept.clone(),
                }),
                None => {
                    columns.insert(field, header.clone());
                }
            },
            None => unmapped.push(UnmappedColumn {
                header: header.clone(),
                suggestion: suggest_field(&label, &patterns),
            }),
        }
    }

    let missing: Vec<String> = config
        .required_columns
        .iter()
        .filter(|field| {
            !columns.contains_key(field.as_str())
                && !domain
                    .stand_ins_for(field)
                    .any(|stand_in| columns.contains_key(stand_in.spec.name))
        })
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            file: file.to_string(),
            domain,
            columns: missing,
        });
    }

    Ok(ColumnMapping {
        domain,
        columns,
        unmapped,
        duplicates,
    })
}
