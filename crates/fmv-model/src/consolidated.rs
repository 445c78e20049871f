//! Processed records, consolidated sets and run outcomes.

use serde::{Deserialize, Serialize};

use crate::cell::SourceFile;
use crate::derived::DerivedFields;
use crate::domain::Domain;
use crate::issue::{RecordRef, Severity, ValidationIssue};
use crate::record::{CanonicalRecord, RecordKey};

/// A canonical record with its validation issues and derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub key: RecordKey,
    pub source: SourceFile,
    /// 1-based row within `source`.
    pub row: usize,
    pub record: CanonicalRecord,
    pub issues: Vec<ValidationIssue>,
    /// `Some` exactly when the record is valid.
    pub derived: Option<DerivedFields>,
}

impl ProcessedRecord {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn record_ref(&self) -> RecordRef {
        RecordRef::new(self.source.name.clone(), self.row)
    }

    pub fn domain(&self) -> Domain {
        self.record.domain()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

/// Audit entry for a group of records that shared a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeNote {
    pub key: RecordKey,
    pub winner: RecordRef,
    pub losers: Vec<RecordRef>,
}

/// One deduplicated record set per domain, ordered by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedSet {
    pub domain: Domain,
    pub records: Vec<ProcessedRecord>,
    pub merge_notes: Vec<MergeNote>,
}

impl ConsolidatedSet {
    pub fn empty(domain: Domain) -> Self {
        Self {
            domain,
            records: Vec::new(),
            merge_notes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn valid_records(&self) -> impl Iterator<Item = &ProcessedRecord> {
        self.records.iter().filter(|record| record.is_valid())
    }

    pub fn invalid_count(&self) -> usize {
        self.records.iter().filter(|record| !record.is_valid()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.records.iter().map(ProcessedRecord::warning_count).sum()
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.records.iter().flat_map(|record| record.issues.iter())
    }

    pub fn get(&self, key: &RecordKey) -> Option<&ProcessedRecord> {
        self.records
            .binary_search_by(|record| record.key.cmp(key))
            .ok()
            .and_then(|index| self.records.get(index))
    }
}

/// A file that was not processed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainOutcome {
    pub domain: Domain,
    pub set: ConsolidatedSet,
    pub skipped_files: Vec<SkippedFile>,
}

impl DomainOutcome {
    /// Skipped files or invalid records present.
    pub fn has_problems(&self) -> bool {
        !self.skipped_files.is_empty() || self.set.invalid_count() > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDomain {
    pub domain: Domain,
    pub reason: String,
}

/// Partial results of a run: every domain that finished plus the ones that failed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunOutcome {
    pub domains: Vec<DomainOutcome>,
    pub failed: Vec<FailedDomain>,
}

impl RunOutcome {
    pub fn domain(&self, domain: Domain) -> Option<&DomainOutcome> {
        self.domains.iter().find(|outcome| outcome.domain == domain)
    }

    pub fn skipped_file_count(&self) -> usize {
        self.domains
            .iter()
            .map(|outcome| outcome.skipped_files.len())
            .sum()
    }

    /// No failed domain and no skipped file.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped_file_count() == 0
    }
}
