//! Cross-file merge of one domain.

use std::collections::BTreeMap;

use fmv_model::{
    ConsolidatedSet, ConsolidationError, Domain, MergeNote, ProcessedRecord, RecordKey,
};
use tracing::debug;

/// Latest as-of date wins; ties go to the later-ingested file, then the later row.
fn precedence(record: &ProcessedRecord) -> (Option<chrono::NaiveDate>, usize, usize) {
    let (as_of, order) = record.source.precedence();
    (as_of, order, record.row)
}

/// Merges the records of one domain into a keyed, deduplicated set.
///
/// Records sharing a key collapse into the one with the highest precedence; each such
/// group leaves a [`MergeNote`]. The output is ordered by key.
pub fn consolidate(
    domain: Domain,
    records: Vec<ProcessedRecord>,
) -> Result<ConsolidatedSet, ConsolidationError> {
    let mut groups: BTreeMap<RecordKey, Vec<ProcessedRecord>> = BTreeMap::new();
    for record in records {
        let found = record.domain();
        if found != domain {
            return Err(ConsolidationError::DomainMismatch {
                key: record.key.to_string(),
                expected: domain,
                found,
            });
        }
        groups.entry(record.key.clone()).or_default().push(record);
    }

    let mut set = ConsolidatedSet::empty(domain);
    for (key, mut group) in groups {
        group.sort_by_key(precedence);
        let Some(winner) = group.pop() else {
            continue;
        };
        if !group.is_empty() {
            debug!(%key, winner = %winner.record_ref(), losers = group.len(), "merged records");
            set.merge_notes.push(MergeNote {
                key,
                winner: winner.record_ref(),
                losers: group.iter().map(ProcessedRecord::record_ref).collect(),
            });
        }
        set.records.push(winner);
    }
    Ok(set)
}

/// Consolidates an existing set again, keeping its merge history.
pub fn reconsolidate(set: ConsolidatedSet) -> Result<ConsolidatedSet, ConsolidationError> {
    let mut merged = consolidate(set.domain, set.records)?;
    let mut notes = set.merge_notes;
    notes.append(&mut merged.merge_notes);
    notes.sort_by(|a, b| a.key.cmp(&b.key));
    merged.merge_notes = notes;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fmv_model::{CanonicalRecord, Contact, Disbursement, SourceFile};

    use super::*;

    fn disbursement(file: &str, as_of: Option<NaiveDate>, order: usize, row: usize) -> ProcessedRecord {
        let record = CanonicalRecord::Disbursement(Disbursement {
            reference: Some("OP-1".to_string()),
            institution: Some("IFI".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, 2),
            amount: None,
        });
        ProcessedRecord {
            key: RecordKey::for_record(&record, file, row),
            source: SourceFile::new(file, as_of, order),
            row,
            record,
            issues: vec![],
            derived: None,
        }
    }

    #[test]
    fn later_row_wins_within_one_file() {
        let set = consolidate(
            Domain::Disbursement,
            vec![
                disbursement("d.csv", None, 0, 2),
                disbursement("d.csv", None, 0, 7),
            ],
        )
        .unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].row, 7);
        assert_eq!(set.merge_notes[0].losers[0].row, 2);
    }

    #[test]
    fn undated_file_loses_to_dated_file() {
        let set = consolidate(
            Domain::Disbursement,
            vec![
                disbursement("dated.csv", NaiveDate::from_ymd_opt(2024, 1, 1), 0, 1),
                disbursement("undated.csv", None, 1, 1),
            ],
        )
        .unwrap();
        assert_eq!(set.records[0].source.name, "dated.csv");
    }

    #[test]
    fn rejects_records_of_another_domain() {
        let contact = CanonicalRecord::Contact(Contact::default());
        let stray = ProcessedRecord {
            key: RecordKey::for_record(&contact, "c.csv", 1),
            source: SourceFile::new("c.csv", None, 0),
            row: 1,
            record: contact,
            issues: vec![],
            derived: None,
        };
        let err = consolidate(Domain::Disbursement, vec![stray]).unwrap_err();
        assert_eq!(
            err,
            ConsolidationError::DomainMismatch {
                key: "c.csv#1 (unkeyed)".to_string(),
                expected: Domain::Disbursement,
                found: Domain::Contact,
            }
        );
    }
}
