//! Dashboard metrics per domain.
//!
//! Counts cover every consolidated record; monetary aggregates and flags use valid
//! records only. A total that leaves the `Decimal` range is reported as `None`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use fmv_model::{
    AlertLevel, ConsolidatedSet, Domain, DomainOutcome, ProcessedRecord, RunOutcome,
    identity_key,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Window of the "last days" disbursement total, counted back from the latest date.
const RECENT_DAYS: u64 = 7;

/// Label used for document statuses with no text at all.
const EMPTY_STATUS: &str = "(empty)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditLineMetrics {
    pub counterparties: usize,
    pub total_limit: Option<Decimal>,
    pub total_balance: Option<Decimal>,
    /// Mean of the defined usage ratios, as a percentage. `None` without any ratio.
    pub average_usage_percent: Option<Decimal>,
    pub upcoming: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisbursementMetrics {
    pub total_amount: Option<Decimal>,
    pub last_date: Option<NaiveDate>,
    pub last_date_total: Option<Decimal>,
    pub recent_total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStatusMetrics {
    /// State name, raw text for unknown statuses, or `(empty)`.
    pub by_status: BTreeMap<String, usize>,
    /// Pending plus observed documents.
    pub attention: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactMetrics {
    pub missing_email: usize,
    pub missing_phone: usize,
    pub duplicate_emails: usize,
    pub duplicate_identities: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DomainMetrics {
    CreditLine(CreditLineMetrics),
    Disbursement(DisbursementMetrics),
    DocumentStatus(DocumentStatusMetrics),
    Contact(ContactMetrics),
}

fn amount(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

fn total(value: Option<Decimal>) -> String {
    value.map_or_else(|| "out of range".to_string(), amount)
}

impl DomainMetrics {
    /// Display label and value of every metric, in dashboard order.
    pub fn rows(&self) -> Vec<(String, String)> {
        let row = |name: &str, value: String| (name.to_string(), value);
        match self {
            DomainMetrics::CreditLine(m) => vec![
                row("Counterparties", m.counterparties.to_string()),
                row("Total limit", total(m.total_limit)),
                row("Total balance", total(m.total_balance)),
                row(
                    "Average usage %",
                    m.average_usage_percent
                        .map_or_else(|| "-".to_string(), amount),
                ),
                row("Expiring soon", m.upcoming.to_string()),
                row("Overdue", m.overdue.to_string()),
            ],
            DomainMetrics::Disbursement(m) => vec![
                row("Total amount", total(m.total_amount)),
                row(
                    "Last date",
                    m.last_date
                        .map_or_else(|| "-".to_string(), |date| date.to_string()),
                ),
                row("Last date total", total(m.last_date_total)),
                row("Last 7 days total", total(m.recent_total)),
            ],
            DomainMetrics::DocumentStatus(m) => {
                let mut rows: Vec<(String, String)> = m
                    .by_status
                    .iter()
                    .map(|(status, count)| (format!("Status: {status}"), count.to_string()))
                    .collect();
                rows.push(row("Needs attention", m.attention.to_string()));
                rows
            }
            DomainMetrics::Contact(m) => vec![
                row("Missing e-mail", m.missing_email.to_string()),
                row("Missing phone", m.missing_phone.to_string()),
                row("Duplicate e-mails", m.duplicate_emails.to_string()),
                row("Duplicate contacts", m.duplicate_identities.to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSummary {
    pub domain: Domain,
    pub records: usize,
    pub invalid: usize,
    pub warnings: usize,
    pub merges: usize,
    pub skipped_files: usize,
    pub metrics: DomainMetrics,
}

/// Summarizes one domain outcome.
pub fn summarize(outcome: &DomainOutcome) -> DomainSummary {
    let set = &outcome.set;
    DomainSummary {
        domain: outcome.domain,
        records: set.len(),
        invalid: set.invalid_count(),
        warnings: set.warning_count(),
        merges: set.merge_notes.len(),
        skipped_files: outcome.skipped_files.len(),
        metrics: metrics(set),
    }
}

/// Summaries of every finished domain, in run order.
pub fn summarize_run(outcome: &RunOutcome) -> Vec<DomainSummary> {
    outcome.domains.iter().map(summarize).collect()
}

fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, Decimal::checked_add)
}

fn metrics(set: &ConsolidatedSet) -> DomainMetrics {
    match set.domain {
        Domain::CreditLine => DomainMetrics::CreditLine(credit_line_metrics(set)),
        Domain::Disbursement => DomainMetrics::Disbursement(disbursement_metrics(set)),
        Domain::DocumentStatus => DomainMetrics::DocumentStatus(document_status_metrics(set)),
        Domain::Contact => DomainMetrics::Contact(contact_metrics(set)),
    }
}

fn credit_line_metrics(set: &ConsolidatedSet) -> CreditLineMetrics {
    let mut counterparties = BTreeSet::new();
    let mut limits = Vec::new();
    let mut balances = Vec::new();
    let mut ratios = Vec::new();
    let mut upcoming = 0;
    let mut overdue = 0;

    for record in set.valid_records() {
        let Some(line) = record.record.as_credit_line() else {
            continue;
        };
        if let Some(counterparty) = line.counterparty.as_deref() {
            counterparties.insert(identity_key(counterparty));
        }
        limits.extend(line.limit_amount);
        balances.extend(line.balance_amount);
        if let Some(derived) = record.derived.as_ref().and_then(|d| d.as_credit_line()) {
            ratios.extend(derived.usage.ratio());
            match derived.alert_level {
                AlertLevel::Upcoming => upcoming += 1,
                AlertLevel::Overdue => overdue += 1,
                AlertLevel::None => {}
            }
        }
    }

    let average_usage_percent = checked_total(ratios.iter().copied())
        .filter(|_| !ratios.is_empty())
        .and_then(|sum| sum.checked_div(Decimal::from(ratios.len())))
        .and_then(|mean| mean.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(2));

    CreditLineMetrics {
        counterparties: counterparties.len(),
        total_limit: checked_total(limits),
        total_balance: checked_total(balances),
        average_usage_percent,
        upcoming,
        overdue,
    }
}

fn disbursement_metrics(set: &ConsolidatedSet) -> DisbursementMetrics {
    let items: Vec<(Option<NaiveDate>, Decimal)> = set
        .valid_records()
        .filter_map(|record| record.record.as_disbursement())
        .map(|item| (item.date, item.amount.unwrap_or_default()))
        .collect();
    let total_amount = checked_total(items.iter().map(|(_, amount)| *amount));
    let last_date = items.iter().filter_map(|(date, _)| *date).max();

    let total_since = |from: Option<NaiveDate>| -> Option<Decimal> {
        let Some(from) = from else {
            return Some(Decimal::ZERO);
        };
        checked_total(
            items
                .iter()
                .filter(|(date, _)| date.is_some_and(|date| date >= from))
                .map(|(_, amount)| *amount),
        )
    };

    DisbursementMetrics {
        total_amount,
        last_date,
        last_date_total: total_since(last_date),
        recent_total: total_since(
            last_date.map(|last| last.checked_sub_days(Days::new(RECENT_DAYS)).unwrap_or(last)),
        ),
    }
}

fn status_label(record: &ProcessedRecord) -> Option<(String, bool)> {
    let doc = record.record.as_document_status()?;
    let label = match (doc.status, doc.status_raw.as_deref()) {
        (Some(state), _) => state.as_str().to_string(),
        (None, Some(raw)) => raw.to_string(),
        (None, None) => EMPTY_STATUS.to_string(),
    };
    Some((label, doc.status.is_some_and(|state| state.needs_attention())))
}

fn document_status_metrics(set: &ConsolidatedSet) -> DocumentStatusMetrics {
    let mut by_status = BTreeMap::new();
    let mut attention = 0;
    for (label, needs_attention) in set.valid_records().filter_map(status_label) {
        *by_status.entry(label).or_insert(0) += 1;
        if needs_attention {
            attention += 1;
        }
    }
    DocumentStatusMetrics {
        by_status,
        attention,
    }
}

fn contact_metrics(set: &ConsolidatedSet) -> ContactMetrics {
    let mut metrics = ContactMetrics {
        missing_email: 0,
        missing_phone: 0,
        duplicate_emails: 0,
        duplicate_identities: 0,
    };
    for record in set.valid_records() {
        let Some(contact) = record.record.as_contact() else {
            continue;
        };
        if contact.email.is_none() {
            metrics.missing_email += 1;
        }
        if contact.phone.is_none() {
            metrics.missing_phone += 1;
        }
        if let Some(derived) = record.derived.as_ref().and_then(|d| d.as_contact()) {
            metrics.duplicate_emails += usize::from(derived.duplicate_email_flag);
            metrics.duplicate_identities += usize::from(derived.duplicate_flag);
        }
    }
    metrics
}

#[cfg(test)]
mod tests {
    use fmv_model::{
        CanonicalRecord, CreditLine, CreditLineDerived, DerivedFields, Disbursement,
        DocumentState, DocumentStatus, RecordKey, SourceFile, Usage,
    };

    use super::*;

    fn processed(record: CanonicalRecord, row: usize) -> ProcessedRecord {
        let derived = match record.domain() {
            Domain::Disbursement => Some(DerivedFields::Disbursement),
            Domain::DocumentStatus => Some(DerivedFields::DocumentStatus),
            _ => None,
        };
        ProcessedRecord {
            key: RecordKey::for_record(&record, "x.csv", row),
            source: SourceFile::new("x.csv", None, 0),
            row,
            record,
            issues: vec![],
            derived,
        }
    }

    fn outcome(domain: Domain, records: Vec<ProcessedRecord>) -> DomainOutcome {
        DomainOutcome {
            domain,
            set: ConsolidatedSet {
                domain,
                records,
                merge_notes: vec![],
            },
            skipped_files: vec![],
        }
    }

    #[test]
    fn disbursement_totals_by_recency() {
        let item = |row: usize, day: u32, amount: i64| {
            processed(
                CanonicalRecord::Disbursement(Disbursement {
                    reference: Some(format!("OP-{row}")),
                    institution: Some("IFI".to_string()),
                    date: NaiveDate::from_ymd_opt(2024, 5, day),
                    amount: Some(Decimal::from(amount)),
                }),
                row,
            )
        };
        let summary = summarize(&outcome(
            Domain::Disbursement,
            vec![item(1, 1, 100), item(2, 20, 50), item(3, 27, 30), item(4, 27, 20)],
        ));
        let DomainMetrics::Disbursement(metrics) = summary.metrics else {
            panic!("wrong metrics kind");
        };
        assert_eq!(metrics.total_amount, Some(Decimal::from(200)));
        assert_eq!(metrics.last_date, NaiveDate::from_ymd_opt(2024, 5, 27));
        assert_eq!(metrics.last_date_total, Some(Decimal::from(50)));
        assert_eq!(metrics.recent_total, Some(Decimal::from(100)));
    }

    #[test]
    fn totals_beyond_decimal_range_are_none() {
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        let line = |row: usize| {
            let record = CanonicalRecord::CreditLine(CreditLine {
                id: Some(format!("L-{row}")),
                counterparty: Some("BANCO".to_string()),
                line_type: None,
                limit_amount: Some(huge),
                balance_amount: Some(huge),
                expiry_date: None,
            });
            let mut record = processed(record, row);
            record.derived = Some(DerivedFields::CreditLine(CreditLineDerived {
                usage: Usage::Ratio(huge),
                available_amount: Some(Decimal::ZERO),
                days_to_expiry: None,
                alert_level: AlertLevel::None,
            }));
            record
        };
        let summary = summarize(&outcome(Domain::CreditLine, vec![line(1), line(2)]));
        let DomainMetrics::CreditLine(metrics) = summary.metrics else {
            panic!("wrong metrics kind");
        };
        assert_eq!(metrics.counterparties, 1);
        assert_eq!(metrics.total_limit, None);
        assert_eq!(metrics.total_balance, None);
        assert_eq!(metrics.average_usage_percent, None);

        let item = |row: usize| {
            processed(
                CanonicalRecord::Disbursement(Disbursement {
                    reference: Some(format!("OP-{row}")),
                    institution: Some("IFI".to_string()),
                    date: NaiveDate::from_ymd_opt(2024, 5, 2),
                    amount: Some(huge),
                }),
                row,
            )
        };
        let summary = summarize(&outcome(Domain::Disbursement, vec![item(1), item(2)]));
        let DomainMetrics::Disbursement(metrics) = summary.metrics else {
            panic!("wrong metrics kind");
        };
        assert_eq!(metrics.total_amount, None);
        assert_eq!(metrics.last_date_total, None);
        let rows = DomainMetrics::Disbursement(metrics).rows();
        assert_eq!(rows[0], ("Total amount".to_string(), "out of range".to_string()));
    }

    #[test]
    fn document_statuses_keep_unknown_text() {
        let doc = |row: usize, status: Option<DocumentState>, raw: Option<&str>| {
            processed(
                CanonicalRecord::DocumentStatus(DocumentStatus {
                    counterparty: Some("BANCO".to_string()),
                    document: Some(format!("DOC-{row}")),
                    status,
                    status_raw: raw.map(str::to_string),
                    updated_at: None,
                }),
                row,
            )
        };
        let summary = summarize(&outcome(
            Domain::DocumentStatus,
            vec![
                doc(1, Some(DocumentState::Pending), Some("Pendiente")),
                doc(2, Some(DocumentState::Observed), Some("observada")),
                doc(3, Some(DocumentState::Approved), Some("ok")),
                doc(4, None, Some("archivado")),
                doc(5, None, None),
            ],
        ));
        let DomainMetrics::DocumentStatus(metrics) = summary.metrics else {
            panic!("wrong metrics kind");
        };
        assert_eq!(metrics.attention, 2);
        assert_eq!(metrics.by_status.get("archivado"), Some(&1));
        assert_eq!(metrics.by_status.get("(empty)"), Some(&1));
        assert_eq!(metrics.by_status.get("pending"), Some(&1));
    }
}
