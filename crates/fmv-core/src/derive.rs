//! Derived fields for validated records.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use fmv_model::{
    AlertLevel, CanonicalRecord, Contact, ContactDerived, CreditLine, CreditLineDerived,
    DerivedFields, ProcessedRecord, RecordKey, SourceFile, Usage, ValidationIssue, identity_key,
};
use rust_decimal::Decimal;

/// Inputs of the deriver. Pure: identical inputs always give identical outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveContext {
    pub today: NaiveDate,
    pub lookahead_days: i64,
    pub completeness_fields: Vec<String>,
}

/// A record after validation, before derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRow {
    pub source: SourceFile,
    pub row: usize,
    pub record: CanonicalRecord,
    pub issues: Vec<ValidationIssue>,
}

impl ValidatedRow {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }
}

pub fn credit_line_usage(line: &CreditLine) -> Usage {
    match (line.balance_amount, line.limit_amount) {
        (Some(balance), Some(limit)) if !limit.is_zero() => balance
            .checked_div(limit)
            .map_or(Usage::Undefined, Usage::Ratio),
        _ => Usage::Undefined,
    }
}

fn alert_level(expiry: Option<NaiveDate>, ctx: &DeriveContext) -> AlertLevel {
    let Some(expiry) = expiry else {
        return AlertLevel::None;
    };
    if expiry < ctx.today {
        return AlertLevel::Overdue;
    }
    let lookahead = u64::try_from(ctx.lookahead_days).unwrap_or(0);
    let horizon = ctx
        .today
        .checked_add_days(Days::new(lookahead))
        .unwrap_or(NaiveDate::MAX);
    if expiry <= horizon {
        AlertLevel::Upcoming
    } else {
        AlertLevel::None
    }
}

pub fn derive_credit_line(line: &CreditLine, ctx: &DeriveContext) -> CreditLineDerived {
    let available_amount = match (line.limit_amount, line.balance_amount) {
        (Some(limit), Some(balance)) => limit.checked_sub(balance),
        _ => None,
    };
    CreditLineDerived {
        usage: credit_line_usage(line),
        available_amount,
        days_to_expiry: line
            .expiry_date
            .map(|expiry| (expiry - ctx.today).num_days()),
        alert_level: alert_level(line.expiry_date, ctx),
    }
}

/// Occurrence counts of contact identities and e-mails inside one batch.
#[derive(Debug, Default)]
struct ContactIndex {
    identities: BTreeMap<String, usize>,
    emails: BTreeMap<String, usize>,
}

impl ContactIndex {
    fn build<'a>(contacts: impl Iterator<Item = &'a Contact>) -> Self {
        let mut index = Self::default();
        for contact in contacts {
            if let Some(identity) = contact.identity() {
                *index.identities.entry(identity).or_default() += 1;
            }
            if let Some(email) = contact.email.as_deref().map(identity_key) {
                *index.emails.entry(email).or_default() += 1;
            }
        }
        index
    }

    fn derive(&self, record: &CanonicalRecord, ctx: &DeriveContext) -> ContactDerived {
        let Some(contact) = record.as_contact() else {
            return ContactDerived::default();
        };
        let seen_twice = |map: &BTreeMap<String, usize>, key: Option<String>| {
            key.and_then(|key| map.get(&key).copied()).unwrap_or(0) > 1
        };
        let missing_fields: Vec<String> = ctx
            .completeness_fields
            .iter()
            .filter(|field| record.field(field).is_missing())
            .cloned()
            .collect();
        ContactDerived {
            duplicate_flag: seen_twice(&self.identities, contact.identity()),
            duplicate_email_flag: seen_twice(
                &self.emails,
                contact.email.as_deref().map(identity_key),
            ),
            missing_field_flag: !missing_fields.is_empty(),
            missing_fields,
        }
    }
}

/// Computes derived fields for one batch (the rows of one source file).
///
/// Invalid rows pass through with `derived = None`. Contact duplicate flags look only at
/// other rows of the same batch.
pub fn derive_batch(rows: Vec<ValidatedRow>, ctx: &DeriveContext) -> Vec<ProcessedRecord> {
    let contacts = ContactIndex::build(rows.iter().filter_map(|row| row.record.as_contact()));
    rows.into_iter()
        .map(|row| {
            let derived = row.is_valid().then(|| match &row.record {
                CanonicalRecord::CreditLine(line) => {
                    DerivedFields::CreditLine(derive_credit_line(line, ctx))
                }
                CanonicalRecord::Disbursement(_) => DerivedFields::Disbursement,
                CanonicalRecord::DocumentStatus(_) => DerivedFields::DocumentStatus,
                CanonicalRecord::Contact(_) => {
                    DerivedFields::Contact(contacts.derive(&row.record, ctx))
                }
            });
            ProcessedRecord {
                key: RecordKey::for_record(&row.record, &row.source.name, row.row),
                source: row.source,
                row: row.row,
                record: row.record,
                issues: row.issues,
                derived,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DeriveContext {
        DeriveContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            lookahead_days: 30,
            completeness_fields: vec!["email".to_string(), "phone".to_string()],
        }
    }

    fn line(limit: Option<i64>, balance: Option<i64>, expiry: Option<NaiveDate>) -> CreditLine {
        CreditLine {
            id: Some("L1".to_string()),
            counterparty: Some("BANCO".to_string()),
            line_type: None,
            limit_amount: limit.map(Decimal::from),
            balance_amount: balance.map(Decimal::from),
            expiry_date: expiry,
        }
    }

    #[test]
    fn usage_is_undefined_without_a_limit() {
        assert_eq!(credit_line_usage(&line(Some(0), Some(10), None)), Usage::Undefined);
        assert_eq!(credit_line_usage(&line(None, Some(10), None)), Usage::Undefined);
        assert_eq!(
            credit_line_usage(&line(Some(200), Some(50), None)),
            Usage::Ratio(Decimal::new(25, 2))
        );
    }

    #[test]
    fn alert_levels_follow_the_lookahead_window() {
        let today = ctx().today;
        let at = |days: i64| {
            let expiry = today + chrono::Duration::days(days);
            derive_credit_line(&line(Some(1), Some(0), Some(expiry)), &ctx()).alert_level
        };
        assert_eq!(at(-1), AlertLevel::Overdue);
        assert_eq!(at(0), AlertLevel::Upcoming);
        assert_eq!(at(30), AlertLevel::Upcoming);
        assert_eq!(at(31), AlertLevel::None);
    }

    #[test]
    fn available_and_days_to_expiry() {
        let expiry = NaiveDate::from_ymd_opt(2024, 6, 11);
        let derived = derive_credit_line(&line(Some(1000), Some(400), expiry), &ctx());
        assert_eq!(derived.available_amount, Some(Decimal::from(600)));
        assert_eq!(derived.days_to_expiry, Some(10));
    }
}
