use std::sync::LazyLock;

use chrono::{Months, NaiveDate};
use fmv_model::{CanonicalRecord, FieldValue, RecordRef, Severity, ValidationIssue};
use regex::Regex;
use rust_decimal::Decimal;

use crate::rules::{Rule, RuleSet};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").ok());

/// Run-level inputs the rules depend on. `today` is never read from the clock here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub today: NaiveDate,
    pub far_future_years: u32,
}

impl ValidationContext {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            far_future_years: 30,
        }
    }

    pub fn with_far_future_years(mut self, years: u32) -> Self {
        self.far_future_years = years;
        self
    }

    fn horizon(&self) -> NaiveDate {
        self.today
            .checked_add_months(Months::new(self.far_future_years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// A record with every issue found for it, coercion issues first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub record: CanonicalRecord,
    pub issues: Vec<ValidationIssue>,
}

impl ValidatedRecord {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }
}

/// Runs every rule of `rules` against `record`.
///
/// A `Required` rule stays silent for a field that already has a coercion issue, so an
/// unparseable cell is reported once.
pub fn validate(
    record: CanonicalRecord,
    record_ref: &RecordRef,
    coercion_issues: Vec<ValidationIssue>,
    rules: &RuleSet,
    ctx: &ValidationContext,
) -> ValidatedRecord {
    let mut issues = coercion_issues;
    let coerced_fields: Vec<String> = issues.iter().map(|issue| issue.field.clone()).collect();
    for rule in &rules.rules {
        if matches!(rule, Rule::Required { .. })
            && coerced_fields.iter().any(|field| field == rule.field())
        {
            continue;
        }
        if let Some(message) = check(rule, &record, ctx) {
            issues.push(ValidationIssue {
                record: record_ref.clone(),
                field: rule.field().to_string(),
                severity: rule.severity(),
                message,
            });
        }
    }
    ValidatedRecord { record, issues }
}

fn check(rule: &Rule, record: &CanonicalRecord, ctx: &ValidationContext) -> Option<String> {
    match rule {
        Rule::Required { field, severity } => {
            record.field(field).is_missing().then(|| match severity {
                Severity::Error => "identifying field is empty".to_string(),
                Severity::Warning => "required field is empty".to_string(),
            })
        }
        Rule::NotNegative { field } => {
            let amount = record.field(field).as_amount()?;
            (amount < Decimal::ZERO).then(|| format!("amount {amount} is negative"))
        }
        Rule::NotGreaterThan { field, bound } => {
            let value = record.field(field).as_amount()?;
            let limit = record.field(bound).as_amount()?;
            (value > limit).then(|| format!("{field} {value} exceeds {bound} {limit}"))
        }
        Rule::DateNotFarFuture { field } => {
            let date = record.field(field).as_date()?;
            (date > ctx.horizon()).then(|| {
                format!(
                    "date {date} is more than {} years ahead",
                    ctx.far_future_years
                )
            })
        }
        Rule::DateNotInFuture { field } => {
            let date = record.field(field).as_date()?;
            (date > ctx.today).then(|| format!("date {date} is after {}", ctx.today))
        }
        Rule::OneOf { field, allowed } => match record.field(field) {
            FieldValue::Status { state, raw } => {
                let known = state.is_some_and(|state| allowed.contains(&state));
                (!known).then(|| format!("unknown status '{raw}'"))
            }
            _ => None,
        },
        Rule::EmailFormat { field } => {
            let value = record.field(field);
            let email = value.as_text()?;
            let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email));
            (!valid).then(|| format!("malformed e-mail '{email}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use fmv_model::{Contact, CreditLine, Domain, EngineConfig};

    use super::*;

    fn ctx() -> ValidationContext {
        ValidationContext::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    #[test]
    fn email_pattern() {
        let rules = RuleSet::for_domain(Domain::Contact, &EngineConfig::default());
        let record = CanonicalRecord::Contact(Contact {
            institution: Some("IFI".to_string()),
            name: Some("Ana".to_string()),
            email: Some("ana.at.ifi".to_string()),
            ..Contact::default()
        });
        let validated = validate(record, &RecordRef::new("c.csv", 1), vec![], &rules, &ctx());
        assert!(validated.is_valid());
        assert_eq!(validated.issues.len(), 1);
        assert_eq!(validated.issues[0].message, "malformed e-mail 'ana.at.ifi'");
    }

    #[test]
    fn far_future_horizon_is_configurable() {
        let rules = RuleSet::for_domain(Domain::CreditLine, &EngineConfig::default());
        let record = CanonicalRecord::CreditLine(CreditLine {
            id: Some("L1".to_string()),
            counterparty: Some("BANCO".to_string()),
            limit_amount: Some(Decimal::new(100, 0)),
            balance_amount: Some(Decimal::new(10, 0)),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..CreditLine::default()
        });
        let strict = ctx().with_far_future_years(5);
        let validated = validate(record.clone(), &RecordRef::new("l.csv", 1), vec![], &rules, &strict);
        assert_eq!(validated.issues.len(), 1);
        assert_eq!(validated.issues[0].field, "expiry_date");
        let relaxed = validate(record, &RecordRef::new("l.csv", 1), vec![], &rules, &ctx());
        assert!(relaxed.issues.is_empty());
    }
}
