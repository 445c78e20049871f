use fmv_model::{Domain, DocumentState, EngineConfig, FieldKind, Severity};
use serde::Serialize;

/// A single declarative check on a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Field must not be empty.
    Required {
        field: &'static str,
        severity: Severity,
    },
    NotNegative { field: &'static str },
    /// `field` must not exceed `bound` when both are present.
    NotGreaterThan {
        field: &'static str,
        bound: &'static str,
    },
    /// Dates beyond the configured horizon are likely typos.
    DateNotFarFuture { field: &'static str },
    /// Event dates cannot lie after the run date.
    DateNotInFuture { field: &'static str },
    OneOf {
        field: &'static str,
        allowed: Vec<DocumentState>,
    },
    EmailFormat { field: &'static str },
}

impl Rule {
    pub fn field(&self) -> &'static str {
        match self {
            Rule::Required { field, .. }
            | Rule::NotNegative { field }
            | Rule::NotGreaterThan { field, .. }
            | Rule::DateNotFarFuture { field }
            | Rule::DateNotInFuture { field }
            | Rule::OneOf { field, .. }
            | Rule::EmailFormat { field } => field,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Rule::Required { severity, .. } => *severity,
            _ => Severity::Warning,
        }
    }
}

/// Ordered rules for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub domain: Domain,
    pub rules: Vec<Rule>,
}

/// Dates that record something that already happened.
fn is_event_date(domain: Domain, field: &str) -> bool {
    matches!(
        (domain, field),
        (Domain::Disbursement, "date") | (_, "updated_at")
    )
}

impl RuleSet {
    pub fn for_domain(domain: Domain, config: &EngineConfig) -> Self {
        let domain_config = config.domain(domain);
        let mut rules = Vec::new();

        let catalog_name = |name: &String| domain.field(name).map(|spec| spec.name);
        for field in domain_config.identifying_fields.iter().filter_map(catalog_name) {
            rules.push(Rule::Required {
                field,
                severity: Severity::Error,
            });
        }
        for field in domain_config
            .required_fields
            .iter()
            .filter_map(catalog_name)
            .filter(|field| !domain_config.is_identifying(field))
        {
            rules.push(Rule::Required {
                field,
                severity: Severity::Warning,
            });
        }

        for spec in domain.fields() {
            match spec.kind {
                FieldKind::Amount => rules.push(Rule::NotNegative { field: spec.name }),
                FieldKind::Date => {
                    rules.push(Rule::DateNotFarFuture { field: spec.name });
                    if is_event_date(domain, spec.name) {
                        rules.push(Rule::DateNotInFuture { field: spec.name });
                    }
                }
                FieldKind::Status => rules.push(Rule::OneOf {
                    field: spec.name,
                    allowed: DocumentState::ALL.to_vec(),
                }),
                FieldKind::Email => rules.push(Rule::EmailFormat { field: spec.name }),
                FieldKind::Text | FieldKind::Institution => {}
            }
        }

        if domain == Domain::CreditLine {
            rules.push(Rule::NotGreaterThan {
                field: "balance_amount",
                bound: "limit_amount",
            });
        }

        Self { domain, rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_line_rules_in_declaration_order() {
        let rules = RuleSet::for_domain(Domain::CreditLine, &EngineConfig::default());
        let summary: Vec<(&str, &str)> = rules
            .rules
            .iter()
            .map(|rule| {
                let kind = match rule {
                    Rule::Required { severity: Severity::Error, .. } => "required!",
                    Rule::Required { .. } => "required",
                    Rule::NotNegative { .. } => "not_negative",
                    Rule::NotGreaterThan { .. } => "not_greater",
                    Rule::DateNotFarFuture { .. } => "far_future",
                    Rule::DateNotInFuture { .. } => "in_future",
                    Rule::OneOf { .. } => "one_of",
                    Rule::EmailFormat { .. } => "email",
                };
                (kind, rule.field())
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("required!", "id"),
                ("required!", "counterparty"),
                ("required", "limit_amount"),
                ("required", "balance_amount"),
                ("required", "expiry_date"),
                ("not_negative", "limit_amount"),
                ("not_negative", "balance_amount"),
                ("far_future", "expiry_date"),
                ("not_greater", "balance_amount"),
            ]
        );
    }

    #[test]
    fn event_dates_cannot_be_in_the_future() {
        let rules = RuleSet::for_domain(Domain::Contact, &EngineConfig::default());
        assert!(
            rules
                .rules
                .contains(&Rule::DateNotInFuture { field: "updated_at" })
        );
        assert!(rules.rules.contains(&Rule::EmailFormat { field: "email" }));
        let credit = RuleSet::for_domain(Domain::CreditLine, &EngineConfig::default());
        assert!(
            !credit
                .rules
                .iter()
                .any(|rule| matches!(rule, Rule::DateNotInFuture { .. }))
        );
    }
}
