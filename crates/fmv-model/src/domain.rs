//! Tracked domains and their canonical field catalogs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// How a canonical field is coerced from its source cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, whitespace collapsed.
    Text,
    /// Institution or counterparty name, upper-cased.
    Institution,
    /// Monetary amount (decimal).
    Amount,
    /// Calendar date.
    Date,
    /// Document workflow status, resolved through status aliases.
    Status,
    /// E-mail address, lower-cased.
    Email,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Institution => "institution",
            FieldKind::Amount => "amount",
            FieldKind::Date => "date",
            FieldKind::Status => "status",
            FieldKind::Email => "email",
        }
    }
}

/// A canonical field of a domain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
}

const fn field(name: &'static str, kind: FieldKind, label: &'static str) -> FieldSpec {
    FieldSpec { name, kind, label }
}

const CREDIT_LINE_FIELDS: &[FieldSpec] = &[
    field("id", FieldKind::Text, "Line identifier"),
    field("counterparty", FieldKind::Institution, "Counterparty (ESFS)"),
    field("line_type", FieldKind::Text, "Line type"),
    field("limit_amount", FieldKind::Amount, "Approved limit"),
    field("balance_amount", FieldKind::Amount, "Used balance"),
    field("expiry_date", FieldKind::Date, "Expiry date"),
];

/// Header-only field that supplies a canonical field when that field has no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandIn {
    pub spec: FieldSpec,
    /// The canonical field computed from this column.
    pub replaces: &'static str,
}

// Line sheets often carry the available balance instead of the used one;
// the used balance is then `limit_amount - available_balance`.
const CREDIT_LINE_STAND_INS: &[StandIn] = &[StandIn {
    spec: field("available_balance", FieldKind::Amount, "Available balance"),
    replaces: "balance_amount",
}];

const DISBURSEMENT_FIELDS: &[FieldSpec] = &[
    field("reference", FieldKind::Text, "Operation reference"),
    field("institution", FieldKind::Institution, "Institution (IFI)"),
    field("date", FieldKind::Date, "Disbursement date"),
    field("amount", FieldKind::Amount, "Disbursed amount"),
];

const DOCUMENT_STATUS_FIELDS: &[FieldSpec] = &[
    field("counterparty", FieldKind::Institution, "Counterparty (ESFS)"),
    field("document", FieldKind::Text, "Document"),
    field("status", FieldKind::Status, "Status"),
    field("updated_at", FieldKind::Date, "Last update"),
];

const CONTACT_FIELDS: &[FieldSpec] = &[
    field("institution", FieldKind::Institution, "Institution"),
    field("name", FieldKind::Text, "Contact name"),
    field("role", FieldKind::Text, "Role"),
    field("email", FieldKind::Email, "E-mail"),
    field("phone", FieldKind::Text, "Phone"),
    field("updated_at", FieldKind::Date, "Last update"),
];

/// A tracked data domain. Each domain has its own canonical record shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    CreditLine,
    Disbursement,
    DocumentStatus,
    Contact,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::CreditLine,
        Domain::Disbursement,
        Domain::DocumentStatus,
        Domain::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::CreditLine => "credit_line",
            Domain::Disbursement => "disbursement",
            Domain::DocumentStatus => "document_status",
            Domain::Contact => "contact",
        }
    }

    /// Human-readable description used in summaries.
    pub fn description(&self) -> &'static str {
        match self {
            Domain::CreditLine => "Credit lines (ESFS)",
            Domain::Disbursement => "Daily disbursements (IFI)",
            Domain::DocumentStatus => "SPLAFT document control",
            Domain::Contact => "ESFS/IFI contacts",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Domain::CreditLine => CREDIT_LINE_FIELDS,
            Domain::Disbursement => DISBURSEMENT_FIELDS,
            Domain::DocumentStatus => DOCUMENT_STATUS_FIELDS,
            Domain::Contact => CONTACT_FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn stand_ins(&self) -> &'static [StandIn] {
        match self {
            Domain::CreditLine => CREDIT_LINE_STAND_INS,
            Domain::Disbursement | Domain::DocumentStatus | Domain::Contact => &[],
        }
    }

    /// Stand-in columns able to supply `field`.
    pub fn stand_ins_for(&self, field: &str) -> impl Iterator<Item = &'static StandIn> {
        self.stand_ins()
            .iter()
            .filter(move |stand_in| stand_in.replaces == field)
    }

    /// Every field a source header can map to: canonical fields, then stand-ins.
    pub fn column_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields()
            .iter()
            .chain(self.stand_ins().iter().map(|stand_in| &stand_in.spec))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_fields().any(|spec| spec.name == name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Domain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownDomain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_names() {
        assert_eq!("credit_line".parse::<Domain>(), Ok(Domain::CreditLine));
        assert_eq!("Document-Status".parse::<Domain>(), Ok(Domain::DocumentStatus));
        assert!("ledger".parse::<Domain>().is_err());
    }

    #[test]
    fn field_catalog_lookup() {
        assert!(Domain::CreditLine.has_field("limit_amount"));
        assert!(!Domain::Contact.has_field("limit_amount"));
        assert_eq!(
            Domain::Contact.field("email").map(|spec| spec.kind),
            Some(FieldKind::Email)
        );
    }

    #[test]
    fn stand_ins_are_columns_but_not_fields() {
        assert!(Domain::CreditLine.has_column("available_balance"));
        assert!(!Domain::CreditLine.has_field("available_balance"));
        assert_eq!(
            Domain::CreditLine
                .stand_ins_for("balance_amount")
                .map(|stand_in| stand_in.spec.name)
                .collect::<Vec<_>>(),
            vec!["available_balance"]
        );
        assert_eq!(Domain::Contact.stand_ins_for("email").count(), 0);
    }
}
