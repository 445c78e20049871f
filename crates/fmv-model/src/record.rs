//! Canonical domain records and their keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::ModelError;
use crate::text::identity_key;

/// Workflow state of a SPLAFT document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    Pending,
    Received,
    Observed,
    Approved,
}

impl DocumentState {
    pub const ALL: [DocumentState; 4] = [
        DocumentState::Pending,
        DocumentState::Received,
        DocumentState::Observed,
        DocumentState::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Pending => "pending",
            DocumentState::Received => "received",
            DocumentState::Observed => "observed",
            DocumentState::Approved => "approved",
        }
    }

    /// Pending and observed documents need follow-up.
    pub fn needs_attention(&self) -> bool {
        matches!(self, DocumentState::Pending | DocumentState::Observed)
    }
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        DocumentState::ALL
            .into_iter()
            .find(|state| state.as_str() == key)
            .ok_or_else(|| ModelError::UnknownStatus(s.to_string()))
    }
}

/// A coerced cell value, keyed by canonical field name in a [`FieldMap`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    Text(String),
    Amount(Decimal),
    Date(NaiveDate),
    /// A status cell: the resolved state (if any alias matched) and the cleaned source text.
    Status {
        state: Option<DocumentState>,
        raw: String,
    },
    #[default]
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Status { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            FieldValue::Amount(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(date) => Some(*date),
            _ => None,
        }
    }
}

fn text_value(value: Option<&String>) -> FieldValue {
    value.map_or(FieldValue::Missing, |text| FieldValue::Text(text.clone()))
}

fn amount_value(value: Option<Decimal>) -> FieldValue {
    value.map_or(FieldValue::Missing, FieldValue::Amount)
}

fn date_value(value: Option<NaiveDate>) -> FieldValue {
    value.map_or(FieldValue::Missing, FieldValue::Date)
}

/// Canonical field name to coerced value.
pub type FieldMap = BTreeMap<&'static str, FieldValue>;

fn take_text(fields: &FieldMap, name: &str) -> Option<String> {
    fields.get(name).and_then(FieldValue::as_text).map(str::to_string)
}

fn take_amount(fields: &FieldMap, name: &str) -> Option<Decimal> {
    fields.get(name).and_then(FieldValue::as_amount)
}

fn take_date(fields: &FieldMap, name: &str) -> Option<NaiveDate> {
    fields.get(name).and_then(FieldValue::as_date)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreditLine {
    pub id: Option<String>,
    pub counterparty: Option<String>,
    pub line_type: Option<String>,
    pub limit_amount: Option<Decimal>,
    pub balance_amount: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Disbursement {
    pub reference: Option<String>,
    pub institution: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentStatus {
    pub counterparty: Option<String>,
    pub document: Option<String>,
    pub status: Option<DocumentState>,
    /// Source status text as found, kept for unknown statuses.
    pub status_raw: Option<String>,
    pub updated_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    pub institution: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub updated_at: Option<NaiveDate>,
}

impl Contact {
    /// Normalized name + institution used to spot the same person twice.
    pub fn identity(&self) -> Option<String> {
        let name = self.name.as_deref().map(identity_key)?;
        let institution = self.institution.as_deref().map(identity_key)?;
        Some(format!("{name}|{institution}"))
    }
}

/// A source row after schema normalization. Missing or uncoercible fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum CanonicalRecord {
    CreditLine(CreditLine),
    Disbursement(Disbursement),
    DocumentStatus(DocumentStatus),
    Contact(Contact),
}

impl CanonicalRecord {
    /// Builds the domain record from coerced fields. Unknown names are ignored.
    pub fn from_fields(domain: Domain, fields: &FieldMap) -> Self {
        match domain {
            Domain::CreditLine => CanonicalRecord::CreditLine(CreditLine {
                id: take_text(fields, "id"),
                counterparty: take_text(fields, "counterparty"),
                line_type: take_text(fields, "line_type"),
                limit_amount: take_amount(fields, "limit_amount"),
                balance_amount: take_amount(fields, "balance_amount"),
                expiry_date: take_date(fields, "expiry_date"),
            }),
            Domain::Disbursement => CanonicalRecord::Disbursement(Disbursement {
                reference: take_text(fields, "reference"),
                institution: take_text(fields, "institution"),
                date: take_date(fields, "date"),
                amount: take_amount(fields, "amount"),
            }),
            Domain::DocumentStatus => {
                let (status, status_raw) = match fields.get("status") {
                    Some(FieldValue::Status { state, raw }) => (*state, Some(raw.clone())),
                    Some(FieldValue::Text(raw)) => (raw.parse().ok(), Some(raw.clone())),
                    _ => (None, None),
                };
                CanonicalRecord::DocumentStatus(DocumentStatus {
                    counterparty: take_text(fields, "counterparty"),
                    document: take_text(fields, "document"),
                    status,
                    status_raw,
                    updated_at: take_date(fields, "updated_at"),
                })
            }
            Domain::Contact => CanonicalRecord::Contact(Contact {
                institution: take_text(fields, "institution"),
                name: take_text(fields, "name"),
                role: take_text(fields, "role"),
                email: take_text(fields, "email"),
                phone: take_text(fields, "phone"),
                updated_at: take_date(fields, "updated_at"),
            }),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            CanonicalRecord::CreditLine(_) => Domain::CreditLine,
            CanonicalRecord::Disbursement(_) => Domain::Disbursement,
            CanonicalRecord::DocumentStatus(_) => Domain::DocumentStatus,
            CanonicalRecord::Contact(_) => Domain::Contact,
        }
    }

    /// Reads a canonical field back as a [`FieldValue`].
    pub fn field(&self, name: &str) -> FieldValue {
        match self {
            CanonicalRecord::CreditLine(line) => match name {
                "id" => text_value(line.id.as_ref()),
                "counterparty" => text_value(line.counterparty.as_ref()),
                "line_type" => text_value(line.line_type.as_ref()),
                "limit_amount" => amount_value(line.limit_amount),
                "balance_amount" => amount_value(line.balance_amount),
                "expiry_date" => date_value(line.expiry_date),
                _ => FieldValue::Missing,
            },
            CanonicalRecord::Disbursement(item) => match name {
                "reference" => text_value(item.reference.as_ref()),
                "institution" => text_value(item.institution.as_ref()),
                "date" => date_value(item.date),
                "amount" => amount_value(item.amount),
                _ => FieldValue::Missing,
            },
            CanonicalRecord::DocumentStatus(doc) => match name {
                "counterparty" => text_value(doc.counterparty.as_ref()),
                "document" => text_value(doc.document.as_ref()),
                "status" => match &doc.status_raw {
                    Some(raw) => FieldValue::Status {
                        state: doc.status,
                        raw: raw.clone(),
                    },
                    None => FieldValue::Missing,
                },
                "updated_at" => date_value(doc.updated_at),
                _ => FieldValue::Missing,
            },
            CanonicalRecord::Contact(contact) => match name {
                "institution" => text_value(contact.institution.as_ref()),
                "name" => text_value(contact.name.as_ref()),
                "role" => text_value(contact.role.as_ref()),
                "email" => text_value(contact.email.as_ref()),
                "phone" => text_value(contact.phone.as_ref()),
                "updated_at" => date_value(contact.updated_at),
                _ => FieldValue::Missing,
            },
        }
    }

    /// Renders a field for export: amounts normalized, dates as `YYYY-MM-DD`.
    pub fn render_field(&self, name: &str) -> Option<String> {
        match self.field(name) {
            FieldValue::Text(text) => Some(text),
            FieldValue::Amount(value) => Some(value.normalize().to_string()),
            FieldValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
            FieldValue::Status { state, raw } => {
                Some(state.map_or(raw, |state| state.as_str().to_string()))
            }
            FieldValue::Missing => None,
        }
    }

    /// The natural key, or `None` when an identifying component is empty.
    pub fn natural_key(&self) -> Option<String> {
        match self {
            CanonicalRecord::CreditLine(line) => {
                line.id.as_deref().map(|id| id.trim().to_uppercase())
            }
            CanonicalRecord::Disbursement(item) => {
                let institution = item.institution.as_deref().map(identity_key)?;
                let date = item.date?;
                let reference = item
                    .reference
                    .as_deref()
                    .map(identity_key)
                    .unwrap_or_default();
                Some(format!("{institution}|{date}|{reference}"))
            }
            CanonicalRecord::DocumentStatus(doc) => {
                let counterparty = doc.counterparty.as_deref().map(identity_key)?;
                let document = doc.document.as_deref().map(identity_key)?;
                Some(format!("{counterparty}|{document}"))
            }
            CanonicalRecord::Contact(contact) => contact.identity(),
        }
    }

    pub fn as_credit_line(&self) -> Option<&CreditLine> {
        match self {
            CanonicalRecord::CreditLine(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_disbursement(&self) -> Option<&Disbursement> {
        match self {
            CanonicalRecord::Disbursement(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_document_status(&self) -> Option<&DocumentStatus> {
        match self {
            CanonicalRecord::DocumentStatus(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_contact(&self) -> Option<&Contact> {
        match self {
            CanonicalRecord::Contact(contact) => Some(contact),
            _ => None,
        }
    }
}

/// Grouping key for consolidation.
///
/// Natural keys sort before unkeyed records; unkeyed records keep their source position
/// so they stay visible instead of being merged together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKey {
    Natural(String),
    Unkeyed { source: String, row: usize },
}

impl RecordKey {
    pub fn for_record(record: &CanonicalRecord, source: &str, row: usize) -> Self {
        match record.natural_key() {
            Some(key) => RecordKey::Natural(key),
            None => RecordKey::Unkeyed {
                source: source.to_string(),
                row,
            },
        }
    }

    pub fn is_natural(&self) -> bool {
        matches!(self, RecordKey::Natural(_))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Natural(key) => f.write_str(key),
            RecordKey::Unkeyed { source, row } => write!(f, "{source}#{row} (unkeyed)"),
        }
    }
}
