//! Fields computed from a valid canonical record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Credit line utilization (balance / limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Usage {
    Ratio(Decimal),
    /// Limit is zero or missing.
    Undefined,
}

impl Usage {
    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            Usage::Ratio(value) => Some(*value),
            Usage::Undefined => None,
        }
    }

    /// Ratio as a percentage rounded to two decimals; `None` if it leaves the decimal range.
    pub fn percent(&self) -> Option<Decimal> {
        self.ratio()
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|percent| percent.round_dp(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    None,
    Upcoming,
    Overdue,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::Upcoming => "upcoming",
            AlertLevel::Overdue => "overdue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLineDerived {
    pub usage: Usage,
    pub available_amount: Option<Decimal>,
    /// Negative once the line has expired.
    pub days_to_expiry: Option<i64>,
    pub alert_level: AlertLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDerived {
    pub duplicate_flag: bool,
    pub duplicate_email_flag: bool,
    pub missing_field_flag: bool,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "snake_case")]
pub enum DerivedFields {
    CreditLine(CreditLineDerived),
    Disbursement,
    DocumentStatus,
    Contact(ContactDerived),
}

impl DerivedFields {
    pub fn as_credit_line(&self) -> Option<&CreditLineDerived> {
        match self {
            DerivedFields::CreditLine(derived) => Some(derived),
            _ => None,
        }
    }

    pub fn as_contact(&self) -> Option<&ContactDerived> {
        match self {
            DerivedFields::Contact(derived) => Some(derived),
            _ => None,
        }
    }
}
