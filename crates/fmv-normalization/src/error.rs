use fmv_model::FieldKind;
use thiserror::Error;

/// A non-empty cell that could not be read as its field kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot parse '{value}' as {}", .kind.as_str())]
pub struct CoercionError {
    pub value: String,
    pub kind: FieldKind,
}

impl CoercionError {
    pub fn new(value: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }
}
