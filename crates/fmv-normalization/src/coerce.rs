use fmv_model::{CellValue, EngineConfig, FieldKind, FieldValue};
use rust_decimal::prelude::ToPrimitive;

use crate::datetime::{excel_serial_to_date, parse_date};
use crate::error::CoercionError;
use crate::numeric::parse_amount;
use crate::text::{clean_text, normalize_email, normalize_institution};

/// Coerces a raw cell to the value type of a canonical field.
///
/// Empty cells become `FieldValue::Missing`. Status text that matches no alias is kept
/// as raw text with no resolved state.
pub fn coerce_cell(
    kind: FieldKind,
    cell: &CellValue,
    config: &EngineConfig,
) -> Result<FieldValue, CoercionError> {
    if cell.is_empty() {
        return Ok(FieldValue::Missing);
    }
    match kind {
        FieldKind::Text => Ok(FieldValue::Text(clean_text(&cell.render()))),
        FieldKind::Institution => Ok(FieldValue::Text(normalize_institution(&cell.render()))),
        FieldKind::Email => Ok(FieldValue::Text(normalize_email(&cell.render()))),
        FieldKind::Status => {
            let raw = clean_text(&cell.render());
            Ok(FieldValue::Status {
                state: config.resolve_status(&raw),
                raw,
            })
        }
        FieldKind::Amount => match cell {
            CellValue::Number(value) => Ok(FieldValue::Amount(*value)),
            CellValue::Text(text) => parse_amount(text)
                .map(FieldValue::Amount)
                .ok_or_else(|| CoercionError::new(text.trim(), kind)),
            other => Err(CoercionError::new(other.render(), kind)),
        },
        FieldKind::Date => match cell {
            CellValue::Date(date) => Ok(FieldValue::Date(*date)),
            CellValue::Number(value) => value
                .fract()
                .is_zero()
                .then(|| value.to_i64())
                .flatten()
                .and_then(excel_serial_to_date)
                .map(FieldValue::Date)
                .ok_or_else(|| CoercionError::new(value.to_string(), kind)),
            CellValue::Text(text) => parse_date(text, &config.date_formats)
                .map(FieldValue::Date)
                .ok_or_else(|| CoercionError::new(text.trim(), kind)),
            CellValue::Empty => Ok(FieldValue::Missing),
        },
    }
}
