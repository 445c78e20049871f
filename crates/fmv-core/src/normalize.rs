//! Raw rows to canonical records.

use fmv_map::{ColumnMapping, resolve_columns};
use fmv_model::{
    CanonicalRecord, Domain, EngineConfig, FieldMap, FieldValue, RawTable, RecordRef,
    SchemaError, SourceFile, StandIn, ValidationIssue,
};
use fmv_normalization::coerce_cell;

/// One source row as a canonical record, with the cells that failed coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub source: SourceFile,
    pub row: usize,
    pub record: CanonicalRecord,
    pub coercion_issues: Vec<ValidationIssue>,
}

impl NormalizedRow {
    pub fn record_ref(&self) -> RecordRef {
        RecordRef::new(self.source.name.clone(), self.row)
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub mapping: ColumnMapping,
    pub rows: Vec<NormalizedRow>,
}

/// Normalizes every row of `table` for `domain`.
///
/// Fails only when the header lacks a required column; cell problems become
/// error-severity issues on the row, in column order.
pub fn normalize_table(
    table: &RawTable,
    domain: Domain,
    config: &EngineConfig,
) -> Result<NormalizedTable, SchemaError> {
    let mapping = resolve_columns(
        &table.source.name,
        &table.headers,
        domain,
        config.domain(domain),
    )?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for raw in &table.rows {
        let record_ref = RecordRef::new(table.source.name.clone(), raw.row);
        let mut fields = FieldMap::new();
        let mut coercion_issues = Vec::new();
        let mut stand_ins = Vec::new();
        for spec in domain.fields() {
            let Some(header) = mapping.header_for(spec.name) else {
                fields.insert(spec.name, FieldValue::Missing);
                if let Some(stand_in) = mapping.stand_in_for(spec.name) {
                    stand_ins.push(stand_in);
                }
                continue;
            };
            match coerce_cell(spec.kind, raw.get(header), config) {
                Ok(value) => {
                    fields.insert(spec.name, value);
                }
                Err(err) => {
                    coercion_issues.push(ValidationIssue::error(
                        record_ref.clone(),
                        spec.name,
                        err.to_string(),
                    ));
                    fields.insert(spec.name, FieldValue::Missing);
                }
            }
        }
        // After the loop: stand-ins read other fields of the same row.
        for (stand_in, header) in stand_ins {
            match coerce_cell(stand_in.spec.kind, raw.get(header), config) {
                Ok(value) => {
                    let replaced = from_stand_in(stand_in, &value, &fields);
                    fields.insert(stand_in.replaces, replaced);
                }
                Err(err) => coercion_issues.push(ValidationIssue::error(
                    record_ref.clone(),
                    stand_in.replaces,
                    err.to_string(),
                )),
            }
        }
        rows.push(NormalizedRow {
            source: table.source.clone(),
            row: raw.row,
            record: CanonicalRecord::from_fields(domain, &fields),
            coercion_issues,
        });
    }

    Ok(NormalizedTable { mapping, rows })
}

/// Canonical value supplied by a stand-in column.
fn from_stand_in(stand_in: &StandIn, value: &FieldValue, fields: &FieldMap) -> FieldValue {
    match (stand_in.spec.name, value.as_amount()) {
        ("available_balance", Some(available)) => fields
            .get("limit_amount")
            .and_then(FieldValue::as_amount)
            .and_then(|limit| limit.checked_sub(available))
            .map_or(FieldValue::Missing, FieldValue::Amount),
        _ => FieldValue::Missing,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn coercion_failures_become_error_issues() {
        let config = EngineConfig::default();
        let mut table = RawTable::new(
            SourceFile::new("lineas.csv", None, 0),
            vec![
                "id".into(),
                "entidad".into(),
                "monto".into(),
                "utilizado".into(),
                "vigencia".into(),
            ],
        );
        table.push_text_row([
            ("id", "L1"),
            ("entidad", "banco  sol"),
            ("monto", "abc"),
            ("utilizado", "1.500"),
            ("vigencia", "31/12/2024"),
        ]);

        let normalized = normalize_table(&table, Domain::CreditLine, &config).unwrap();
        let row = &normalized.rows[0];
        assert_eq!(row.coercion_issues.len(), 1);
        assert_eq!(row.coercion_issues[0].field, "limit_amount");
        assert_eq!(
            row.coercion_issues[0].message,
            "cannot parse 'abc' as amount"
        );
        let line = row.record.as_credit_line().cloned().unwrap_or_default();
        assert_eq!(line.counterparty.as_deref(), Some("BANCO SOL"));
        assert_eq!(line.limit_amount, None);
        assert_eq!(line.balance_amount, Some(Decimal::new(1500, 0)));
    }

    #[test]
    fn available_balance_becomes_used_balance() {
        let config = EngineConfig::default();
        let headers = ["id", "esfs", "monto", "saldo", "vigencia"];
        let mut table = RawTable::new(
            SourceFile::new("lineas.csv", None, 0),
            headers.iter().map(|h| h.to_string()).collect(),
        );
        table.push_text_row(headers.iter().copied().zip(["L1", "Banco Sol", "1000", "900", ""]));
        table.push_text_row(headers.iter().copied().zip(["L2", "Banco Sol", "", "900", ""]));
        table.push_text_row(headers.iter().copied().zip(["L3", "Banco Sol", "1000", "n/a", ""]));

        let normalized = normalize_table(&table, Domain::CreditLine, &config).unwrap();
        let balance = |index: usize| {
            normalized.rows[index]
                .record
                .as_credit_line()
                .and_then(|line| line.balance_amount)
        };
        assert_eq!(balance(0), Some(Decimal::from(100)));
        assert_eq!(balance(1), None);
        assert!(normalized.rows[1].coercion_issues.is_empty());
        assert_eq!(balance(2), None);
        assert_eq!(normalized.rows[2].coercion_issues.len(), 1);
        assert_eq!(normalized.rows[2].coercion_issues[0].field, "balance_amount");
    }
}
