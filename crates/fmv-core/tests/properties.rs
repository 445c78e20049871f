//! Property tests for derivation and consolidation.

use chrono::NaiveDate;
use fmv_core::{DeriveContext, ValidatedRow, consolidate, derive_batch, normalize_table, reconsolidate};
use fmv_core::derive::credit_line_usage;
use fmv_model::{
    CanonicalRecord, CreditLine, Domain, EngineConfig, RawTable, SourceFile, Usage,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn ctx() -> DeriveContext {
    DeriveContext {
        today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        lookahead_days: 30,
        completeness_fields: vec!["email".to_string(), "phone".to_string()],
    }
}

fn line_row(file: &SourceFile, row: usize, id: u8, balance: i64) -> ValidatedRow {
    ValidatedRow {
        source: file.clone(),
        row,
        record: CanonicalRecord::CreditLine(CreditLine {
            id: Some(format!("L{id}")),
            counterparty: Some("BANCO".to_string()),
            line_type: None,
            limit_amount: Some(Decimal::from(1000)),
            balance_amount: Some(Decimal::from(balance)),
            expiry_date: NaiveDate::from_ymd_opt(2024, 7, 1),
        }),
        issues: vec![],
    }
}

proptest! {
    #[test]
    fn usage_stays_within_bounds(limit in 1i64..10_000_000, share in 0u32..=100) {
        let balance = limit * i64::from(share) / 100;
        let line = CreditLine {
            limit_amount: Some(Decimal::from(limit)),
            balance_amount: Some(Decimal::from(balance)),
            ..CreditLine::default()
        };
        let ratio = credit_line_usage(&line).ratio().unwrap();
        prop_assert!(ratio >= Decimal::ZERO);
        prop_assert!(ratio <= Decimal::ONE);
    }

    #[test]
    fn zero_limit_has_undefined_usage(balance in 0i64..1_000_000) {
        let line = CreditLine {
            limit_amount: Some(Decimal::ZERO),
            balance_amount: Some(Decimal::from(balance)),
            ..CreditLine::default()
        };
        prop_assert_eq!(credit_line_usage(&line), Usage::Undefined);
    }

    #[test]
    fn consolidation_is_idempotent(
        rows in prop::collection::vec((0usize..3, 0u8..5, 0i64..1000), 0..30)
    ) {
        let files = [
            SourceFile::new("a.csv", NaiveDate::from_ymd_opt(2024, 1, 1), 0),
            SourceFile::new("b.csv", None, 1),
            SourceFile::new("c.csv", NaiveDate::from_ymd_opt(2024, 1, 1), 2),
        ];
        let validated: Vec<ValidatedRow> = rows
            .iter()
            .enumerate()
            .map(|(row, (file, id, balance))| line_row(&files[*file], row + 1, *id, *balance))
            .collect();
        let once = consolidate(Domain::CreditLine, derive_batch(validated, &ctx())).unwrap();
        let twice = consolidate(Domain::CreditLine, once.records.clone()).unwrap();
        prop_assert_eq!(&twice.records, &once.records);
        prop_assert!(twice.merge_notes.is_empty());
        prop_assert_eq!(reconsolidate(once.clone()).unwrap(), once);
    }

    #[test]
    fn derivation_is_deterministic(balances in prop::collection::vec(0i64..2000, 0..20)) {
        let file = SourceFile::new("a.csv", None, 0);
        let rows: Vec<ValidatedRow> = balances
            .iter()
            .enumerate()
            .map(|(row, balance)| line_row(&file, row + 1, 1, *balance))
            .collect();
        prop_assert_eq!(derive_batch(rows.clone(), &ctx()), derive_batch(rows, &ctx()));
    }

    #[test]
    fn well_formed_rows_normalize_cleanly(
        id in "[A-Z]{2}-[0-9]{1,4}",
        limit in 0u32..1_000_000,
        balance in 0u32..1_000_000,
        days in 0u32..3650,
    ) {
        let expiry = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            + chrono::Duration::days(i64::from(days));
        let expiry = expiry.format("%Y-%m-%d").to_string();
        let limit = limit.to_string();
        let balance = balance.to_string();
        let headers = ["id", "entidad", "monto", "utilizado", "vigencia"];
        let mut table = RawTable::new(
            SourceFile::new("lineas.csv", None, 0),
            headers.iter().map(|h| h.to_string()).collect(),
        );
        table.push_text_row(headers.iter().copied().zip([
            id.as_str(),
            "Banco Sol",
            limit.as_str(),
            balance.as_str(),
            expiry.as_str(),
        ]));
        let normalized = normalize_table(&table, Domain::CreditLine, &EngineConfig::default())
            .unwrap();
        prop_assert!(normalized.rows[0].coercion_issues.is_empty());
    }
}
