//! End-to-end runs of the domain pipeline over in-memory tables.

use chrono::{Duration, NaiveDate};
use fmv_core::{
    DomainInput, Engine, PipelineState, ProcessingContext, build_default_pipeline,
};
use fmv_model::{
    AlertLevel, Domain, EngineConfig, RawTable, RecordKey, Severity, SkippedFile, SourceFile,
};
use rust_decimal::Decimal;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn credit_lines(source: SourceFile, rows: &[[&str; 5]]) -> RawTable {
    let headers = ["id", "entidad", "monto", "utilizado", "vigencia"];
    let mut table = RawTable::new(source, headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push_text_row(headers.iter().copied().zip(row.iter().copied()));
    }
    table
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default(), today())
}

#[test]
fn upcoming_line_within_lookahead() {
    let expiry = iso(today() + Duration::days(10));
    let table = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[["L-1", "Banco Sol", "1000", "900", expiry.as_str()]],
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    let record = &outcome.set.records[0];
    assert!(record.issues.is_empty());
    let derived = record.derived.as_ref().and_then(|d| d.as_credit_line()).unwrap();
    assert_eq!(derived.usage.ratio(), Some(Decimal::new(9, 1)));
    assert_eq!(derived.alert_level, AlertLevel::Upcoming);
    assert_eq!(derived.days_to_expiry, Some(10));
}

#[test]
fn over_limit_line_is_flagged_and_overdue() {
    let expiry = iso(today() - Duration::days(1));
    let table = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[["L-2", "Banco Sol", "1000", "1200", expiry.as_str()]],
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    let record = &outcome.set.records[0];
    assert!(record.is_valid());
    assert_eq!(record.issues.len(), 1);
    assert_eq!(record.issues[0].severity, Severity::Warning);
    assert_eq!(record.issues[0].field, "balance_amount");
    let derived = record.derived.as_ref().and_then(|d| d.as_credit_line()).unwrap();
    assert_eq!(derived.usage.ratio(), Some(Decimal::new(12, 1)));
    assert_eq!(derived.alert_level, AlertLevel::Overdue);
    assert_eq!(derived.available_amount, Some(Decimal::from(-200)));
}

fn duplicated_contacts() -> RawTable {
    let mut table = RawTable::new(
        SourceFile::new("contactos.csv", None, 0),
        vec![
            "Institución".into(),
            "Nombre".into(),
            "Correo".into(),
            "Teléfono".into(),
        ],
    );
    table.push_text_row([
        ("Institución", "IFI Norte"),
        ("Nombre", "Ana Pérez"),
        ("Correo", "ana@ifi.bo"),
        ("Teléfono", "77700011"),
    ]);
    table.push_text_row([
        ("Institución", "ifi  norte"),
        ("Nombre", "ANA PEREZ"),
        ("Correo", "ANA@ifi.bo"),
        ("Teléfono", ""),
    ]);
    table.push_text_row([
        ("Institución", "IFI Sur"),
        ("Nombre", "Luis Rojas"),
        ("Correo", ""),
        ("Teléfono", "70000000"),
    ]);
    table
}

#[test]
fn same_file_contacts_share_duplicate_flag() {
    let table = duplicated_contacts();
    let config = EngineConfig::default();
    let ctx = ProcessingContext::new(&config, today());
    let pipeline = build_default_pipeline().remove_step("consolidate");
    let mut state = PipelineState::new(vec![table]);
    pipeline
        .execute_with_state(Domain::Contact, &ctx, &mut state)
        .unwrap();

    let flags: Vec<_> = state
        .processed
        .iter()
        .map(|record| record.derived.as_ref().and_then(|d| d.as_contact()).cloned().unwrap())
        .collect();
    assert!(flags[0].duplicate_flag && flags[1].duplicate_flag);
    assert!(flags[0].duplicate_email_flag && flags[1].duplicate_email_flag);
    assert!(!flags[2].duplicate_flag);
    assert_eq!(flags[1].missing_fields, vec!["phone".to_string()]);
    assert_eq!(flags[2].missing_fields, vec!["email".to_string()]);
    assert_eq!(state.executed_steps, vec!["normalize", "validate", "derive"]);
}

#[test]
fn duplicate_contacts_collapse_but_keep_their_flag() {
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::Contact, vec![duplicated_contacts()]))
        .unwrap();

    assert_eq!(outcome.set.len(), 2);
    assert_eq!(outcome.set.merge_notes.len(), 1);
    let note = &outcome.set.merge_notes[0];
    assert_eq!(note.winner.source, "contactos.csv");
    assert_eq!(note.winner.row, 2);
    assert_eq!(note.losers.len(), 1);
    assert_eq!(note.losers[0].row, 1);

    let survivor = outcome.set.get(&note.key).unwrap();
    assert_eq!(survivor.row, 2);
    let flags = survivor.derived.as_ref().and_then(|d| d.as_contact()).unwrap();
    assert!(flags.duplicate_flag);
    assert!(flags.duplicate_email_flag);

    let single = outcome
        .set
        .records
        .iter()
        .find(|record| record.key != note.key)
        .unwrap();
    let flags = single.derived.as_ref().and_then(|d| d.as_contact()).unwrap();
    assert!(!flags.duplicate_flag);
}

#[test]
fn available_balance_layout_derives_the_used_balance() {
    let headers = [
        "id_linea",
        "esfs",
        "tipo_linea",
        "monto_aprobado",
        "saldo_disponible",
        "fecha_vigencia",
    ];
    let expiry = iso(today() + Duration::days(90));
    let mut table = RawTable::new(
        SourceFile::new("lineas.csv", None, 0),
        headers.iter().map(|h| h.to_string()).collect(),
    );
    table.push_text_row(headers.iter().copied().zip([
        "L-1",
        "Banco Sol",
        "Capital de trabajo",
        "1000",
        "900",
        expiry.as_str(),
    ]));
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    assert!(outcome.skipped_files.is_empty());
    let record = &outcome.set.records[0];
    assert!(record.issues.is_empty());
    let line = record.record.as_credit_line().unwrap();
    assert_eq!(line.balance_amount, Some(Decimal::from(100)));
    let derived = record.derived.as_ref().and_then(|d| d.as_credit_line()).unwrap();
    assert_eq!(derived.usage.ratio(), Some(Decimal::new(1, 1)));
    assert_eq!(derived.available_amount, Some(Decimal::from(900)));
}

#[test]
fn saldo_header_reads_as_available_balance() {
    let headers = ["id", "entidad", "monto", "saldo", "vigencia"];
    let mut table = RawTable::new(
        SourceFile::new("lineas.csv", None, 0),
        headers.iter().map(|h| h.to_string()).collect(),
    );
    table.push_text_row(
        headers
            .iter()
            .copied()
            .zip(["L-1", "Banco Sol", "1000", "900", "2025-01-01"]),
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    let derived = outcome.set.records[0]
        .derived
        .as_ref()
        .and_then(|d| d.as_credit_line())
        .unwrap();
    assert_eq!(derived.usage.ratio(), Some(Decimal::new(1, 1)));
}

#[test]
fn later_as_of_file_wins_the_merge() {
    let expiry = "2025-12-31";
    let january = credit_lines(
        SourceFile::new("lineas_2024-01-01.csv", NaiveDate::from_ymd_opt(2024, 1, 1), 1),
        &[["L-9", "Banco Sol", "1000", "500", expiry]],
    );
    let february = credit_lines(
        SourceFile::new("lineas_2024-02-01.csv", NaiveDate::from_ymd_opt(2024, 2, 1), 0),
        &[["l-9", "Banco Sol", "1000", "400", expiry]],
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![january, february]))
        .unwrap();

    assert_eq!(outcome.set.len(), 1);
    let record = outcome
        .set
        .get(&RecordKey::Natural("L-9".to_string()))
        .unwrap();
    let line = record.record.as_credit_line().unwrap();
    assert_eq!(line.balance_amount, Some(Decimal::from(400)));
    assert_eq!(outcome.set.merge_notes.len(), 1);
    let note = &outcome.set.merge_notes[0];
    assert_eq!(note.winner.source, "lineas_2024-02-01.csv");
    assert_eq!(note.losers.len(), 1);
    assert_eq!(note.losers[0].source, "lineas_2024-01-01.csv");
}

#[test]
fn uncoercible_amount_is_an_error_and_skips_derivation() {
    let table = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[["L-3", "Banco Sol", "mil", "100", "2025-01-01"]],
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    let record = &outcome.set.records[0];
    assert!(!record.is_valid());
    assert!(record.derived.is_none());
    assert_eq!(record.issues[0].message, "cannot parse 'mil' as amount");
    // No second "required field is empty" issue for the same cell.
    assert_eq!(
        record
            .issues
            .iter()
            .filter(|issue| issue.field == "limit_amount")
            .count(),
        1
    );
}

#[test]
fn file_without_required_columns_is_skipped() {
    let good = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[["L-1", "Banco Sol", "1000", "100", "2025-01-01"]],
    );
    let mut bad = RawTable::new(
        SourceFile::new("lineas_viejas.csv", None, 1),
        vec!["id".into(), "saldo".into()],
    );
    bad.push_text_row([("id", "L-2"), ("saldo", "5")]);
    let upstream = SkippedFile {
        file: "lineas_rotas.csv".to_string(),
        reason: "empty file".to_string(),
    };

    let outcome = engine()
        .process_domain(
            DomainInput::new(Domain::CreditLine, vec![good, bad]).with_skipped(vec![upstream]),
        )
        .unwrap();

    assert_eq!(outcome.set.len(), 1);
    assert_eq!(outcome.skipped_files.len(), 2);
    assert_eq!(outcome.skipped_files[0].file, "lineas_rotas.csv");
    assert_eq!(outcome.skipped_files[1].file, "lineas_viejas.csv");
    assert!(outcome.skipped_files[1].reason.contains("counterparty"));
    assert!(outcome.has_problems());
}

#[test]
fn rows_without_identifying_fields_stay_visible() {
    let table = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[
            ["", "Banco Sol", "1000", "100", "2025-01-01"],
            ["", "Banco Sol", "1000", "100", "2025-01-01"],
        ],
    );
    let outcome = engine()
        .process_domain(DomainInput::new(Domain::CreditLine, vec![table]))
        .unwrap();

    assert_eq!(outcome.set.len(), 2);
    assert!(outcome.set.merge_notes.is_empty());
    assert_eq!(outcome.set.invalid_count(), 2);
    assert!(outcome.set.records.iter().all(|r| !r.key.is_natural()));
}

#[test]
fn run_keeps_every_domain() {
    let lines = credit_lines(
        SourceFile::new("lineas.csv", None, 0),
        &[["L-1", "Banco Sol", "1000", "100", "2025-01-01"]],
    );
    let outcome = engine().run(vec![
        DomainInput::new(Domain::CreditLine, vec![lines]),
        DomainInput::new(Domain::Contact, vec![]),
    ]);

    assert!(outcome.failed.is_empty());
    assert!(outcome.is_clean());
    assert_eq!(outcome.domains.len(), 2);
    assert!(outcome.domain(Domain::Contact).unwrap().set.is_empty());
}

#[test]
fn default_pipeline_step_order() {
    assert_eq!(
        build_default_pipeline().step_names(),
        vec!["normalize", "validate", "derive", "consolidate"]
    );
}
