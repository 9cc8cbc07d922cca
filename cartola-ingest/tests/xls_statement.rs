use cartola_ingest::fixture::{sample_statement, xlsx_bytes};
use cartola_ingest::{extract_file, load, load_bytes, sniff, Cell, SpreadsheetKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tempfile::tempdir;

/// BIFF8 export of the same cartola that `sample_statement` builds.
fn cartola_xls() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cartola.xls")
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_xls_cells_keep_absolute_positions_and_types() {
    assert_eq!(sniff(cartola_xls()).unwrap(), SpreadsheetKind::Xls);
    let grid = load(cartola_xls()).unwrap();

    assert!(grid.get(0, 0).is_absent());
    assert!(grid.get(1, 0).is_absent());
    assert_eq!(grid.text(1, 1).as_deref(), Some("Banco de Chile"));
    assert_eq!(grid.text(3, 3).as_deref(), Some("Test Holder"));
    assert_eq!(grid.text(5, 1).as_deref(), Some("Cuenta N°:"));
    assert_eq!(grid.text(10, 2).as_deref(), Some("Descripción"));
    assert_eq!(grid.get(8, 3), &Cell::Number(Decimal::from(500_000)));
    assert_eq!(grid.get(11, 4), &Cell::Number(Decimal::from(15_000)));
    assert_eq!(grid.get(8, 1), &Cell::Text("485.000".to_string()));
    assert!(grid.get(13, 1).is_absent());
}

#[test]
fn test_extract_legacy_statement() {
    let (meta, txns) = extract_file(cartola_xls()).unwrap();

    assert_eq!(meta.account_holder, "Test Holder");
    assert_eq!(meta.rut, "11.111.111-1");
    assert_eq!(meta.account_number, "00-123-45678-90");
    assert_eq!(meta.currency, "CLP");
    assert_eq!(meta.available_balance, Decimal::from(485_000));
    assert_eq!(meta.accounting_balance, Decimal::from(500_000));
    assert_eq!(meta.total_debits, Decimal::from(40_000));
    assert_eq!(meta.total_credits, Decimal::from(200_000));
    assert_eq!(meta.statement_date, ymd(2024, 3, 15));

    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].date, ymd(2024, 1, 5));
    assert_eq!(txns[0].description, "Compra Tienda X");
    assert_eq!(txns[0].debit, Some(Decimal::from(15_000)));
    assert_eq!(txns[0].credit, None);
    assert_eq!(txns[1].credit, Some(Decimal::from(200_000)));
    assert_eq!(txns[1].channel, "Internet");
    assert_eq!(txns[2].description, "Pago Cuenta Luz");
    assert_eq!(txns[2].balance, Decimal::from(300_000));
}

#[test]
fn test_legacy_file_renamed_xlsx_still_extracts() {
    let dir = tempdir().unwrap();
    let as_xls = dir.path().join("cartola.xls");
    let as_xlsx = dir.path().join("cartola.xlsx");
    std::fs::copy(cartola_xls(), &as_xls).unwrap();
    std::fs::copy(cartola_xls(), &as_xlsx).unwrap();

    assert_eq!(sniff(&as_xlsx).unwrap(), SpreadsheetKind::Xls);
    assert_eq!(extract_file(&as_xlsx).unwrap(), extract_file(&as_xls).unwrap());
}

#[test]
fn test_both_formats_extract_the_same_statement() {
    let dir = tempdir().unwrap();
    let xlsx = dir.path().join("cartola.xlsx");
    std::fs::write(&xlsx, xlsx_bytes(&sample_statement()).unwrap()).unwrap();

    assert_eq!(extract_file(cartola_xls()).unwrap(), extract_file(&xlsx).unwrap());

    let legacy = load(cartola_xls()).unwrap();
    let modern = load_bytes(&xlsx_bytes(&sample_statement()).unwrap()).unwrap();
    for row in 0..legacy.height() {
        assert_eq!(legacy.row(row), modern.row(row), "row {row}");
    }
}
