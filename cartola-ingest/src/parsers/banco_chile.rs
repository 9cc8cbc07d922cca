//! Banco de Chile cartola extractor (checking account, xls and xlsx exports).
//!
//! Layout, all labels in column B (index 1):
//!
//! ```text
//!   Sr(a):              <holder>
//!   Rut:                <rut>
//!   Cuenta N°:          <account number>
//!   Moneda:             Peso Chileno
//!   Saldo Disponible    ...  Saldo Contable   ...
//!   <available>         ...  <accounting>
//!   Total Cargos        ...  Total Abonos
//!   <debits>            ...  <credits>
//!   Movimientos al DD/MM/YYYY
//!   Fecha | Descripción | Canal o Sucursal | Cargos (CLP) | Abonos (CLP) | Saldo (CLP)
//!   05/01/2024 | Compra Tienda X | App | 15.000 | | 485.000
//! ```
//!
//! Value columns shift between exports, so values are found by scanning
//! rather than by fixed position.

use cartola_core::{StatementMetadata, StatementTransaction, CLP};
use chrono::{NaiveDate, Utc};
use chrono_tz::America::Santiago;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::grid::Grid;
use crate::loader;
use crate::scan::{BlockLabel, InlineLabel};
use crate::values::{find_date, parse_amount, parse_row_date, RowError};

const HOLDER: InlineLabel = InlineLabel::new("Sr(a)", ExtractionError::AccountHolder);
const RUT: InlineLabel = InlineLabel::new("Rut:", ExtractionError::Rut);
const ACCOUNT: InlineLabel = InlineLabel::new("Cuenta", ExtractionError::AccountNumber);
const CURRENCY: InlineLabel = InlineLabel::new("Moneda:", ExtractionError::Currency);
const MOVEMENTS: InlineLabel = InlineLabel::new("Movimientos", ExtractionError::StatementDate);
const TXN_HEADER: InlineLabel = InlineLabel::new("Fecha", ExtractionError::TransactionHeader);

const BALANCES: BlockLabel = BlockLabel::new(
    "Saldo Disponible",
    "Saldo Contable",
    2,
    ExtractionError::BalanceBlock,
);
const TOTALS: BlockLabel = BlockLabel::new("Total Cargos", "Total Abonos", 2, ExtractionError::TotalsBlock);

/// Metadata plus transactions in source order.
pub type Extraction = (StatementMetadata, Vec<StatementTransaction>);

/// What to do when the "Movimientos" row carries no `DD/MM/YYYY`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatementDatePolicy {
    /// Use today's date in Chile.
    #[default]
    Today,
    /// Use a caller-supplied date.
    Fixed(NaiveDate),
    /// Fail with [`ExtractionError::StatementDate`].
    Require,
}

impl StatementDatePolicy {
    fn fallback(self) -> std::result::Result<NaiveDate, ExtractionError> {
        match self {
            StatementDatePolicy::Today => Ok(Utc::now().with_timezone(&Santiago).date_naive()),
            StatementDatePolicy::Fixed(date) => Ok(date),
            StatementDatePolicy::Require => Err(ExtractionError::StatementDate),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub date_policy: StatementDatePolicy,
}

/// Column positions of the movements table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionColumns {
    pub date: usize,
    pub description: usize,
    pub channel: usize,
    pub debit: usize,
    pub credit: usize,
    pub balance: usize,
}

impl TransactionColumns {
    /// Positions of the xlsx export, used for any header that cannot be recognized.
    pub const LEGACY: Self = Self {
        date: 1,
        description: 2,
        channel: 3,
        debit: 4,
        credit: 5,
        balance: 6,
    };

    /// Map header texts in `header_row` to columns, falling back per field to
    /// [`TransactionColumns::LEGACY`].
    pub fn detect(grid: &Grid, header_row: usize) -> Self {
        let mut found: [Option<usize>; 6] = [None; 6];

        for (col, cell) in grid.row(header_row).iter().enumerate() {
            let Some(text) = cell.as_text() else { continue };
            let text = text.trim();
            let slot = if text == "Fecha" {
                0
            } else if text == "Descripción" {
                1
            } else if text.starts_with("Canal") {
                2
            } else if text.starts_with("Cargos") {
                3
            } else if text.starts_with("Abonos") {
                4
            } else if text.starts_with("Saldo") {
                5
            } else {
                continue;
            };
            found[slot] = Some(col);
        }

        let legacy = Self::LEGACY;
        let defaults = [
            ("date", legacy.date),
            ("description", legacy.description),
            ("channel", legacy.channel),
            ("debit", legacy.debit),
            ("credit", legacy.credit),
            ("balance", legacy.balance),
        ];
        let mut cols = [0usize; 6];
        for (i, (name, default)) in defaults.iter().enumerate() {
            cols[i] = found[i].unwrap_or_else(|| {
                warn!(column = name, default, header_row, "header not recognized, using legacy position");
                *default
            });
        }

        let [date, description, channel, debit, credit, balance] = cols;
        let detected = Self {
            date,
            description,
            channel,
            debit,
            credit,
            balance,
        };
        debug!(?detected, header_row, "transaction columns");
        detected
    }
}

/// Extract with default options (today's date when the statement has none).
pub fn extract(grid: &Grid) -> Result<Extraction> {
    extract_with(grid, &ExtractOptions::default())
}

pub fn extract_with(grid: &Grid, options: &ExtractOptions) -> Result<Extraction> {
    let metadata = extract_metadata(grid, options)?;
    let transactions = extract_transactions(grid)?;
    debug!(
        account = %metadata.account_number,
        count = transactions.len(),
        "extracted statement"
    );
    Ok((metadata, transactions))
}

/// Load a spreadsheet from disk and extract it.
pub fn extract_file(path: impl AsRef<Path>) -> Result<Extraction> {
    extract_file_with(path, &ExtractOptions::default())
}

pub fn extract_file_with(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Extraction> {
    let grid = loader::load(path)?;
    extract_with(&grid, options)
}

fn extract_metadata(
    grid: &Grid,
    options: &ExtractOptions,
) -> std::result::Result<StatementMetadata, ExtractionError> {
    let account_holder = HOLDER.text(grid)?;
    let rut = RUT.text(grid)?;
    let account_number = ACCOUNT.text(grid)?;
    // Only the label has to exist; every cartola here is in pesos
    CURRENCY.row(grid)?;

    let (available, accounting) = BALANCES.values(grid)?;
    let (debits, credits) = TOTALS.values(grid)?;

    Ok(StatementMetadata {
        account_holder,
        rut,
        account_number,
        currency: CLP.to_string(),
        available_balance: parse_amount(available),
        accounting_balance: parse_amount(accounting),
        total_debits: parse_amount(debits),
        total_credits: parse_amount(credits),
        statement_date: statement_date(grid, options.date_policy)?,
    })
}

/// The date may be in the label cell ("Movimientos al 15/03/2024") or split
/// into a later cell ("Movimientos" | | "al 15/03/2024"). The first match
/// in the row decides; the policy applies only when there is none.
fn statement_date(
    grid: &Grid,
    policy: StatementDatePolicy,
) -> std::result::Result<NaiveDate, ExtractionError> {
    let row = MOVEMENTS.row(grid)?;
    for text in grid.row(row).iter().filter_map(|cell| cell.as_text()) {
        match find_date(&text) {
            Ok(Some(date)) => return Ok(date),
            Ok(None) => {}
            Err(e) => {
                warn!(row, %text, error = %e, "statement date is not a calendar date");
                return Err(ExtractionError::InvalidStatementDate { row });
            }
        }
    }

    warn!(row, ?policy, "no statement date in movements row");
    policy.fallback()
}

fn extract_transactions(grid: &Grid) -> std::result::Result<Vec<StatementTransaction>, ExtractionError> {
    let header = TXN_HEADER.row(grid)?;
    let cols = TransactionColumns::detect(grid, header);

    let mut out = Vec::new();
    for row in header + 1..grid.height() {
        // spacer
        if grid.get(row, cols.date).is_absent() {
            continue;
        }

        // First row that is not a transaction ends the table. A malformed row
        // in the middle of real data truncates the statement here too.
        match parse_row(grid, row, &cols) {
            Ok(txn) => out.push(txn),
            Err(e) => {
                debug!(row, error = %e, "end of transaction table");
                break;
            }
        }
    }

    Ok(out)
}

fn parse_row(
    grid: &Grid,
    row: usize,
    cols: &TransactionColumns,
) -> std::result::Result<StatementTransaction, RowError> {
    let date_text = grid.text(row, cols.date).unwrap_or_default();
    let date = parse_row_date(&date_text)?;

    let optional_amount = |col: usize| {
        let cell = grid.get(row, col);
        (!cell.is_absent()).then(|| parse_amount(cell))
    };

    Ok(StatementTransaction {
        date,
        description: grid.text(row, cols.description).unwrap_or_default(),
        channel: grid.text(row, cols.channel).unwrap_or_default(),
        debit: optional_amount(cols.debit),
        credit: optional_amount(cols.credit),
        balance: parse_amount(grid.get(row, cols.balance)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::grid::Cell;
    use rust_decimal::Decimal;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|s| Cell::text(*s)).collect()
    }

    /// Header block shared by the tests; movements table is appended per test.
    fn header_rows(movements: &[&str]) -> Vec<Vec<Cell>> {
        let mut movements_row = vec![Cell::Absent];
        movements_row.extend(cells(movements));
        vec![
            vec![],
            cells(&["", "Banco de Chile"]),
            vec![],
            cells(&["", "Sr(a):", "Test Holder"]),
            cells(&["", "Rut:", "11.111.111-1"]),
            cells(&["", "Cuenta:", "00-123-45678-90"]),
            cells(&["", "Moneda:", "Peso Chileno"]),
            cells(&["", "Saldo Disponible", "Saldo Contable"]),
            cells(&["", "485.000", "500.000"]),
            movements_row,
        ]
    }

    fn scenario_grid() -> Grid {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha", "Descripción", "Canal", "Cargos", "Abonos", "Saldo"]));
        rows.push(vec![
            Cell::Absent,
            Cell::text("05/01/2024"),
            Cell::text("Compra Tienda X"),
            Cell::text("App"),
            Cell::from(15_000),
            Cell::text(""),
            Cell::text("485000"),
        ]);
        rows.push(vec![]);
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        rows.push(cells(&["", "15.000", "0"]));
        Grid::from_rows(rows)
    }

    #[test]
    fn test_scenario_single_debit_row() {
        let (meta, txns) = extract(&scenario_grid()).unwrap();

        assert_eq!(meta.account_holder, "Test Holder");
        assert_eq!(meta.rut, "11.111.111-1");
        assert_eq!(meta.account_number, "00-123-45678-90");
        assert_eq!(meta.currency, "CLP");
        assert_eq!(meta.available_balance, Decimal::from(485_000));
        assert_eq!(meta.accounting_balance, Decimal::from(500_000));
        assert_eq!(meta.total_debits, Decimal::from(15_000));
        assert_eq!(meta.total_credits, Decimal::ZERO);
        assert_eq!(meta.statement_date, ymd(2024, 3, 15));

        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.date, ymd(2024, 1, 5));
        assert_eq!(t.description, "Compra Tienda X");
        assert_eq!(t.channel, "App");
        assert_eq!(t.debit, Some(Decimal::from(15_000)));
        assert_eq!(t.credit, None);
        assert_eq!(t.balance, Decimal::from(485_000));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let grid = scenario_grid();
        assert_eq!(extract(&grid).unwrap(), extract(&grid).unwrap());
    }

    #[test]
    fn test_split_movements_row_date() {
        let mut rows = header_rows(&["Movimientos", "", "al 28/02/2023"]);
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        rows.push(cells(&["", "0", "0"]));
        rows.push(cells(&["", "Fecha"]));
        let (meta, txns) = extract(&Grid::from_rows(rows)).unwrap();
        assert_eq!(meta.statement_date, ymd(2023, 2, 28));
        assert!(txns.is_empty());
    }

    #[test]
    fn test_impossible_statement_date_is_an_error() {
        for movements in [
            &["Movimientos al 31/02/2024"][..],
            &["Movimientos", "", "al 31/02/2024"][..],
            // first match decides even when a real date follows
            &["Movimientos al 31/02/2024", "al 29/02/2024"][..],
        ] {
            let mut rows = header_rows(movements);
            rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
            rows.push(cells(&["", "Fecha"]));
            let grid = Grid::from_rows(rows);

            assert!(matches!(
                extract(&grid),
                Err(IngestError::Extraction(ExtractionError::InvalidStatementDate { row: 9 }))
            ));
            // the fallback policy does not paper over it
            let fixed = ExtractOptions {
                date_policy: StatementDatePolicy::Fixed(ymd(2020, 1, 1)),
            };
            assert!(extract_with(&grid, &fixed).is_err());
        }
    }

    #[test]
    fn test_missing_statement_date_uses_policy() {
        let mut rows = header_rows(&["Movimientos"]);
        rows.push(cells(&["", "Fecha"]));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        let grid = Grid::from_rows(rows);

        let fixed = ExtractOptions {
            date_policy: StatementDatePolicy::Fixed(ymd(2020, 1, 1)),
        };
        assert_eq!(extract_with(&grid, &fixed).unwrap().0.statement_date, ymd(2020, 1, 1));

        let today = Utc::now().with_timezone(&Santiago).date_naive();
        let got = extract(&grid).unwrap().0.statement_date;
        // tolerate a day rollover between the two clock reads
        assert!((got - today).num_days().abs() <= 1);

        let strict = ExtractOptions {
            date_policy: StatementDatePolicy::Require,
        };
        assert!(matches!(
            extract_with(&grid, &strict),
            Err(IngestError::Extraction(ExtractionError::StatementDate))
        ));
    }

    #[test]
    fn test_missing_sections_fail_in_order() {
        let grid = Grid::from_rows(vec![cells(&["", "Rut:", "1-9"])]);
        assert!(matches!(
            extract(&grid),
            Err(IngestError::Extraction(ExtractionError::AccountHolder))
        ));

        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.retain(|r| !r.iter().any(|c| c.as_text().is_some_and(|t| t.starts_with("Moneda"))));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        assert!(matches!(
            extract(&Grid::from_rows(rows)),
            Err(IngestError::Extraction(ExtractionError::Currency))
        ));
    }

    #[test]
    fn test_missing_totals_and_header() {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha"]));
        assert!(matches!(
            extract(&Grid::from_rows(rows)),
            Err(IngestError::Extraction(ExtractionError::TotalsBlock))
        ));

        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        assert!(matches!(
            extract(&Grid::from_rows(rows)),
            Err(IngestError::Extraction(ExtractionError::TransactionHeader))
        ));
    }

    #[test]
    fn test_detect_shifted_columns() {
        let grid = Grid::from_rows(vec![cells(&[
            "",
            "Fecha",
            "",
            "Descripción",
            "",
            "Canal o Sucursal",
            "Cargos (CLP)",
            "Abonos (CLP)",
            "Saldo (CLP)",
        ])]);
        let cols = TransactionColumns::detect(&grid, 0);
        assert_eq!(
            cols,
            TransactionColumns {
                date: 1,
                description: 3,
                channel: 5,
                debit: 6,
                credit: 7,
                balance: 8,
            }
        );
    }

    #[test]
    fn test_detect_falls_back_per_column() {
        // no recognizable credit header
        let grid = Grid::from_rows(vec![cells(&[
            "", "Fecha", "Descripción", "Canal", "Cargos", "???", "Saldo",
        ])]);
        let cols = TransactionColumns::detect(&grid, 0);
        assert_eq!(cols.credit, TransactionColumns::LEGACY.credit);
        assert_eq!(cols.balance, 6);
    }

    #[test]
    fn test_unrecognized_credit_header_still_reads_credits() {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha", "Descripción", "Canal", "Cargos", "", "Saldo"]));
        rows.push(cells(&["", "02/01/2024", "Traspaso De: Ana", "Internet", "", "200.000", "500.000"]));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        let (_, txns) = extract(&Grid::from_rows(rows)).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].credit, Some(Decimal::from(200_000)));
        assert_eq!(txns[0].debit, None);
    }

    #[test]
    fn test_footer_stops_scan_without_error() {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha", "Descripción", "Canal", "Cargos", "Abonos", "Saldo"]));
        rows.push(cells(&["", "05/01/2024", "Compra", "App", "1.000", "", "9.000"]));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        rows.push(cells(&["", "1.000", "0"]));
        // looks like a transaction but sits past the footer
        rows.push(cells(&["", "06/01/2024", "Ghost", "App", "5", "", "1"]));
        let (_, txns) = extract(&Grid::from_rows(rows)).unwrap();
        assert_eq!(txns.len(), 1);
    }

    #[test]
    fn test_malformed_row_truncates_table() {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha", "Descripción", "Canal", "Cargos", "Abonos", "Saldo"]));
        rows.push(cells(&["", "05/01/2024", "A", "", "1", "", "9"]));
        rows.push(cells(&["", "32/01/2024", "B", "", "1", "", "8"]));
        rows.push(cells(&["", "07/01/2024", "C", "", "1", "", "7"]));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        let (_, txns) = extract(&Grid::from_rows(rows)).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "A");
    }

    #[test]
    fn test_missing_optional_cells() {
        let mut rows = header_rows(&["Movimientos al 15/03/2024"]);
        rows.push(cells(&["", "Fecha", "Descripción", "Canal", "Cargos", "Abonos", "Saldo"]));
        rows.push(cells(&["", "05/01/2024"]));
        rows.push(cells(&["", "Total Cargos", "Total Abonos"]));
        let (_, txns) = extract(&Grid::from_rows(rows)).unwrap();
        let t = &txns[0];
        assert_eq!(t.description, "");
        assert_eq!(t.channel, "");
        assert_eq!(t.debit, None);
        assert_eq!(t.credit, None);
        assert_eq!(t.balance, Decimal::ZERO);
    }
}
