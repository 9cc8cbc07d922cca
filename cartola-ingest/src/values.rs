//! Amount and date parsing for cartola cells.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

use crate::grid::Cell;

static DATE_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("static regex"));

static DATE_AT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}").expect("static regex"));

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Why a row in the movements table is not a transaction. Never surfaced.
#[derive(Debug, Error)]
pub(crate) enum RowError {
    #[error("date cell {0:?} does not start with DD/MM/YYYY")]
    NotADate(String),

    #[error("date cell {text:?}: {source}")]
    BadDate {
        text: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parse a statement amount.
///
/// Numeric cells are taken as is. Text has every `,` and `.` removed: these
/// statements only use them as thousands separators and carry no cents.
/// Blank or unparseable text is zero.
pub fn parse_amount(cell: &Cell) -> Decimal {
    match cell {
        Cell::Absent => Decimal::ZERO,
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let digits = s.replace([',', '.'], "");
            let digits = digits.trim();
            if digits.is_empty() {
                return Decimal::ZERO;
            }
            Decimal::from_str(digits).unwrap_or(Decimal::ZERO)
        }
    }
}

/// The first `DD/MM/YYYY` in `text`, if any.
///
/// Only the first match counts: `31/02/2024` is an error even when a valid
/// date follows it.
pub fn find_date(text: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    DATE_ANYWHERE
        .find(text)
        .map(|m| NaiveDate::parse_from_str(m.as_str(), DATE_FORMAT))
        .transpose()
}

/// Parse a transaction date cell, which must be exactly `DD/MM/YYYY`.
pub(crate) fn parse_row_date(text: &str) -> Result<NaiveDate, RowError> {
    if !DATE_AT_START.is_match(text) {
        return Err(RowError::NotADate(text.to_string()));
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|source| RowError::BadDate {
        text: text.to_string(),
        source,
    })
}
