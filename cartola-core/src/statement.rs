//! Records produced by a cartola extraction run

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency of every Banco de Chile cartola handled here
pub const CLP: &str = "CLP";

/// Statement-wide header block. Built whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub account_holder: String,
    pub rut: String,
    /// Identity key used to route a file to a ledger account
    pub account_number: String,
    pub currency: String,
    pub available_balance: Decimal,
    pub accounting_balance: Decimal,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
    /// "As-of" date printed next to "Movimientos"
    pub statement_date: NaiveDate,
}

/// One row of the movements table, in statement sign convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub channel: String,
    /// Money leaving the account
    pub debit: Option<Decimal>,
    /// Money entering the account
    pub credit: Option<Decimal>,
    /// Running balance after this row
    pub balance: Decimal,
}

impl StatementTransaction {
    /// Amount in ledger sign convention: debit negative, credit positive.
    ///
    /// A positive debit wins over a credit. Returns `None` when neither side
    /// carries a positive amount.
    pub fn signed_amount(&self) -> Option<Decimal> {
        match (self.debit, self.credit) {
            (Some(d), _) if d > Decimal::ZERO => Some(-d),
            (_, Some(c)) if c > Decimal::ZERO => Some(c),
            _ => None,
        }
    }
}
