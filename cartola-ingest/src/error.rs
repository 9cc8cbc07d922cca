use std::path::PathBuf;
use thiserror::Error;

use crate::loader::SpreadsheetKind;

/// The file could not be turned into a grid.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a readable {kind} workbook: {message}")]
    Decode { kind: SpreadsheetKind, message: String },

    #[error("{kind} workbook has no worksheet")]
    NoWorksheet { kind: SpreadsheetKind },
}

/// A required statement section is missing from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("could not find account holder information (\"Sr(a)\")")]
    AccountHolder,

    #[error("could not find RUT information (\"Rut:\")")]
    Rut,

    #[error("could not find account information (\"Cuenta\")")]
    AccountNumber,

    #[error("could not find currency information (\"Moneda:\")")]
    Currency,

    #[error("could not find balance information (\"Saldo Disponible\")")]
    BalanceBlock,

    #[error("could not find totals information (\"Total Cargos\")")]
    TotalsBlock,

    #[error("could not find statement date (\"Movimientos\")")]
    StatementDate,

    #[error("statement date in row {row} is not a calendar date")]
    InvalidStatementDate { row: usize },

    #[error("could not find transaction header (\"Fecha\")")]
    TransactionHeader,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
