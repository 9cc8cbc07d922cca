//! cartola-ingest: spreadsheet loading and Banco de Chile cartola extraction.
//!
//! Flow is one-way: [`loader::load`] turns a file into a [`Grid`], then
//! [`parsers::banco_chile::extract`] scans that grid for labels and returns
//! the statement header plus its transaction rows.

pub mod error;
pub mod grid;
pub mod loader;
pub mod parsers;
pub mod scan;
pub mod values;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use error::{ExtractionError, FormatError, IngestError, Result};
pub use grid::{Cell, Grid};
pub use loader::{load, load_bytes, sniff, sniff_bytes, SpreadsheetKind};
pub use parsers::banco_chile::{
    extract, extract_file, extract_file_with, extract_with, ExtractOptions, Extraction,
    StatementDatePolicy, TransactionColumns,
};
