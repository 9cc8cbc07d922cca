//! Importer for Banco de Chile checking-account cartolas (xls/xlsx).
//!
//! Every query re-reads the file; extraction is a pure function of its bytes.
//! Failures in `identify`/`date`/`filename` mean "not my file", never a panic,
//! so one bad download does not stop a batch.

use anyhow::{Context, Result};
use cartola_core::{Directive, CLP};
use cartola_ingest::{extract_file_with, ExtractOptions, Extraction};
use chrono::NaiveDate;
use std::path::Path;
use tracing::debug;

use crate::entries::build_directives;

const EXTENSIONS: [&str; 2] = ["xls", "xlsx"];

#[derive(Debug, Clone)]
pub struct BancoChileImporter {
    account_number: String,
    account_name: String,
    currency: String,
    reverse: bool,
    options: ExtractOptions,
}

impl BancoChileImporter {
    /// `account_number` as printed on the cartola (e.g. `"00-123-45678-90"`),
    /// `account_name` the ledger account (e.g. `"Assets:BancoChile:Checking"`).
    pub fn new(account_number: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            account_name: account_name.into(),
            currency: CLP.to_string(),
            reverse: true,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Emit rows bottom-up (default). Statements list newest first.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    fn read(&self, path: &Path) -> Result<Extraction> {
        extract_file_with(path, &self.options)
            .with_context(|| format!("extracting {}", path.display()))
    }

    /// True when `path` is a cartola for this importer's account.
    pub fn identify(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !has_spreadsheet_extension(path) {
            return false;
        }

        match self.read(path) {
            Ok((meta, _)) => meta.account_number == self.account_number,
            Err(e) => {
                debug!(path = %path.display(), error = %format!("{e:#}"), "not a cartola");
                false
            }
        }
    }

    pub fn account(&self, _path: impl AsRef<Path>) -> &str {
        &self.account_name
    }

    /// Statement "as-of" date.
    pub fn date(&self, path: impl AsRef<Path>) -> Option<NaiveDate> {
        self.read(path.as_ref())
            .ok()
            .map(|(meta, _)| meta.statement_date)
    }

    /// Canonical archive name: `2024-03-15_banco_chile_001234567890.xls`.
    pub fn filename(&self, path: impl AsRef<Path>) -> Option<String> {
        let date = self.date(path)?;
        Some(format!(
            "{}_banco_chile_{}.xls",
            date.format("%Y-%m-%d"),
            self.account_number.replace('-', "")
        ))
    }

    /// Balance assertion followed by one transaction per money-moving row.
    pub fn extract(&self, path: impl AsRef<Path>) -> Result<Vec<Directive>> {
        let path = path.as_ref();
        let (_, txns) = self.read(path)?;
        let directives = build_directives(&txns, &self.account_name, &self.currency, self.reverse);
        debug!(
            path = %path.display(),
            rows = txns.len(),
            directives = directives.len(),
            "built ledger entries"
        );
        Ok(directives)
    }
}

fn has_spreadsheet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|ok| e.eq_ignore_ascii_case(ok)))
}
