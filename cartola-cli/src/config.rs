use anyhow::{Context, Result};
use cartola_importer::BancoChileImporter;
use cartola_ingest::{ExtractOptions, StatementDatePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_cartola_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accounts: Vec<AccountSection>,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub extract: ExtractSection,
}

/// One bank account routed to one ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSection {
    /// As printed on the cartola, e.g. "00-123-45678-90"
    pub account_number: String,
    pub account_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Emit entries oldest first (cartolas list newest first)
    #[serde(default = "default_true")]
    pub reverse: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractSection {
    /// Fail instead of using today's date when the statement date is missing
    #[serde(default)]
    pub strict_dates: bool,
}

fn default_currency() -> String {
    "CLP".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { reverse: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: vec![AccountSection {
                account_number: "00-123-45678-90".to_string(),
                account_name: "Assets:BancoChile:Checking".to_string(),
                currency: default_currency(),
            }],
            output: OutputSection::default(),
            extract: ExtractSection::default(),
        }
    }
}

impl Config {
    pub fn extract_options(&self) -> ExtractOptions {
        let date_policy = if self.extract.strict_dates {
            StatementDatePolicy::Require
        } else {
            StatementDatePolicy::Today
        };
        ExtractOptions { date_policy }
    }

    pub fn importers(&self) -> Vec<BancoChileImporter> {
        self.accounts
            .iter()
            .map(|a| {
                BancoChileImporter::new(&a.account_number, &a.account_name)
                    .with_currency(&a.currency)
                    .reverse(self.output.reverse)
                    .with_options(self.extract_options())
            })
            .collect()
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_cartola_home()?.join("config.toml"))
}

/// Read `path`, or the default location when `None`. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
