//! Plain-text ledger directives (Beancount syntax) built from statement rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    /// `*`
    Okay,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Okay => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account: String,
    pub units: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub date: NaiveDate,
    pub flag: Flag,
    pub payee: Option<String>,
    pub narration: String,
    /// Entry-level metadata, rendered as `key: "value"` lines
    pub meta: BTreeMap<String, String>,
    pub postings: Vec<Posting>,
}

/// Balance assertion for reconciliation against the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Balance(Balance),
    Transaction(LedgerTransaction),
}

impl Directive {
    pub fn date(&self) -> NaiveDate {
        match self {
            Directive::Balance(b) => b.date,
            Directive::Transaction(t) => t.date,
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} balance {}  {} {}",
            self.date.format("%Y-%m-%d"),
            self.account,
            self.amount,
            self.currency
        )
    }
}

impl fmt::Display for LedgerTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.flag)?;
        if let Some(payee) = &self.payee {
            write!(f, " {}", quote(payee))?;
        }
        writeln!(f, " {}", quote(&self.narration))?;
        for (key, value) in &self.meta {
            writeln!(f, "  {}: {}", key, quote(value))?;
        }
        for p in &self.postings {
            writeln!(f, "  {}  {} {}", p.account, p.units, p.currency)?;
        }
        Ok(())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Balance(b) => b.fmt(f),
            Directive::Transaction(t) => t.fmt(f),
        }
    }
}
