//! cartola-core: statement records, ledger directives and description cleanup rules

pub mod ledger;
pub mod payee;
pub mod statement;

pub use ledger::{Balance, Directive, Flag, LedgerTransaction, Posting};
pub use payee::{clean_narration, format_amount, normalize_payee};
pub use statement::{StatementMetadata, StatementTransaction, CLP};
