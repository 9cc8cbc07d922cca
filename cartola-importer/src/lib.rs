//! cartola-importer: routes cartola files to ledger accounts and turns their
//! rows into ledger directives.

pub mod banco_chile;
pub mod entries;

pub use banco_chile::BancoChileImporter;
pub use entries::{balance_assertion, build_directives, to_ledger_transaction};
