//! Statement rows -> ledger directives.

use cartola_core::{
    clean_narration, normalize_payee, Balance, Directive, Flag, LedgerTransaction, Posting,
    StatementTransaction,
};
use std::collections::BTreeMap;

/// One ledger transaction for a statement row, or `None` when the row moves
/// no money (neither a positive debit nor a positive credit).
pub fn to_ledger_transaction(
    txn: &StatementTransaction,
    account: &str,
    currency: &str,
) -> Option<LedgerTransaction> {
    let units = txn.signed_amount()?;

    let mut meta = BTreeMap::new();
    meta.insert("channel".to_string(), txn.channel.clone());

    Some(LedgerTransaction {
        date: txn.date,
        flag: Flag::Okay,
        payee: Some(normalize_payee(&txn.description)),
        narration: clean_narration(&txn.description),
        meta,
        postings: vec![Posting {
            account: account.to_string(),
            units,
            currency: currency.to_string(),
        }],
    })
}

/// Assert the running balance printed on the last row of the statement.
pub fn balance_assertion(
    txns: &[StatementTransaction],
    account: &str,
    currency: &str,
) -> Option<Balance> {
    let last = txns.last()?;
    Some(Balance {
        date: last.date,
        account: account.to_string(),
        amount: last.balance,
        currency: currency.to_string(),
    })
}

/// Balance assertion first, then one entry per money-moving row. With
/// `reverse`, rows are emitted bottom-up (oldest first for newest-first files).
pub fn build_directives(
    txns: &[StatementTransaction],
    account: &str,
    currency: &str,
    reverse: bool,
) -> Vec<Directive> {
    let mut out: Vec<Directive> = balance_assertion(txns, account, currency)
        .map(Directive::Balance)
        .into_iter()
        .collect();

    let rows: Box<dyn Iterator<Item = &StatementTransaction>> = if reverse {
        Box::new(txns.iter().rev())
    } else {
        Box::new(txns.iter())
    };
    out.extend(
        rows.filter_map(|t| to_ledger_transaction(t, account, currency))
            .map(Directive::Transaction),
    );
    out
}
