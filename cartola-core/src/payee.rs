//! Description cleanup rules applied when a statement row becomes a ledger entry.

use rust_decimal::Decimal;

/// Prefixes the bank prepends to descriptions; checked in order, first hit wins.
const PAYEE_PREFIXES: [&str; 4] = ["Traspaso A:", "Transferencia A:", "Compra ", "Pago "];

/// Derive a payee from a raw statement description.
pub fn normalize_payee(description: &str) -> String {
    let description = description.trim();

    for prefix in PAYEE_PREFIXES {
        if description.starts_with(prefix) {
            return description.replace(prefix, "").trim().to_string();
        }
    }

    description.to_string()
}

/// Collapse every whitespace run to a single space.
pub fn clean_narration(description: &str) -> String {
    description.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Two-decimal display form, e.g. `"15000.00 CLP"`. Missing amounts show as zero.
pub fn format_amount(amount: Option<Decimal>, currency: &str) -> String {
    format!("{:.2} {}", amount.unwrap_or(Decimal::ZERO), currency)
}
