//! Currency code handling.

/// Upper-cases and trims a currency code and maps the legacy rouble codes
/// (`SUR` on the exchange, `RUR` before 1998) to `RUB`.
pub fn normalize_currency_code(code: &str) -> String {
    let code = code.trim().to_uppercase();
    match code.as_str() {
        "SUR" | "RUR" => "RUB".to_string(),
        _ => code,
    }
}

/// Whether `code` looks like an ISO 4217 alphabetic code.
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
