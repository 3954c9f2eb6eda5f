//! Parsing and display formatting for monetary amounts.

/// Parse a decimal amount sent by the payments backend, e.g. "1234.505".
///
/// Surrounding whitespace is ignored. Returns `None` if `text` is not a
/// number. Textual infinities and NaN, e.g. "inf", are not numbers here.
pub fn parse_amount(text: &str) -> Option<f64> {
    let text = text.trim();

    if text
        .trim_start_matches(['+', '-'])
        .starts_with(|c: char| c.is_ascii_alphabetic())
    {
        return None;
    }

    text.parse().ok()
}

/// Drop everything past the second decimal place, rounding toward negative
/// infinity, so that a displayed amount never exceeds the recorded amount.
pub fn truncate_to_cents(amount: f64) -> f64 {
    (amount * 100.0).floor() / 100.0
}

/// Format `amount` with comma thousands separators and exactly two decimal
/// places, e.g. "1,234.50".
///
/// Digits past the second decimal place are rounded. Non-finite amounts are
/// rendered as "NaN", "∞" or "-∞".
pub fn format_amount(amount: f64) -> String {
    if amount.is_nan() {
        return "NaN".to_owned();
    }

    if amount.is_infinite() {
        return if amount > 0.0 { "∞" } else { "-∞" }.to_owned();
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let formatted = format!("{}.{fraction}", group_thousands(whole));

    // Amounts that round to zero are shown without a sign.
    let is_zero = fixed.bytes().all(|byte| matches!(byte, b'0' | b'.'));

    if amount < 0.0 && !is_zero {
        format!("-{formatted}")
    } else {
        formatted
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }

        grouped.push(digit);
    }

    grouped
}
