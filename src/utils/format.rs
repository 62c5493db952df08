use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Rounds to whole cents, half a cent rounding away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with two decimals and comma thousands separators, e.g. `₹1,234.50`.
pub fn format_currency(symbol: &str, value: Decimal) -> String {
    let rounded = round_money(value);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let fixed = format!("{:.2}", rounded.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}.{}", sign, symbol, grouped, fraction)
}

/// Strips a currency symbol and thousands separators from a display amount.
pub fn parse_display_amount(raw: &str, symbol: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(symbol, "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// Last `max_chars` characters of `text`, on a char boundary.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
