//! Conversion of raw XML text tokens into exact amounts and calendar dates.
//!
//! FatturaPA writes amounts with a dot separator, but hand-edited documents
//! occasionally carry a comma. Both are accepted. Anything else is absorbed:
//! the amount readers fall back to zero and the date reader to `None`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for unit prices.
pub const UNIT_PRICE_SCALE: u32 = 8;

/// Parse an amount, returning `None` for blank or malformed input.
pub fn try_parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Parse an amount, falling back to zero for blank or malformed input.
pub fn parse_amount(raw: &str) -> Decimal {
    match try_parse_amount(raw) {
        Some(value) => value,
        None => {
            if !raw.trim().is_empty() {
                tracing::warn!(token = raw, "malformed amount, using zero");
            }
            Decimal::ZERO
        }
    }
}

/// Parse a unit price and round it to [`UNIT_PRICE_SCALE`] places.
pub fn parse_unit_price(raw: &str) -> Decimal {
    parse_amount(raw).round_dp_with_strategy(UNIT_PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a literal `YYYY-MM-DD` date. Any other shape yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        if !s.is_empty() {
            tracing::warn!(token = raw, "date is not YYYY-MM-DD, leaving it empty");
        }
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a positive line number; zero, negative and malformed values yield `None`.
pub fn parse_line_number(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
