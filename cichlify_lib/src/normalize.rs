//! Permissive numeric normalization for scraped field text.
//!
//! All functions are pure and total: malformed input yields `None` plus a
//! warning-level diagnostic, never an error. Sources render prices, ratings,
//! and counts inconsistently; these helpers are the single place where that
//! inconsistency is absorbed.

use std::sync::OnceLock;

use regex::Regex;

fn numeric_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("hard-coded regex"))
}

fn rating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s+out of 5 stars").expect("hard-coded regex"))
}

/// Parses a currency-agnostic price from listing text.
///
/// Currency symbols and thousands separators are stripped; for range texts
/// ("X to Y" or "X - Y") the lower bound wins; the first numeric token is
/// taken. `"$1,234.56"` -> 1234.56, `"$10 to $20"` -> 10.0, `"US $5"` -> 5.0.
pub fn normalize_price(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.split(" to ").next().unwrap_or(trimmed);
    let lower = lower.split(" - ").next().unwrap_or(lower);
    let cleaned = lower.replace(',', "");
    match numeric_token_re().find(&cleaned) {
        Some(token) => token.as_str().parse().ok(),
        None => {
            tracing::warn!("unparseable price text: {:?}", text);
            None
        }
    }
}

/// Parses a 0-5 star rating, recognized only as "<number> out of 5 stars"
/// (trailing punctuation tolerated).
pub fn normalize_rating(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = rating_re()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|rating| (0.0..=5.0).contains(rating));
    if parsed.is_none() {
        tracing::warn!("unparseable rating text: {:?}", text);
    }
    parsed
}

/// Parses a non-negative integer count, accepting thousands separators but
/// nothing else.
pub fn normalize_count(text: &str) -> Option<u32> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<u32>() {
        Ok(count) => Some(count),
        Err(_) => {
            tracing::warn!("unparseable count text: {:?}", text);
            None
        }
    }
}
