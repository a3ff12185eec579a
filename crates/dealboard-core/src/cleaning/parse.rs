//! Lenient parsers for numbers and dates typed by humans
//!
//! Board cells hold whatever people typed: `₹ 1,20,000`, `(500)`, `12.5%`,
//! `1.5e6`, `03/04/2024`, `March 4, 2024`. These functions return `None`
//! for anything they cannot read; the caller decides what that means.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Currency markers and whitespace stripped before numeric parsing
static CURRENCY_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[$€£¥₹]|\bkr\b|\bchf\b|\brs\.?|\binr\b|\s").unwrap()
});

/// Tokens that mean "no value"
const EMPTY_TOKENS: [&str; 6] = ["", "null", "none", "n/a", "na", "-"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Whether a cell is effectively empty
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => EMPTY_TOKENS.contains(&s.trim().to_lowercase().as_str()),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Parse a free-form numeric string
///
/// Percentages come back as fractions (`"12.5%"` → `0.125`). The result may
/// be negative or non-finite; range checks are the caller's job.
pub fn parse_number_text(text: &str) -> Option<f64> {
    let mut cleaned = CURRENCY_NOISE.replace_all(text.trim(), "").into_owned();
    if cleaned.is_empty() {
        return None;
    }

    let is_percentage = cleaned.contains('%');
    cleaned = cleaned.replace('%', "");

    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() > 2 {
        cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
    }

    match (cleaned.find(','), cleaned.find('.')) {
        // 1.000.000,50
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        }
        // 1,000,000.50
        (Some(_), Some(_)) => {
            cleaned = cleaned.replace(',', "");
        }
        (Some(_), None) => {
            let parts: Vec<&str> = cleaned.split(',').collect();
            cleaned = if parts.len() == 2 && parts[1].len() == 2 {
                // 1000,50
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            };
        }
        _ => {}
    }

    let parsed: f64 = cleaned.parse().ok()?;
    Some(if is_percentage { parsed / 100.0 } else { parsed })
}

/// Numeric value of a cell: JSON numbers, numeric strings, or a status label
pub fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        Value::Object(map) => map.get("label").and_then(parse_numeric),
        _ => None,
    }
}

/// Parse a free-form date (or date-time) string, keeping the calendar date
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let cleaned = text.trim();
    if EMPTY_TOKENS.contains(&cleaned.to_lowercase().as_str()) {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(cleaned, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cleaned, format).ok())
}

/// Date value of a cell
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_text(s),
        Value::Object(map) => map.get("date").and_then(parse_date),
        _ => None,
    }
}

/// Text of a cell: strings, status labels, first list entry, or a number
pub fn label_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => return map.get("label").and_then(label_text),
        Value::Array(items) => return items.iter().find_map(label_text),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
