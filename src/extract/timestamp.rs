//! Order-time normalization.
//!
//! Receipts print the order-receipt time in several shapes: label-prefixed
//! two-digit-year slash dates (`주문접수시간: 25/09/01 20:04:44`), bare slash
//! dates, ISO-like hyphen dates, and the canonical dotted form itself. All
//! of them normalize to `YYYY.MM.DD HH:mm:ss`, which downstream display,
//! sorting, and export depend on verbatim. Input that parses to no valid
//! instant falls back to the current time in the same form.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

/// chrono format string for the canonical timestamp form.
pub const CANONICAL_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"주문\s*접수\s*시간[:\s]*(\d{2}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})",
        r"주문시간[:\s]*(\d{2}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})",
        r"접수시간[:\s]*(\d{2}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})",
        r"(\d{2}/\d{2}/\d{2}\s+\d{2}:\d{2}:\d{2})",
        r"(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})",
        r"(\d{4}\.\d{2}\.\d{2}\s+\d{2}:\d{2}:\d{2})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid time pattern"))
    .collect()
});

/// Current time in canonical form.
pub fn now_canonical() -> String {
    Local::now().format(CANONICAL_FORMAT).to_string()
}

/// Find an order time anywhere in the text and normalize it.
pub fn extract_order_time(text: &str) -> Option<String> {
    for pattern in TIME_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(text) {
            if let Some(normalized) = normalize(&captures[1]) {
                return Some(normalized);
            }
        }
    }
    None
}

/// Normalize, falling back to the current instant when nothing parses.
pub fn normalize_order_time(text: &str) -> String {
    extract_order_time(text).unwrap_or_else(now_canonical)
}

/// Normalize one bare timestamp string to canonical form.
///
/// Returns `None` for unknown shapes or out-of-range field values
/// (month 13, hour 25, ...).
pub fn normalize(raw: &str) -> Option<String> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != 2 {
        return None;
    }
    let (date_part, time_part) = (parts[0], parts[1]);

    let datetime = if date_part.contains('/') {
        // Two-digit years are taken as 2000s (25 -> 2025).
        let date: Vec<&str> = date_part.split('/').collect();
        let time: Vec<&str> = time_part.split(':').collect();
        if date.len() != 3 || time.len() != 3 {
            return None;
        }
        let year: i32 = date[0].parse().ok()?;
        let year = if year < 100 { 2000 + year } else { year };
        let date = NaiveDate::from_ymd_opt(year, date[1].parse().ok()?, date[2].parse().ok()?)?;
        let time = NaiveTime::from_hms_opt(
            time[0].parse().ok()?,
            time[1].parse().ok()?,
            time[2].parse().ok()?,
        )?;
        NaiveDateTime::new(date, time)
    } else if date_part.contains('-') {
        NaiveDateTime::parse_from_str(&format!("{date_part} {time_part}"), "%Y-%m-%d %H:%M:%S")
            .ok()?
    } else {
        NaiveDateTime::parse_from_str(&format!("{date_part} {time_part}"), "%Y.%m.%d %H:%M:%S")
            .ok()?
    };

    Some(datetime.format(CANONICAL_FORMAT).to_string())
}
