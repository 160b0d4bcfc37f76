use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

static YEAR_IN_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(20\d{2})").expect("valid regex"));

static TRAILING_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ T]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s*(?:Z|[+-]\d{2}:?\d{2}|UTC))?\s*$")
        .expect("valid regex")
});

/// Resolves date-like text to a calendar date with no time part.
///
/// Supported formats:
/// - Bare year: "2025" (also "2025.0" as exported by spreadsheets) -> 2025-01-01
/// - ISO dates: "2025-12-25", "2025/12/25", RFC3339 timestamps
/// - Day first: "25-12-2025", "25/12/2025"
/// - Month and year: "Dec 2024", "Dec-2024", "December 2024", "2024-12", "12/2024",
///   "2024/12" -> first of the month
/// - Fallback: the first `20xx` found anywhere in the text -> January 1 of that year
///
/// Returns `None` for blank or unresolvable input, and for years outside 1900..=2100.
pub fn to_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    resolve(input).filter(|date| YEAR_RANGE.contains(&date.year()))
}

fn resolve(input: &str) -> Option<NaiveDate> {
    if let Some(year) = bare_year(input) {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y", "%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Some(date);
        }
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt.date());
        }
    }

    if let Some(date) = month_year(input) {
        return Some(date);
    }

    YEAR_IN_TEXT
        .captures(input)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1))
}

/// Drops a trailing time-of-day so "2025-06-30 00:00:00" resolves like "2025-06-30".
pub fn strip_time_of_day(input: &str) -> &str {
    match TRAILING_TIME.find(input) {
        Some(m) => input[..m.start()].trim_end(),
        None => input.trim(),
    }
}

/// Date normalisation applied to the dataset's possession column.
pub fn possession_date(raw: &str) -> Option<NaiveDate> {
    to_calendar_date(strip_time_of_day(raw))
}

fn bare_year(input: &str) -> Option<i32> {
    let year = match input.parse::<i32>() {
        Ok(y) => y,
        Err(_) => {
            let f = input.parse::<f64>().ok()?;
            if f.fract() != 0.0 {
                return None;
            }
            f as i32
        }
    };
    YEAR_RANGE.contains(&year).then_some(year)
}

fn month_year(input: &str) -> Option<NaiveDate> {
    let numeric = [
        (format!("{input}-01"), "%Y-%m-%d"),
        (format!("{input}/01"), "%Y/%m/%d"),
        (format!("01-{input}"), "%d-%m-%Y"),
        (format!("01/{input}"), "%d/%m/%Y"),
    ];
    for (text, fmt) in &numeric {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    // chrono's %Y takes a sign, so "Dec-2024" must not reach it with the dash.
    let cleaned = input.replace([',', '-', '/'], " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for fmt in ["%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {cleaned}"), fmt) {
            return Some(date);
        }
    }

    // "Sept 2025" is common in listings but not a chrono abbreviation.
    let (month, year) = cleaned.split_once(' ')?;
    let month = month.get(..3).filter(|m| m.chars().all(|c| c.is_ascii_alphabetic()))?;
    NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %b %Y").ok()
}
