//! Indian currency amounts: lakh/crore units to absolute rupees.

use once_cell::sync::Lazy;
use regex::Regex;

/// 1 lakh = 100,000 rupees.
pub const LAKH: f64 = 100_000.0;

/// 1 crore = 10,000,000 rupees.
pub const CRORE: f64 = 10_000_000.0;

/// A number with an optional currency marker and an optional lakh/crore unit.
pub(crate) static AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:(?P<cur>₹|\brs\.?|\binr)\s*)?(?P<num>\d[\d,]*(?:\.\d+)?)\s*(?P<unit>crores?|cr|lakhs?|lacs?|l)?\b",
    )
    .expect("valid regex")
});

static PER_AREA_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/?per\s*sq(?:\.|\s)?ft|psf|/sqft").expect("valid regex")
});

static APPROX_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:approx|around|estimated|est\.?)\b|~").expect("valid regex")
});

static NUMERIC_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(?:-|to)\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex")
});

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid regex"));

/// Multiplier for a lakh/crore unit token; `None` means plain rupees.
pub fn unit_multiplier(unit: Option<&str>) -> f64 {
    match unit.map(|u| u.to_ascii_lowercase()) {
        Some(u) if u.starts_with("cr") => CRORE,
        Some(u) if u.starts_with('l') => LAKH,
        _ => 1.0,
    }
}

/// Parses a single amount such as "1.2 Cr", "80 lakh", "35 L" or "₹1,50,00,000"
/// into whole rupees.
pub fn parse_rupees(text: &str) -> Option<f64> {
    let caps = AMOUNT.captures(text.trim())?;
    let num = parse_number(caps.name("num")?.as_str())?;
    let unit = caps.name("unit").map(|m| m.as_str());
    Some(to_rupees(num, unit))
}

/// Applies the unit multiplier and rounds to whole rupees.
pub fn to_rupees(num: f64, unit: Option<&str>) -> f64 {
    (num * unit_multiplier(unit)).round()
}

/// Parses a number that may carry Indian or western digit grouping.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok()
}

/// Normalises free-form price text from the raw project tables into rupees.
///
/// - currency symbols, `inr`, grouping commas and per-sqft suffixes are dropped
/// - "approx"/"around" style qualifiers are ignored
/// - ranges ("50-60 lakh", "1 to 1.2 cr") resolve to their midpoint
/// - `cr`/`crore` multiply by 1e7, `lakh`/`lac` by 1e5
/// - bare numbers are taken as rupees
pub fn clean_price(value: &str) -> Option<f64> {
    let s = value.trim().to_lowercase();
    if s.is_empty() || s == "nan" {
        return None;
    }
    let s = s.replace('₹', "").replace(',', "").replace("inr", "");
    let s = PER_AREA_SUFFIX.replace_all(&s, "");
    let s = APPROX_WORDS.replace_all(&s, "");
    let s = s.trim();

    let multiplier = if s.contains("cr") || s.contains("crore") {
        CRORE
    } else if s.contains("lakh") || s.contains("lac") {
        LAKH
    } else {
        1.0
    };

    if let Some(caps) = NUMERIC_RANGE.captures(s) {
        let a: f64 = caps[1].parse().ok()?;
        let b: f64 = caps[2].parse().ok()?;
        return Some((a + b) / 2.0 * multiplier);
    }

    let num: f64 = FIRST_NUMBER.find(s)?.as_str().parse().ok()?;
    Some(num * multiplier)
}

/// Human-readable rupee amount: "₹1.20 Cr", "₹85.00 L", or whole rupees below a lakh.
pub fn format_rupees(amount: f64) -> String {
    if amount >= CRORE {
        format!("₹{:.2} Cr", amount / CRORE)
    } else if amount >= LAKH {
        format!("₹{:.2} L", amount / LAKH)
    } else {
        format!("₹{amount:.0}")
    }
}
