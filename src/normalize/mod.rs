//! Text normalisation shared by extraction, filtering and data preparation.
//!
//! - **[`dates`]**: possession dates to calendar dates.
//! - **[`money`]**: lakh/crore amounts to rupees.
//! - unit types ("three bhk" -> "3BHK") and small number words live here.

pub mod dates;
pub mod money;

const NUMBER_WORDS: [(&str, u32); 10] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// Parses "3" or "three" into a count.
pub fn parse_count(token: &str) -> Option<u32> {
    let token = token.trim().to_ascii_lowercase();
    if let Ok(n) = token.parse::<u32>() {
        return Some(n);
    }
    NUMBER_WORDS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, n)| *n)
}

/// Canonical `"<N>BHK"` token for a bedroom count.
pub fn unit_type(bedrooms: u32) -> String {
    format!("{bedrooms}BHK")
}

/// Normalises unit-type phrasing ("3 bhk", "three BHK", "3bhk") to `"3BHK"`.
/// Text that does not look like a BHK count is upper-cased and returned as is.
pub fn normalize_unit_type(raw: &str) -> String {
    let compact: String = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let head = compact
        .trim_end_matches("bhk")
        .trim_end_matches('-')
        .trim();
    match parse_count(head) {
        Some(n) if compact.ends_with("bhk") => unit_type(n),
        _ => raw.trim().to_ascii_uppercase(),
    }
}
