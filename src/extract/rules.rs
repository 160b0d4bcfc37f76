//! Offline extractor.
//!
//! Recognises the phrasing real-estate queries commonly use (BHK counts,
//! lakh/crore budgets, possession years, furnishing) without calling a model.
//! Where a query states something twice, the last statement wins.

use std::ops::Range;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{ExtractError, FilterExtractor};
use crate::model::{FilterSet, FurnishedType, ListingType, PriceFilter, ProjectStatus};
use crate::normalize::dates::to_calendar_date;
use crate::normalize::money::{AMOUNT, parse_number, to_rupees};
use crate::normalize::{parse_count, unit_type};

const COUNT: &str = r"(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten)";

static BHK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{COUNT}\s*-?\s*(?:bhk|bedrooms?|bed\s*rooms?)\b")).expect("valid regex")
});

static BATHROOMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{COUNT}\s+(?:bathrooms?|baths?|washrooms?|toilets?)\b"))
        .expect("valid regex")
});

static BALCONY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b{COUNT}\s+balcon(?:y|ies)\b")).expect("valid regex")
});

static CARPET_AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d[\d,]*(?:\.\d+)?)\s*(?:sq\.?\s*ft|sqft|sq\.?\s*feet|square\s+feet|sft)\b")
        .expect("valid regex")
});

static PRICE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<cur_a>₹|\brs\.?|\binr)?\s*(?P<a>\d[\d,]*(?:\.\d+)?)\s*(?P<unit_a>crores?|cr|lakhs?|lacs?|l)?\s*(?:-|to|and)\s*(?P<cur_b>₹|rs\.?|inr)?\s*(?P<b>\d[\d,]*(?:\.\d+)?)\s*(?P<unit_b>crores?|cr|lakhs?|lacs?|l)?\b",
    )
    .expect("valid regex")
});

static COMPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(not\s+more\s+than|less\s+than|under|below|up\s*to|maximum|max|within|more\s+than|greater\s+than|above|over|minimum|min|at\s+least|starting)\b",
    )
    .expect("valid regex")
});

static READY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bready[\s-]+to[\s-]+move\b|\bimmediate\s+possession\b|\balready\s+ready\b|\bready\s+possession\b")
        .expect("valid regex")
});

static UNDER_CONSTRUCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bunder[\s-]+construction\b").expect("valid regex"));

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid regex"));

static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?P<month>january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\.?,?\s+)?(?P<year>(?:19|20)\d{2})\b",
    )
    .expect("valid regex")
});

static LISTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(rent|rental|renting|lease|sale|sell|selling|buy|buying|resale|purchase)\b")
        .expect("valid regex")
});

static FURNISHING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(semi[\s-]?furnished|un[\s-]?furnished|furnished)\b").expect("valid regex")
});

static PINCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([1-9]\d{5})\b").expect("valid regex"));

static CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(standalone|complex|society|gated)\b").expect("valid regex"));

static PROJECT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(residential|commercial|shops?|offices?|showrooms?)\b").expect("valid regex")
});

// Runs against the original casing: place names are the capitalised words after a preposition.
static PLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:[Ii]n|[Nn]ear|[Aa]t|[Aa]round)\s+(?P<place>[A-Z][A-Za-z]+(?:[ ]+[A-Z][A-Za-z]+)*(?:,[ ]*[A-Z][A-Za-z]+(?:[ ]+[A-Z][A-Za-z]+)*)*)",
    )
    .expect("valid regex")
});

const MONTH_NAMES: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const NOT_PLACES: [&str; 4] = ["bhk", "ready", "under", "possession"];

/// Deterministic regex-based extractor for offline use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor;

impl RuleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract filters from `query`. Never fails; unrecognised text yields an
    /// empty set.
    pub fn parse(&self, query: &str) -> FilterSet {
        let lower = query.to_lowercase();
        let mut set = FilterSet::default();
        // Spans already claimed by prices and areas so their digits are not
        // read again as years or pincodes.
        let mut numeric_spans: Vec<Range<usize>> = Vec::new();

        if let Some((price, span)) = price(&lower) {
            set.price = Some(price);
            numeric_spans.extend(span);
        }

        if let Some(caps) = CARPET_AREA.captures_iter(&lower).last() {
            set.carpet_area = parse_number(&caps[1]);
        }
        numeric_spans.extend(CARPET_AREA.find_iter(&lower).map(|m| m.range()));

        set.unit_type = last_count(&BHK, &lower).map(unit_type);
        set.bathrooms = last_count(&BATHROOMS, &lower);
        set.balcony = last_count(&BALCONY, &lower);

        set.status = status(&lower);
        if set.status != Some(ProjectStatus::ReadyToMove) {
            set.possession_date = possession(&lower, &numeric_spans);
        }

        set.listing_type = LISTING
            .captures_iter(&lower)
            .last()
            .map(|caps| match &caps[1] {
                "rent" | "rental" | "renting" | "lease" => ListingType::Rent,
                _ => ListingType::Sell,
            });

        set.furnished_type = FURNISHING.captures_iter(&lower).last().map(|caps| {
            let word = caps[1].replace([' ', '-'], "");
            match word.as_str() {
                "semifurnished" => FurnishedType::SemiFurnished,
                "unfurnished" => FurnishedType::Unfurnished,
                _ => FurnishedType::Furnished,
            }
        });

        set.pincode = PINCODE
            .captures_iter(&lower)
            .filter_map(|caps| caps.get(1))
            .filter(|m| !overlaps(&numeric_spans, &m.range()))
            .last()
            .map(|m| m.as_str().to_string());

        set.project_category = CATEGORY.captures_iter(&lower).last().map(|caps| {
            let category = if &caps[1] == "standalone" { "STANDALONE" } else { "COMPLEX" };
            category.to_string()
        });

        set.project_type = PROJECT_TYPE.captures_iter(&lower).last().map(|caps| {
            let kind = if &caps[1] == "residential" { "RESIDENTIAL" } else { "COMMERCIAL" };
            kind.to_string()
        });

        set.full_address = place(query);
        set
    }
}

#[async_trait]
impl FilterExtractor for RuleExtractor {
    async fn extract(&self, query: &str) -> Result<FilterSet, ExtractError> {
        if query.trim().is_empty() {
            return Err(ExtractError::EmptyQuery);
        }
        let filters = self.parse(query);
        tracing::info!(keys = ?filters.keys(), "filters extracted by rules");
        Ok(filters)
    }
}

fn last_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures_iter(text)
        .filter_map(|caps| parse_count(&caps[1]))
        .last()
}

fn overlaps(spans: &[Range<usize>], range: &Range<usize>) -> bool {
    spans
        .iter()
        .any(|s| s.start < range.end && range.start < s.end)
}

fn status(text: &str) -> Option<ProjectStatus> {
    let ready = READY.find_iter(text).last().map(|m| m.start());
    let building = UNDER_CONSTRUCTION.find_iter(text).last().map(|m| m.start());
    match (ready, building) {
        (Some(r), Some(b)) if b > r => Some(ProjectStatus::UnderConstruction),
        (Some(_), _) => Some(ProjectStatus::ReadyToMove),
        (None, Some(_)) => Some(ProjectStatus::UnderConstruction),
        (None, None) => None,
    }
}

/// A budget plus the text spans it was read from.
fn price(text: &str) -> Option<(PriceFilter, Vec<Range<usize>>)> {
    for caps in PRICE_RANGE.captures_iter(text) {
        let has_marker = ["cur_a", "cur_b", "unit_b"]
            .iter()
            .any(|name| caps.name(name).is_some());
        if !has_marker {
            continue;
        }
        let unit_b = caps.name("unit_b").map(|m| m.as_str());
        let unit_a = caps.name("unit_a").map(|m| m.as_str()).or(unit_b);
        let (Some(a), Some(b)) = (parse_number(&caps["a"]), parse_number(&caps["b"])) else {
            continue;
        };
        let (min, max) = (to_rupees(a, unit_a), to_rupees(b, unit_b));
        if min <= max {
            let span = caps.get(0).map(|m| m.range()).into_iter().collect();
            return Some((PriceFilter::between(min, max), span));
        }
    }

    let caps = AMOUNT.captures_iter(text).find(|caps| {
        caps.name("cur").is_some() || caps.name("unit").is_some() || is_bare_budget(text, caps)
    })?;
    let whole = caps.get(0)?;
    let amount = to_rupees(
        parse_number(caps.name("num")?.as_str())?,
        caps.name("unit").map(|m| m.as_str()),
    );

    // "under construction" is a status, not a bound.
    let before = UNDER_CONSTRUCTION.replace_all(&text[..whole.start()], " ");
    let window: String = before
        .split_whitespace()
        .rev()
        .take(3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join(" ");
    let filter = match COMPARATOR.captures_iter(&window).last() {
        Some(cmp) if is_upper_bound(&cmp[1]) => PriceFilter::at_most(amount),
        Some(_) => PriceFilter::at_least(amount),
        None => PriceFilter::Exact(amount),
    };
    Some((filter, vec![whole.range()]))
}

/// A plain rupee figure ("under 500000") with a comparison word right before it.
fn is_bare_budget(text: &str, caps: &Captures<'_>) -> bool {
    let Some(num) = caps.name("num") else {
        return false;
    };
    let digits = num.as_str().bytes().filter(u8::is_ascii_digit).count();
    let looks_like_year =
        digits == 4 && (num.as_str().starts_with("19") || num.as_str().starts_with("20"));
    if digits < 4 || looks_like_year {
        return false;
    }
    if CARPET_AREA.find_iter(text).any(|m| overlaps(&[m.range()], &num.range())) {
        return false;
    }
    let before = text[..num.start()].trim_end();
    COMPARATOR
        .find_iter(before)
        .last()
        .is_some_and(|m| m.end() == before.len())
}

fn is_upper_bound(word: &str) -> bool {
    let word = word.split_whitespace().collect::<Vec<_>>().join(" ");
    matches!(
        word.as_str(),
        "not more than"
            | "less than"
            | "under"
            | "below"
            | "upto"
            | "up to"
            | "maximum"
            | "max"
            | "within"
    )
}

fn possession(text: &str, claimed: &[Range<usize>]) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures_iter(text).last()
        && let Some(date) = to_calendar_date(&caps[1])
    {
        return Some(date);
    }

    let caps = MONTH_YEAR
        .captures_iter(text)
        .filter(|caps| {
            caps.name("year")
                .is_some_and(|m| !overlaps(claimed, &m.range()))
        })
        .last()?;
    let year: i32 = caps["year"].parse().ok()?;
    let month = match caps.name("month") {
        Some(m) => {
            let prefix = m.as_str().get(..3)?;
            MONTHS.iter().position(|name| *name == prefix)? as u32 + 1
        }
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn place(query: &str) -> Option<String> {
    PLACE
        .captures_iter(query)
        .filter_map(|caps| caps.name("place"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|place| {
            let first = place
                .split([' ', ','])
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            let is_month =
                first.len() >= 3 && MONTH_NAMES.iter().any(|name| name.starts_with(&first));
            !is_month && !NOT_PLACES.contains(&first.as_str())
        })
        .last()
}
