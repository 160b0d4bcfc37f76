use chrono::NaiveDate;

use crate::model::PropertyRecord;
use crate::normalize::dates;

/// Whether the record's possession date resolves and falls strictly before
/// `target`. Records with no resolvable date are excluded.
pub fn before(record: &PropertyRecord, target: NaiveDate) -> bool {
    record
        .possession_date
        .as_deref()
        .and_then(dates::possession_date)
        .is_some_and(|date| date < target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_date(raw: Option<&str>) -> PropertyRecord {
        PropertyRecord {
            possession_date: raw.map(str::to_string),
            ..Default::default()
        }
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn test_strictly_earlier_only() {
        assert!(before(&with_date(Some("2025-12-31 00:00:00")), target()));
        assert!(!before(&with_date(Some("2026-01-01")), target()));
        assert!(!before(&with_date(Some("2027-06-30")), target()));
    }

    #[test]
    fn test_loose_formats() {
        assert!(before(&with_date(Some("2025")), target()));
        assert!(before(&with_date(Some("Dec 2025")), target()));
        assert!(before(&with_date(Some("handover in 2024")), target()));
    }

    #[test]
    fn test_dashed_and_slashed_month_years() {
        assert!(before(&with_date(Some("Dec-2024")), target()));
        assert!(!before(&with_date(Some("Mar-2030")), target()));
        assert!(before(&with_date(Some("12/2025")), target()));
        assert!(!before(&with_date(Some("2026/02")), target()));
    }

    #[test]
    fn test_unresolvable_dates_are_excluded() {
        assert!(!before(&with_date(None), target()));
        assert!(!before(&with_date(Some("TBD")), target()));
    }
}
