//! Per-field filters.
//!
//! Each [`FieldKind`] inspects one key of the [`FilterSet`]. When the key is
//! absent the outcome is [`FieldOutcome::Unconstrained`]; otherwise it is the
//! ascending list of matching row ids, which may be empty. Filters are pure
//! functions over the shared dataset and never see each other's output.

pub mod possession;
pub mod price;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::dataset::Dataset;
use crate::model::{FilterKey, FilterSet, RowId};

/// The nine filterable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Status,
    UnitType,
    ListingType,
    FurnishedType,
    CarpetArea,
    Price,
    PossessionDate,
    Bathrooms,
    Balcony,
}

impl FieldKind {
    pub const ALL: [FieldKind; 9] = [
        Self::Status,
        Self::UnitType,
        Self::ListingType,
        Self::FurnishedType,
        Self::CarpetArea,
        Self::Price,
        Self::PossessionDate,
        Self::Bathrooms,
        Self::Balcony,
    ];

    /// Extraction key this filter reads.
    pub fn key(self) -> FilterKey {
        match self {
            Self::Status => FilterKey::Status,
            Self::UnitType => FilterKey::UnitType,
            Self::ListingType => FilterKey::ListingType,
            Self::FurnishedType => FilterKey::FurnishedType,
            Self::CarpetArea => FilterKey::CarpetArea,
            Self::Price => FilterKey::Price,
            Self::PossessionDate => FilterKey::PossessionDate,
            Self::Bathrooms => FilterKey::Bathrooms,
            Self::Balcony => FilterKey::Balcony,
        }
    }

    /// Name of the output slot this filter writes.
    pub fn slot(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::UnitType => "type",
            Self::ListingType => "listing",
            Self::FurnishedType => "furnished",
            Self::CarpetArea => "area",
            Self::Price => "price",
            Self::PossessionDate => "possession",
            Self::Bathrooms => "bathrooms",
            Self::Balcony => "balcony",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key().as_str())
    }
}

/// Result of one per-field filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// The query said nothing about this field.
    Unconstrained,
    /// Rows satisfying the field's constraint, ascending; may be empty.
    Matched(Vec<RowId>),
}

impl FieldOutcome {
    pub fn rows(&self) -> Option<&[RowId]> {
        match self {
            Self::Unconstrained => None,
            Self::Matched(rows) => Some(rows),
        }
    }
}

/// Run the filter for `kind` against the full dataset.
pub fn apply(kind: FieldKind, filters: &FilterSet, dataset: &Dataset) -> FieldOutcome {
    let rows = match kind {
        FieldKind::Status => filters
            .status
            .as_ref()
            .map(|want| dataset.select(|r| &r.status == want)),
        FieldKind::UnitType => filters
            .unit_type
            .as_deref()
            .map(|want| dataset.select(|r| text_eq(r.unit_type.as_deref(), want))),
        FieldKind::ListingType => filters
            .listing_type
            .as_ref()
            .map(|want| dataset.select(|r| &r.listing_type == want)),
        FieldKind::FurnishedType => filters
            .furnished_type
            .as_ref()
            .map(|want| dataset.select(|r| r.furnished_type.as_ref() == Some(want))),
        FieldKind::CarpetArea => filters
            .carpet_area
            .map(|want| dataset.select(|r| r.carpet_area == Some(want))),
        FieldKind::Price => filters
            .price
            .map(|want| dataset.select(|r| price::matches(&want, r.price))),
        FieldKind::PossessionDate => filters
            .possession_date
            .map(|target| dataset.select(|r| possession::before(r, target))),
        FieldKind::Bathrooms => filters
            .bathrooms
            .map(|want| dataset.select(|r| r.bathrooms == Some(want))),
        FieldKind::Balcony => filters
            .balcony
            .map(|want| dataset.select(|r| r.balcony == Some(want))),
    };

    match rows {
        Some(rows) => FieldOutcome::Matched(rows),
        None => FieldOutcome::Unconstrained,
    }
}

/// Trimmed, case-insensitive text equality; missing values never match.
fn text_eq(value: Option<&str>, want: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(want.trim()))
}
