//! Listing records as loaded from the cleaned dataset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a record in the loaded dataset. Stable for the life of the
/// process and used as row identity everywhere results are combined.
pub type RowId = usize;

/// Construction status of the project a listing belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    UnderConstruction,
    ReadyToMove,
    #[default]
    Unknown,
    /// Any other label found in the data, kept verbatim.
    Other(String),
}

impl ProjectStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UnderConstruction => "UNDER_CONSTRUCTION",
            Self::ReadyToMove => "READY_TO_MOVE",
            Self::Unknown => "UNKNOWN",
            Self::Other(s) => s,
        }
    }

    /// Case-insensitive parse; unrecognised labels become `Other`.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "UNDER_CONSTRUCTION" => Self::UnderConstruction,
            "READY_TO_MOVE" => Self::ReadyToMove,
            "UNKNOWN" | "" => Self::Unknown,
            _ => Self::Other(upper),
        }
    }
}

impl From<String> for ProjectStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ProjectStatus> for String {
    fn from(value: ProjectStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a listing is offered for sale or for rent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ListingType {
    #[default]
    Sell,
    Rent,
    Other(String),
}

impl ListingType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sell => "Sell",
            Self::Rent => "Rent",
            Self::Other(s) => s,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("sell") || trimmed.is_empty() {
            Self::Sell
        } else if trimmed.eq_ignore_ascii_case("rent") {
            Self::Rent
        } else {
            Self::Other(trimmed.to_ascii_uppercase())
        }
    }
}

impl From<String> for ListingType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ListingType> for String {
    fn from(value: ListingType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Furnishing level of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FurnishedType {
    Furnished,
    SemiFurnished,
    Unfurnished,
    Other(String),
}

impl FurnishedType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Furnished => "FURNISHED",
            Self::SemiFurnished => "SEMI_FURNISHED",
            Self::Unfurnished => "UNFURNISHED",
            Self::Other(s) => s,
        }
    }

    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "FURNISHED" => Self::Furnished,
            "SEMI_FURNISHED" => Self::SemiFurnished,
            "UNFURNISHED" => Self::Unfurnished,
            _ => Self::Other(upper),
        }
    }
}

impl From<String> for FurnishedType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FurnishedType> for String {
    fn from(value: FurnishedType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FurnishedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the cleaned listings file.
///
/// Only the filterable columns are typed; descriptive columns are carried
/// through untouched so they can be shown in answers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub project_name: Option<String>,
    pub status: ProjectStatus,
    /// Raw possession date text; resolved by the possession filter on demand.
    pub possession_date: Option<String>,
    pub full_address: Option<String>,
    pub pincode: Option<String>,
    #[serde(rename = "type")]
    pub unit_type: Option<String>,
    pub carpet_area: Option<f64>,
    pub price: Option<f64>,
    pub bathrooms: Option<u32>,
    pub balcony: Option<u32>,
    pub listing_type: ListingType,
    pub furnished_type: Option<FurnishedType>,
    pub project_category: Option<String>,
    pub project_type: Option<String>,
    pub property_category: Option<String>,
    pub landmark: Option<String>,
    pub city_id: Option<String>,
    pub locality_id: Option<String>,
    pub sub_locality_id: Option<String>,
    pub property_images: Option<String>,
    pub floor_plan_image: Option<String>,
}

impl PropertyRecord {
    /// Short label used in logs and plain-text output.
    pub fn label(&self) -> String {
        match (&self.project_name, &self.unit_type) {
            (Some(name), Some(t)) => format!("{name} ({t})"),
            (Some(name), None) => name.clone(),
            (None, Some(t)) => t.clone(),
            (None, None) => "Unnamed listing".to_string(),
        }
    }
}
