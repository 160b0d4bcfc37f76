//! The sparse filter set extracted from a query.
//!
//! Every key of the extraction vocabulary maps to one `Option` field; `None`
//! always means "not mentioned", never "match nothing". Model output is turned
//! into a [`FilterSet`] through [`FilterSet::from_json`], which drops keys
//! outside the vocabulary and rejects values of the wrong shape.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use super::types::{FurnishedType, ListingType, ProjectStatus};
use crate::normalize::{self, dates};

/// Errors raised while validating an extracted filter mapping.
#[derive(Error, Debug, PartialEq)]
pub enum FilterSetError {
    #[error("extraction output is not a JSON object")]
    NotAnObject,

    #[error("invalid value for '{key}': {reason}")]
    InvalidField { key: FilterKey, reason: String },
}

/// The fixed extraction vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    Status,
    PossessionDate,
    FullAddress,
    Pincode,
    UnitType,
    CarpetArea,
    Price,
    Bathrooms,
    Balcony,
    ListingType,
    FurnishedType,
    ProjectCategory,
    ProjectType,
}

impl FilterKey {
    pub const ALL: [FilterKey; 13] = [
        Self::Status,
        Self::PossessionDate,
        Self::FullAddress,
        Self::Pincode,
        Self::UnitType,
        Self::CarpetArea,
        Self::Price,
        Self::Bathrooms,
        Self::Balcony,
        Self::ListingType,
        Self::FurnishedType,
        Self::ProjectCategory,
        Self::ProjectType,
    ];

    /// Wire name used by the model and the dataset header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::PossessionDate => "possessionDate",
            Self::FullAddress => "fullAddress",
            Self::Pincode => "pincode",
            Self::UnitType => "type",
            Self::CarpetArea => "carpetArea",
            Self::Price => "price",
            Self::Bathrooms => "bathrooms",
            Self::Balcony => "balcony",
            Self::ListingType => "listingType",
            Self::FurnishedType => "furnishedType",
            Self::ProjectCategory => "projectCategory",
            Self::ProjectType => "projectType",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price constraint: an exact amount or a two-sided range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PriceFilter {
    Exact(f64),
    Range { min: Option<f64>, max: Option<f64> },
}

impl PriceFilter {
    /// "under X": `{min: 0, max: X}`.
    pub fn at_most(max: f64) -> Self {
        Self::Range {
            min: Some(0.0),
            max: Some(max),
        }
    }

    /// "above X": `{min: X, max: null}`.
    pub fn at_least(min: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Filters extracted from one query. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possession_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carpet_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balcony: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub furnished_type: Option<FurnishedType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}

impl FilterSet {
    /// Whether the query mentioned `key` at all.
    pub fn contains(&self, key: FilterKey) -> bool {
        match key {
            FilterKey::Status => self.status.is_some(),
            FilterKey::PossessionDate => self.possession_date.is_some(),
            FilterKey::FullAddress => self.full_address.is_some(),
            FilterKey::Pincode => self.pincode.is_some(),
            FilterKey::UnitType => self.unit_type.is_some(),
            FilterKey::CarpetArea => self.carpet_area.is_some(),
            FilterKey::Price => self.price.is_some(),
            FilterKey::Bathrooms => self.bathrooms.is_some(),
            FilterKey::Balcony => self.balcony.is_some(),
            FilterKey::ListingType => self.listing_type.is_some(),
            FilterKey::FurnishedType => self.furnished_type.is_some(),
            FilterKey::ProjectCategory => self.project_category.is_some(),
            FilterKey::ProjectType => self.project_type.is_some(),
        }
    }

    /// Keys present in this set, in vocabulary order.
    pub fn keys(&self) -> Vec<FilterKey> {
        FilterKey::ALL
            .into_iter()
            .filter(|k| self.contains(*k))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Validates a model-produced mapping.
    ///
    /// Unknown keys are dropped and `null` values count as absent. A known key
    /// whose value has the wrong shape fails the whole extraction.
    pub fn from_json(value: &Value) -> Result<Self, FilterSetError> {
        let obj = value.as_object().ok_or(FilterSetError::NotAnObject)?;
        let mut set = FilterSet::default();

        for (name, raw) in obj {
            let Some(key) = FilterKey::from_wire(name) else {
                tracing::debug!(key = %name, "dropping key outside extraction vocabulary");
                continue;
            };
            if raw.is_null() {
                continue;
            }
            match key {
                FilterKey::Status => set.status = Some(ProjectStatus::parse(&text(key, raw)?)),
                FilterKey::PossessionDate => {
                    let s = text(key, raw)?;
                    let date = dates::to_calendar_date(&s)
                        .ok_or_else(|| invalid(key, format!("unresolvable date '{s}'")))?;
                    set.possession_date = Some(date);
                }
                FilterKey::FullAddress => set.full_address = Some(text(key, raw)?),
                FilterKey::Pincode => set.pincode = Some(pincode(raw)?),
                FilterKey::UnitType => {
                    set.unit_type = Some(normalize::normalize_unit_type(&text(key, raw)?))
                }
                FilterKey::CarpetArea => set.carpet_area = Some(number(key, raw)?),
                FilterKey::Price => set.price = Some(price(raw)?),
                FilterKey::Bathrooms => set.bathrooms = Some(count(key, raw)?),
                FilterKey::Balcony => set.balcony = Some(count(key, raw)?),
                FilterKey::ListingType => {
                    set.listing_type = Some(ListingType::parse(&text(key, raw)?))
                }
                FilterKey::FurnishedType => {
                    set.furnished_type = Some(FurnishedType::parse(&text(key, raw)?))
                }
                FilterKey::ProjectCategory => {
                    set.project_category = Some(text(key, raw)?.to_ascii_uppercase())
                }
                FilterKey::ProjectType => {
                    set.project_type = Some(text(key, raw)?.to_ascii_uppercase())
                }
            }
        }

        Ok(set)
    }
}

fn invalid(key: FilterKey, reason: impl Into<String>) -> FilterSetError {
    FilterSetError::InvalidField {
        key,
        reason: reason.into(),
    }
}

fn text(key: FilterKey, raw: &Value) -> Result<String, FilterSetError> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::String(_) => Err(invalid(key, "empty string")),
        other => Err(invalid(key, format!("expected a string, got {other}"))),
    }
}

fn number(key: FilterKey, raw: &Value) -> Result<f64, FilterSetError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(key, format!("unrepresentable number {n}"))),
        Value::String(s) => normalize::money::parse_number(s.trim())
            .ok_or_else(|| invalid(key, format!("expected a number, got '{s}'"))),
        other => Err(invalid(key, format!("expected a number, got {other}"))),
    }
}

fn count(key: FilterKey, raw: &Value) -> Result<u32, FilterSetError> {
    let n = number(key, raw)?;
    if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return Err(invalid(key, format!("expected a whole count, got {n}")));
    }
    Ok(n as u32)
}

fn pincode(raw: &Value) -> Result<String, FilterSetError> {
    let key = FilterKey::Pincode;
    match raw {
        Value::Number(n) if n.is_u64() => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(invalid(key, format!("expected a postal code, got {other}"))),
    }
}

fn price(raw: &Value) -> Result<PriceFilter, FilterSetError> {
    let key = FilterKey::Price;
    match raw {
        Value::Object(obj) => {
            let bound = |name: &str| -> Result<Option<f64>, FilterSetError> {
                match obj.get(name) {
                    None | Some(Value::Null) => Ok(None),
                    Some(v) => number(key, v).map(Some),
                }
            };
            let min = bound("min")?;
            let max = bound("max")?;
            if min.is_none() && max.is_none() {
                return Err(invalid(key, "range has neither min nor max"));
            }
            if let (Some(lo), Some(hi)) = (min, max)
                && lo > hi
            {
                return Err(invalid(key, format!("min {lo} exceeds max {hi}")));
            }
            Ok(PriceFilter::Range { min, max })
        }
        Value::Number(_) => number(key, raw).map(PriceFilter::Exact),
        Value::String(s) => normalize::money::parse_rupees(s)
            .map(PriceFilter::Exact)
            .ok_or_else(|| invalid(key, format!("unparseable amount '{s}'"))),
        other => Err(invalid(key, format!("expected a number or range, got {other}"))),
    }
}
