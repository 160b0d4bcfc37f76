//! In-memory listings dataset loaded from the cleaned CSV.
//!
//! The whole file is read once at start-up and never mutated afterwards.
//! Rows are addressed by [`RowId`], their position in the file.

pub mod prepare;

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{FurnishedType, ListingType, ProjectStatus, PropertyRecord, RowId};

/// Header of the cleaned listings file, in file order.
pub const COLUMNS: [&str; 21] = [
    "projectName",
    "status",
    "possessionDate",
    "fullAddress",
    "pincode",
    "type",
    "carpetArea",
    "price",
    "bathrooms",
    "balcony",
    "listingType",
    "furnishedType",
    "projectCategory",
    "projectType",
    "propertyCategory",
    "landmark",
    "cityId",
    "localityId",
    "subLocalityId",
    "propertyImages",
    "floorPlanImage",
];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<PropertyRecord>,
}

impl Dataset {
    /// Load the cleaned listings CSV. Every column in [`COLUMNS`] must be present.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|e| DatasetError::Open {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(path = %path.display(), rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h, i))
            .collect();
        let mut positions = [0usize; COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = *index
                .get(name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;
        }

        let mut records = Vec::new();
        let mut coerced = 0usize;
        for row in rdr.records() {
            let row = row?;
            let cell = |col: usize| cell_text(row.get(positions[col]).unwrap_or(""));
            let mut num = |col: usize| {
                let raw = cell(col)?;
                let parsed = raw.parse::<f64>().ok();
                if parsed.is_none() {
                    coerced += 1;
                }
                parsed
            };

            let carpet_area = num(6);
            let price = num(7);
            let bathrooms = num(8).and_then(as_count);
            let balcony = num(9).and_then(as_count);

            records.push(PropertyRecord {
                project_name: cell(0),
                status: cell(1)
                    .map(|s| ProjectStatus::parse(&s))
                    .unwrap_or_default(),
                possession_date: cell(2),
                full_address: cell(3),
                pincode: cell(4).map(|p| p.trim_end_matches(".0").to_string()),
                unit_type: cell(5),
                carpet_area,
                price,
                bathrooms,
                balcony,
                listing_type: cell(10)
                    .map(|s| ListingType::parse(&s))
                    .unwrap_or_default(),
                furnished_type: cell(11).map(|s| FurnishedType::parse(&s)),
                project_category: cell(12),
                project_type: cell(13),
                property_category: cell(14),
                landmark: cell(15),
                city_id: cell(16),
                locality_id: cell(17),
                sub_locality_id: cell(18),
                property_images: cell(19),
                floor_plan_image: cell(20),
            });
        }

        if coerced > 0 {
            tracing::debug!(cells = coerced, "non-numeric cells read as missing");
        }

        Ok(Self { records })
    }

    pub fn from_records(records: Vec<PropertyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&PropertyRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    /// Every row id, ascending.
    pub fn all_rows(&self) -> Vec<RowId> {
        (0..self.records.len()).collect()
    }

    /// Row ids whose record satisfies `pred`, ascending.
    pub fn select<F>(&self, pred: F) -> Vec<RowId>
    where
        F: Fn(&PropertyRecord) -> bool,
    {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| pred(r))
            .map(|(id, _)| id)
            .collect()
    }

    /// Resolve row ids to records, skipping ids outside the dataset.
    pub fn resolve<'a>(
        &'a self,
        rows: &'a [RowId],
    ) -> impl Iterator<Item = &'a PropertyRecord> + 'a {
        rows.iter().filter_map(|id| self.records.get(*id))
    }
}

/// Empty cells and spreadsheet null markers read as missing.
fn cell_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    match trimmed {
        "" => None,
        s if s.eq_ignore_ascii_case("nan")
            || s.eq_ignore_ascii_case("none")
            || s.eq_ignore_ascii_case("null") =>
        {
            None
        }
        s => Some(s.to_string()),
    }
}

fn as_count(n: f64) -> Option<u32> {
    (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as u32)
}
