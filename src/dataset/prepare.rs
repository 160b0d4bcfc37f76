//! Builds the cleaned listings file from the four raw project tables.
//!
//! `project.csv` is left-joined with `ProjectAddress.csv` and
//! `ProjectConfiguration.csv` on the project id, then with
//! `ProjectConfigurationVariant.csv` on the configuration id. Prices are
//! normalised to rupees, carpet area is coerced to a number, and missing
//! `status` / `listingType` values get their defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::COLUMNS;
use crate::normalize::money::clean_price;

pub const PROJECT_TABLE: &str = "project.csv";
pub const ADDRESS_TABLE: &str = "ProjectAddress.csv";
pub const CONFIGURATION_TABLE: &str = "ProjectConfiguration.csv";
pub const VARIANT_TABLE: &str = "ProjectConfigurationVariant.csv";

/// File name the loader looks for by default.
pub const CLEANED_FILE: &str = "cleaned_master_for_chatbot.csv";

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write cleaned dataset: {0}")]
    Write(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table {table} has no '{column}' column to join on")]
    MissingKey { table: String, column: String },
}

/// What a preparation run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareSummary {
    pub rows: usize,
    /// Output columns that no input table provided; written empty.
    pub missing_columns: Vec<String>,
}

/// An untyped CSV table held in memory.
#[derive(Debug, Clone, Default)]
struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, PrepareError> {
        let read_err = |source: csv::Error| PrepareError::Read {
            path: path.to_path_buf(),
            source,
        };
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_err)?;
        let headers: Vec<String> = rdr
            .headers()
            .map_err(read_err)?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(read_err)?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::debug!(table = %name, rows = rows.len(), "table read");
        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn key_column(&self, name: &str) -> Result<usize, PrepareError> {
        self.column(name).ok_or_else(|| PrepareError::MissingKey {
            table: self.name.clone(),
            column: name.to_string(),
        })
    }

    /// Left join; right-hand columns whose names clash with ours get `suffix`.
    fn left_join(
        &self,
        right: &Table,
        left_on: &str,
        right_on: &str,
        suffix: &str,
    ) -> Result<Table, PrepareError> {
        let left_key = self.key_column(left_on)?;
        let right_key = right.key_column(right_on)?;

        let mut by_key: HashMap<String, Vec<&Vec<String>>> = HashMap::new();
        for row in &right.rows {
            let key = join_key(&row[right_key]);
            if !key.is_empty() {
                by_key.entry(key).or_default().push(row);
            }
        }

        let mut headers = self.headers.clone();
        for h in &right.headers {
            if self.headers.contains(h) {
                headers.push(format!("{h}{suffix}"));
            } else {
                headers.push(h.clone());
            }
        }

        let empty_right = vec![String::new(); right.headers.len()];
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match by_key.get(&join_key(&row[left_key])) {
                Some(matches) => {
                    for m in matches {
                        let mut joined = row.clone();
                        joined.extend(m.iter().cloned());
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row.clone();
                    joined.extend(empty_right.iter().cloned());
                    rows.push(joined);
                }
            }
        }

        Ok(Table {
            name: format!("{}+{}", self.name, right.name),
            headers,
            rows,
        })
    }
}

/// Ids exported through spreadsheets often arrive as "12.0".
fn join_key(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(".0")
        .unwrap_or(trimmed)
        .to_string()
}

fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Join the four raw tables in `input_dir` and write the cleaned file to `output`.
pub fn prepare(input_dir: &Path, output: &Path) -> Result<PrepareSummary, PrepareError> {
    let projects = Table::read(&input_dir.join(PROJECT_TABLE))?;
    let addresses = Table::read(&input_dir.join(ADDRESS_TABLE))?;
    let configs = Table::read(&input_dir.join(CONFIGURATION_TABLE))?;
    let variants = Table::read(&input_dir.join(VARIANT_TABLE))?;

    let merged = projects
        .left_join(&addresses, "id", "projectId", "_address")?
        .left_join(&configs, "id", "projectId", "_config")?;
    let config_id = if merged.column("id_config").is_some() {
        "id_config"
    } else {
        "id"
    };
    let merged = merged.left_join(&variants, config_id, "configurationId", "_variant")?;

    let positions: Vec<Option<usize>> = COLUMNS.iter().map(|c| merged.column(c)).collect();
    let missing_columns: Vec<String> = COLUMNS
        .iter()
        .zip(&positions)
        .filter(|(_, p)| p.is_none())
        .map(|(c, _)| c.to_string())
        .collect();
    if !missing_columns.is_empty() {
        tracing::warn!(
            columns = ?missing_columns,
            "source tables lack columns; writing them empty"
        );
    }

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record(COLUMNS)?;

    for row in &merged.rows {
        let out: Vec<String> = COLUMNS
            .iter()
            .zip(&positions)
            .map(|(name, pos)| {
                let raw = pos.map(|i| row[i].as_str()).unwrap_or("");
                clean_cell(name, raw)
            })
            .collect();
        wtr.write_record(&out)?;
    }
    wtr.flush()?;

    tracing::info!(
        rows = merged.rows.len(),
        output = %output.display(),
        "cleaned dataset written"
    );

    Ok(PrepareSummary {
        rows: merged.rows.len(),
        missing_columns,
    })
}

fn clean_cell(column: &str, raw: &str) -> String {
    match column {
        "price" => clean_price(raw).map(format_number).unwrap_or_default(),
        "carpetArea" => raw
            .trim()
            .parse::<f64>()
            .ok()
            .map(format_number)
            .unwrap_or_default(),
        "status" if raw.trim().is_empty() => "UNKNOWN".to_string(),
        "listingType" if raw.trim().is_empty() => "Sell".to_string(),
        _ => raw.to_string(),
    }
}
