//! Rendering of search results.
//!
//! - Markdown - header plus one table row per listing
//! - JSON - filters, counts and full records for programmatic use
//! - Plain Text - simple, copy-paste friendly format

use chrono::Utc;
use itertools::Itertools;

use crate::model::{FilterSet, PropertyRecord};
use crate::normalize::money::format_rupees;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// Markdown table
    #[default]
    Markdown,
    /// JSON document
    Json,
    /// Plain text
    #[value(name = "text")]
    PlainText,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Json => "JSON",
            Self::PlainText => "Plain Text",
        }
    }
}

/// Options for export customization
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Query string (for header/metadata)
    pub query: Option<String>,
    /// Maximum rows rendered (0 = unlimited); the total is always reported
    pub max_rows: usize,
    /// Maximum characters per text cell (0 = unlimited)
    pub max_cell_len: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            query: None,
            max_rows: 0,
            max_cell_len: 60,
        }
    }
}

/// One query's results as handed to the exporters.
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    pub filters: &'a FilterSet,
    pub records: Vec<&'a PropertyRecord>,
    pub constrained: bool,
}

impl ResultView<'_> {
    fn shown(&self, options: &ExportOptions) -> &[&PropertyRecord] {
        match options.max_rows {
            0 => &self.records,
            n => &self.records[..self.records.len().min(n)],
        }
    }
}

/// Export search results to the specified format
pub fn export_results(
    view: &ResultView<'_>,
    format: ExportFormat,
    options: &ExportOptions,
) -> String {
    tracing::debug!(format = format.name(), rows = view.records.len(), "exporting results");
    match format {
        ExportFormat::Markdown => export_markdown(view, options),
        ExportFormat::Json => export_json(view, options),
        ExportFormat::PlainText => export_plain_text(view, options),
    }
}

/// Escape special Markdown characters to prevent formatting issues or injection.
fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('`', "\\`")
}

fn filter_summary(filters: &FilterSet) -> String {
    if filters.is_empty() {
        return "none".to_string();
    }
    filters.keys().iter().map(|k| k.as_str()).join(", ")
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("-")
}

fn price_text(record: &PropertyRecord) -> String {
    record.price.map(format_rupees).unwrap_or_else(|| "-".to_string())
}

fn area_text(record: &PropertyRecord) -> String {
    record
        .carpet_area
        .map(|a| format!("{a} sqft"))
        .unwrap_or_else(|| "-".to_string())
}

/// Export to Markdown format
fn export_markdown(view: &ResultView<'_>, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Property Search Results\n\n");

    if let Some(query) = &options.query {
        output.push_str(&format!("**Query:** `{}`\n\n", query.replace('`', "")));
    }

    output.push_str(&format!(
        "**Results:** {} | **Filters:** {} | **Exported:** {}\n\n",
        view.records.len(),
        filter_summary(view.filters),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if !view.constrained {
        output.push_str("_No constraints recognised; showing unfiltered listings._\n\n");
    }

    let shown = view.shown(options);
    if shown.is_empty() {
        output.push_str("No matching listings.\n");
        return output;
    }

    output.push_str("| # | Project | Type | Status | Listing | Price | Carpet Area | Possession | Address |\n");
    output.push_str("|---|---------|------|--------|---------|-------|-------------|------------|---------|\n");
    for (i, record) in shown.iter().enumerate() {
        let cell = |text: &str| escape_markdown(&truncate_text(text, options.max_cell_len));
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            cell(or_dash(record.project_name.as_deref())),
            cell(or_dash(record.unit_type.as_deref())),
            cell(record.status.as_str()),
            cell(record.listing_type.as_str()),
            cell(&price_text(record)),
            cell(&area_text(record)),
            cell(or_dash(record.possession_date.as_deref())),
            cell(or_dash(record.full_address.as_deref())),
        ));
    }

    if shown.len() < view.records.len() {
        output.push_str(&format!(
            "\n_{} more not shown._\n",
            view.records.len() - shown.len()
        ));
    }

    output
}

/// Export to JSON format
fn export_json(view: &ResultView<'_>, options: &ExportOptions) -> String {
    let export_data = serde_json::json!({
        "query": options.query,
        "filters": view.filters.to_json(),
        "constrained": view.constrained,
        "count": view.records.len(),
        "exported_at": Utc::now().to_rfc3339(),
        "results": view.shown(options),
    });

    serde_json::to_string_pretty(&export_data).unwrap_or_else(|_| "{}".to_string())
}

/// Export to plain text format
fn export_plain_text(view: &ResultView<'_>, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("PROPERTY SEARCH RESULTS\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    if let Some(query) = &options.query {
        output.push_str(&format!("Query: {query}\n"));
    }

    output.push_str(&format!(
        "Results: {} | Filters: {}\n",
        view.records.len(),
        filter_summary(view.filters)
    ));

    if !view.constrained {
        output.push_str("No constraints recognised; showing unfiltered listings.\n");
    }

    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let shown = view.shown(options);
    if shown.is_empty() {
        output.push_str("No matching listings.\n");
        return output;
    }

    for (i, record) in shown.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", i + 1, record.label()));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        output.push_str(&format!("Status: {}\n", record.status));
        output.push_str(&format!("Listing: {}\n", record.listing_type));
        output.push_str(&format!("Price: {}\n", price_text(record)));
        output.push_str(&format!("Carpet area: {}\n", area_text(record)));
        if let Some(furnished) = &record.furnished_type {
            output.push_str(&format!("Furnishing: {furnished}\n"));
        }
        if let Some(date) = &record.possession_date {
            output.push_str(&format!("Possession: {date}\n"));
        }
        if let Some(address) = &record.full_address {
            output.push_str(&format!("Address: {address}\n"));
        }

        output.push('\n');
    }

    output
}

/// Truncate text to max length (in characters), adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return text.to_string();
    }

    let char_count = text.chars().count();
    if char_count <= max_len {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
