//! Query orchestration: extract, fan out to the field filters, intersect,
//! then optionally synthesise an answer.
//!
//! The nine filters are independent pure functions over the shared dataset,
//! so they run on the rayon pool and meet again in a map keyed by
//! [`FieldKind`]. A failure in extraction or synthesis aborts the whole
//! query; there are no partial answers.

pub mod intersect;

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{Instrument, info, info_span};

use crate::dataset::Dataset;
use crate::extract::{ExtractError, FilterExtractor};
use crate::filter::{self, FieldKind, FieldOutcome};
use crate::model::{FilterSet, PropertyRecord};
use crate::synth::{ResponseSynthesizer, SynthesisError, SynthesisInput};

pub use intersect::{ResultSet, intersect};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("filter extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("answer synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("no synthesiser configured")]
    NoSynthesizer,

    #[error("filter task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Filters and surviving rows for one query.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub filters: FilterSet,
    pub results: ResultSet,
}

impl SearchOutcome {
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> Vec<&'a PropertyRecord> {
        dataset.resolve(&self.results.rows).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub outcome: SearchOutcome,
}

/// Run every field filter against `dataset` in parallel.
pub fn run_filters(filters: &FilterSet, dataset: &Dataset) -> BTreeMap<FieldKind, FieldOutcome> {
    FieldKind::ALL
        .par_iter()
        .map(|kind| (*kind, filter::apply(*kind, filters, dataset)))
        .collect()
}

pub struct Pipeline {
    dataset: Arc<Dataset>,
    extractor: Arc<dyn FilterExtractor>,
    synthesizer: Option<Arc<dyn ResponseSynthesizer>>,
}

impl Pipeline {
    pub fn new(dataset: Arc<Dataset>, extractor: Arc<dyn FilterExtractor>) -> Self {
        Self {
            dataset,
            extractor,
            synthesizer: None,
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn ResponseSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Extract filters from `query` and return the rows satisfying all of them.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, PipelineError> {
        let span = info_span!("search", query_chars = query.len());
        async {
            let filters = self.extractor.extract(query).await?;
            info!(keys = ?filters.keys(), "extraction complete");

            let dataset = Arc::clone(&self.dataset);
            let task_filters = filters.clone();
            let results = tokio::task::spawn_blocking(move || {
                let slots = run_filters(&task_filters, &dataset);
                for (kind, outcome) in &slots {
                    if let Some(rows) = outcome.rows() {
                        tracing::debug!(slot = %kind, rows = rows.len(), "filter matched");
                    }
                }
                intersect(&slots, &task_filters, dataset.len())
            })
            .await?;

            info!(
                rows = results.len(),
                applied = results.applied.len(),
                constrained = results.is_constrained(),
                "intersection complete"
            );
            Ok(SearchOutcome { filters, results })
        }
        .instrument(span)
        .await
    }

    /// Full query: search, then a natural-language answer over the results.
    pub async fn answer(&self, query: &str) -> Result<Answer, PipelineError> {
        let synthesizer = self
            .synthesizer
            .as_ref()
            .ok_or(PipelineError::NoSynthesizer)?;
        let outcome = self.search(query).await?;

        let text = {
            let input = SynthesisInput {
                query,
                filters: &outcome.filters,
                records: outcome.records(&self.dataset),
                constrained: outcome.results.is_constrained(),
            };
            synthesizer
                .synthesize(&input)
                .instrument(info_span!("synthesize", records = input.records.len()))
                .await?
        };
        info!(answer_chars = text.len(), "answer ready");
        Ok(Answer { text, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RuleExtractor;
    use crate::model::{ListingType, ProjectStatus};

    fn record(status: ProjectStatus, unit: &str, listing: ListingType) -> PropertyRecord {
        PropertyRecord {
            status,
            unit_type: Some(unit.to_string()),
            listing_type: listing,
            ..Default::default()
        }
    }

    fn pipeline() -> Pipeline {
        let dataset = Dataset::from_records(vec![
            record(ProjectStatus::ReadyToMove, "3BHK", ListingType::Sell),
            record(ProjectStatus::UnderConstruction, "3BHK", ListingType::Sell),
            record(ProjectStatus::ReadyToMove, "2BHK", ListingType::Rent),
            record(ProjectStatus::ReadyToMove, "3BHK", ListingType::Sell),
        ]);
        Pipeline::new(Arc::new(dataset), Arc::new(RuleExtractor::new()))
    }

    #[test]
    fn test_run_filters_fills_every_slot() {
        let filters = FilterSet {
            status: Some(ProjectStatus::ReadyToMove),
            ..Default::default()
        };
        let slots = run_filters(&filters, pipeline().dataset());
        assert_eq!(slots.len(), 9);
        assert_eq!(
            slots[&FieldKind::Status],
            FieldOutcome::Matched(vec![0, 2, 3])
        );
        assert_eq!(slots[&FieldKind::Price], FieldOutcome::Unconstrained);
    }

    #[tokio::test]
    async fn test_search_intersects() {
        let outcome = pipeline()
            .search("3BHK ready to move apartments")
            .await
            .unwrap();
        assert_eq!(outcome.results.rows, vec![0, 3]);
        assert_eq!(
            outcome.results.applied,
            vec![FieldKind::Status, FieldKind::UnitType]
        );
    }

    #[tokio::test]
    async fn test_unconstrained_search_returns_all_rows() {
        let outcome = pipeline().search("hello").await.unwrap();
        assert_eq!(outcome.results.rows, vec![0, 1, 2, 3]);
        assert!(!outcome.results.is_constrained());
    }

    #[tokio::test]
    async fn test_answer_without_synthesizer_fails() {
        assert!(matches!(
            pipeline().answer("3 bhk").await,
            Err(PipelineError::NoSynthesizer)
        ));
    }
}
