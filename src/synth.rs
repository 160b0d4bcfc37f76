//! Natural-language answers over the filtered rows.

use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use thiserror::Error;

use crate::dataset::COLUMNS;
use crate::llm::{CompletionRequest, LanguageModel, LlmError};
use crate::model::{FilterSet, PropertyRecord};

pub const DEFAULT_MAX_RECORDS: usize = 50;

const SYSTEM_PROMPT: &str = "You are a friendly real-estate assistant. Answer the user the way a \
helpful agent would talk to a client: conversational, concise, no JSON and no code. Base every \
fact on the listings provided; never invent properties, prices or dates. If no listings match, \
say so plainly and suggest which requirement the user could relax. Prices are in Indian rupees; \
quote them in lakh or crore where that reads naturally.";

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("model returned an empty answer")]
    Empty,
}

/// Everything the synthesiser may look at for one query.
#[derive(Debug, Clone)]
pub struct SynthesisInput<'a> {
    pub query: &'a str,
    pub filters: &'a FilterSet,
    pub records: Vec<&'a PropertyRecord>,
    /// Whether any filter constrained the rows; `false` means `records` is
    /// the unfiltered dataset.
    pub constrained: bool,
}

#[async_trait]
pub trait ResponseSynthesizer: Send + Sync {
    async fn synthesize(&self, input: &SynthesisInput<'_>) -> Result<String, SynthesisError>;
}

pub struct LlmSynthesizer {
    model: Arc<dyn LanguageModel>,
    max_records: usize,
    temperature: f32,
}

impl LlmSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_records: DEFAULT_MAX_RECORDS,
            temperature: 0.7,
        }
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// User message for `input`: result header, columns, records, filters, query.
    pub fn build_prompt(&self, input: &SynthesisInput<'_>) -> String {
        let total = input.records.len();
        let shown = total.min(self.max_records);
        let header = match (input.constrained, total) {
            (false, _) => format!(
                "No search constraints were recognised in the query; these are {shown} of all {total} listings."
            ),
            (true, 0) => "No listings matched the requested constraints.".to_string(),
            (true, n) if n > shown => {
                format!("{n} listings matched; the first {shown} are shown.")
            }
            (true, 1) => "1 listing matched.".to_string(),
            (true, n) => format!("{n} listings matched."),
        };

        let records = serde_json::to_string_pretty(&input.records[..shown])
            .unwrap_or_else(|_| "[]".to_string());
        let filters = serde_json::to_string(&input.filters.to_json())
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "{header}\n\nColumns: {columns}\n\nListings:\n{records}\n\nFilters understood from the query:\n{filters}\n\nUser query: {query}\n\nWrite the reply to the user.",
            columns = COLUMNS.iter().join(", "),
            query = input.query,
        )
    }
}

#[async_trait]
impl ResponseSynthesizer for LlmSynthesizer {
    async fn synthesize(&self, input: &SynthesisInput<'_>) -> Result<String, SynthesisError> {
        let prompt = self.build_prompt(input);
        tracing::debug!(
            records = input.records.len(),
            prompt_chars = prompt.len(),
            "synthesis prompt built"
        );

        let request =
            CompletionRequest::new(SYSTEM_PROMPT, prompt).with_temperature(self.temperature);
        let answer = self.model.complete(request).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SynthesisError::Empty);
        }
        Ok(answer.to_string())
    }
}
