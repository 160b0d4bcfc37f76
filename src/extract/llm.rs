use std::sync::Arc;

use async_trait::async_trait;

use super::{ExtractError, FilterExtractor, parse_model_output};
use crate::llm::{CompletionRequest, LanguageModel};
use crate::model::FilterSet;

/// Instructions sent with every extraction request.
pub const EXTRACTION_PROMPT: &str = r#"You turn real-estate search queries into a JSON filter object.

Reply with exactly one JSON object and nothing else: no prose, no markdown, no code fences.
Use zero or more of these keys and no others:
status, possessionDate, fullAddress, pincode, type, carpetArea, price, bathrooms,
balcony, listingType, furnishedType, projectCategory, projectType

Normalisation:
- price: rupees as a number. 1 lakh = 100000, 1 crore = 10000000 ("1.2 Cr" -> 12000000, "80 lakh" -> 8000000).
  - "under", "below", "up to", "maximum" -> {"min": 0, "max": <rupees>}
  - "above", "over", "minimum", "at least" -> {"min": <rupees>, "max": null}
  - "between X and Y" -> {"min": <X rupees>, "max": <Y rupees>}
  - an amount with no comparison word -> a plain number
- type: "<N>BHK", e.g. "three bhk" -> "3BHK".
- status: "UNDER_CONSTRUCTION" or "READY_TO_MOVE". "Ready to move", "immediate possession"
  and similar set status to "READY_TO_MOVE" and never set possessionDate.
- possessionDate: ISO "YYYY-MM-DD". A bare year means January 1 ("2025" -> "2025-01-01");
  a month and year means the first of that month ("Dec 2024" -> "2024-12-01").
- fullAddress: the locality/city text as written, capitalised ("Wakad, Pune").
- pincode: 6-digit string.
- carpetArea: square feet as a number ("800 sqft" -> 800).
- bathrooms, balcony: integers.
- listingType: "Sell" (sale, resale, buy) or "Rent".
- furnishedType: "FURNISHED", "SEMI_FURNISHED" or "UNFURNISHED".
- projectCategory: "STANDALONE" or "COMPLEX".
- projectType: "RESIDENTIAL" or "COMMERCIAL".

Leave a key out unless the query clearly states or implies it. When the query contradicts
itself, use the last explicit statement; if still ambiguous, leave the key out.

Examples:
"3BHK ready to move apartments in Pune" -> {"type":"3BHK","status":"READY_TO_MOVE","fullAddress":"Pune"}
"Show me 3BHK flats in Pune under 1.2 Cr" -> {"type":"3BHK","fullAddress":"Pune","price":{"min":0,"max":12000000}}
"2 bhk semi-furnished for rent in Wakad, Pune above 800 sqft" -> {"type":"2BHK","listingType":"Rent","furnishedType":"SEMI_FURNISHED","fullAddress":"Wakad, Pune","carpetArea":800}
"Flats with possession by 2026 in Mumbai" -> {"fullAddress":"Mumbai","possessionDate":"2026-01-01"}
"Any ready-to-move 1 BHK in Mumbai pincode 400075" -> {"type":"1BHK","status":"READY_TO_MOVE","fullAddress":"Mumbai","pincode":"400075"}
"Commercial shop for rent near MG Road, Bangalore, budget 1.5 Cr" -> {"projectType":"COMMERCIAL","listingType":"Rent","fullAddress":"MG Road, Bangalore","price":15000000}
"Unfurnished 1 BHK for sale between 30 and 40 lakh" -> {"type":"1BHK","furnishedType":"UNFURNISHED","listingType":"Sell","price":{"min":3000000,"max":4000000}}"#;

/// Extracts filters by asking a language model.
pub struct LlmExtractor {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl LlmExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl FilterExtractor for LlmExtractor {
    async fn extract(&self, query: &str) -> Result<FilterSet, ExtractError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ExtractError::EmptyQuery);
        }

        let request = CompletionRequest::new(EXTRACTION_PROMPT, format!("Query: {query}"))
            .with_temperature(self.temperature)
            .json();
        let raw = self.model.complete(request).await?;
        tracing::debug!(model = self.model.name(), chars = raw.len(), "extraction output received");

        let filters = parse_model_output(&raw).inspect_err(|err| {
            tracing::warn!(error = %err, "extraction output rejected");
        })?;
        tracing::info!(keys = ?filters.keys(), "filters extracted");
        Ok(filters)
    }
}
