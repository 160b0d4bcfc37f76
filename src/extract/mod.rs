//! Query to [`FilterSet`] extraction.
//!
//! - **[`llm`]**: prompts a [`LanguageModel`](crate::llm::LanguageModel) for a
//!   JSON mapping over the filter vocabulary.
//! - **[`rules`]**: deterministic offline extractor applying the same
//!   normalisation rules with regular expressions.
//!
//! Either way the result passes through [`FilterSet::from_json`] semantics:
//! unknown keys are dropped, malformed values fail the query.

pub mod llm;
pub mod rules;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::LlmError;
use crate::model::{FilterSet, FilterSetError};

pub use self::llm::LlmExtractor;
pub use rules::RuleExtractor;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Model(#[from] LlmError),

    #[error("model output is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] FilterSetError),
}

#[async_trait]
pub trait FilterExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> Result<FilterSet, ExtractError>;
}

/// Parse raw model text into a validated filter set.
///
/// Tolerates a surrounding markdown code fence and leading/trailing prose
/// around a single JSON object.
pub fn parse_model_output(raw: &str) -> Result<FilterSet, ExtractError> {
    let body = strip_code_fence(raw);
    let body = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    };
    let value: serde_json::Value = serde_json::from_str(body)?;
    Ok(FilterSet::from_json(&value)?)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as "json" on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterKey;

    #[test]
    fn test_parse_plain_json() {
        let set = parse_model_output(r#"{"type":"3BHK","status":"READY_TO_MOVE"}"#).unwrap();
        assert_eq!(set.keys(), vec![FilterKey::Status, FilterKey::UnitType]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"bathrooms\": 2}\n```";
        let set = parse_model_output(raw).unwrap();
        assert_eq!(set.bathrooms, Some(2));
    }

    #[test]
    fn test_parse_json_with_prose() {
        let raw = "Here you go: {\"balcony\": 1} hope that helps";
        assert_eq!(parse_model_output(raw).unwrap().balcony, Some(1));
    }

    #[test]
    fn test_unparseable_output_is_an_error() {
        assert!(matches!(
            parse_model_output("I could not find any filters."),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_model_output(r#"{"price": true}"#),
            Err(ExtractError::Invalid(_))
        ));
    }
}
