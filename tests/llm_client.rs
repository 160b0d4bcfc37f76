use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use property_search::extract::{FilterExtractor, LlmExtractor};
use property_search::llm::{CompletionRequest, LanguageModel, LlmError, OpenAiClient};
use property_search::model::PriceFilter;

fn client(base_url: &str) -> OpenAiClient {
    OpenAiClient::new(base_url, "gpt-4.1", "sk-test", Duration::from_secs(5)).unwrap()
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 14, "total_tokens": 134}
    })
    .to_string()
}

#[tokio::test]
async fn completion_sends_auth_and_json_mode() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4.1",
            "temperature": 0.0,
            "response_format": {"type": "json_object"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(r#"{"type":"2BHK"}"#))
        .create_async()
        .await;

    let reply = client(&server.url())
        .complete(CompletionRequest::new("system", "user").json())
        .await
        .unwrap();

    assert_eq!(reply, r#"{"type":"2BHK"}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn rejected_key_maps_to_auth_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let err = client(&server.url())
        .complete(CompletionRequest::new("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Auth));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let err = client(&server.url())
        .complete(CompletionRequest::new("s", "u"))
        .await
        .unwrap_err();
    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn blank_content_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("   "))
        .create_async()
        .await;

    let err = client(&server.url())
        .complete(CompletionRequest::new("s", "u"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn extractor_over_http_normalises_budget() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("under 1.2 Cr".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion(
            "```json\n{\"type\":\"3BHK\",\"fullAddress\":\"Pune\",\"price\":{\"min\":0,\"max\":12000000}}\n```",
        ))
        .create_async()
        .await;

    let extractor = LlmExtractor::new(Arc::new(client(&server.url())));
    let filters = extractor
        .extract("Show me 3BHK flats in Pune under 1.2 Cr")
        .await
        .unwrap();

    assert_eq!(filters.unit_type.as_deref(), Some("3BHK"));
    assert_eq!(filters.price, Some(PriceFilter::at_most(12_000_000.0)));
}
