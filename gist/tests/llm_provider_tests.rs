mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::{api_error_body, completion_body};
use gist::config::LlmConfig;
use gist::error::GistError;
use gist::llm::{LlmApiClient, LlmBackend, LlmProvider};
use gist::summarize::{LlmSummarizer, Summarizer};

fn llm_config(model: &str) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        base_url: None,
        timeout_secs: 30,
        max_retries: 3,
    }
}

fn llm_config_with_base_url(model: &str, base_url: String, max_retries: u32) -> LlmConfig {
    LlmConfig {
        model: model.to_string(),
        api_key: Some("test-key".to_string()),
        base_url: Some(base_url),
        timeout_secs: 5,
        max_retries,
    }
}

#[test]
fn test_openai_provider_detection() {
    let config = llm_config("openai/gpt-4o");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::OpenAI));
    assert_eq!(provider.base_url(), Some("https://api.openai.com/v1"));
}

#[test]
fn test_openrouter_provider_detection() {
    let config = llm_config("openrouter/openai/gpt-4o");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::OpenRouter));
    assert_eq!(provider.base_url(), Some("https://openrouter.ai/api/v1"));
    assert_eq!(provider.model(), Some("openai/gpt-4o"));
}

#[test]
fn test_gemini_provider_detection() {
    let config = llm_config("gemini/gemini-2.0-flash");
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::Gemini));
    assert_eq!(
        provider.base_url(),
        Some("https://generativelanguage.googleapis.com/v1beta/openai")
    );
}

#[test]
fn test_ollama_provider_detection() {
    let mut config = llm_config("ollama/llama3.2");
    config.api_key = None;
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(provider.backend(), LlmBackend::Ollama));
    assert_eq!(provider.base_url(), Some("http://localhost:11434/v1"));
    assert!(provider.is_available());
}

#[test]
fn test_unknown_provider_with_base_url_is_openai_compatible() {
    let mut config = llm_config("my-model");
    config.base_url = Some("http://localhost:8080/v1".to_string());
    let provider = LlmProvider::new(Some(&config));

    assert!(matches!(
        provider.backend(),
        LlmBackend::OpenAICompatible { base_url } if base_url == "http://localhost:8080/v1"
    ));
}

#[test]
fn test_unavailable_provider() {
    let provider = LlmProvider::new(None);

    assert!(matches!(provider.backend(), LlmBackend::Unavailable { .. }));
    assert!(!provider.is_available());
}

#[test]
fn test_missing_key_makes_provider_unavailable() {
    let mut config = llm_config("openai/gpt-4o");
    config.api_key = None;
    let provider = LlmProvider::new(Some(&config));

    assert!(!provider.is_available());
}

#[test]
fn test_api_client_uses_provider_default_base_url() {
    let config = llm_config("openrouter/openai/gpt-4o-mini");
    let client = LlmApiClient::new(&config).unwrap();
    assert_eq!(client.base_url(), "https://openrouter.ai/api/v1");
    assert_eq!(client.model(), "openai/gpt-4o-mini");
}

#[tokio::test]
async fn test_complete_returns_response_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("The board approved the budget.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let summary = provider
        .complete("Summarize: the board approved the budget.")
        .await
        .unwrap();
    assert_eq!(summary, "The board approved the budget.");
}

#[tokio::test]
async fn test_summarizer_sends_one_combined_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Summarize briefly.\\n\\nQuarterly revenue rose."))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Revenue rose.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    let summarizer = LlmSummarizer::new(LlmProvider::new(Some(&config)));

    let summary = summarizer
        .summarize("Summarize briefly.", "Quarterly revenue rose.")
        .await
        .unwrap();
    assert_eq!(summary, "Revenue rose.");
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_mock = Arc::clone(&attempts);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(move |_request: &Request| {
            if attempts_for_mock.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(500).set_body_string("model overloaded")
            } else {
                ResponseTemplate::new(200).set_body_json(completion_body("Minutes summarized after retry"))
            }
        })
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 2);
    let provider = LlmProvider::new(Some(&config));

    let summary = provider.complete("Summarize the minutes.").await.unwrap();
    assert_eq!(summary, "Minutes summarized after retry");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_quota_exhaustion_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(api_error_body(
                    "Rate limit exceeded",
                    "insufficient_quota",
                    "insufficient_quota",
                )),
        )
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let err = provider.complete("Summarize the report.").await.unwrap_err();
    assert!(matches!(err, GistError::LlmRateLimit { retry_after: None }));
    assert_eq!(err.code(), "rate_limited");
}

#[tokio::test]
async fn test_auth_error_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(api_error_body(
            "Invalid API key",
            "invalid_request_error",
            "invalid_api_key",
        )))
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 1);
    let provider = LlmProvider::new(Some(&config));

    let err = provider.complete("Summarize the report.").await.unwrap_err();
    assert!(
        matches!(err, GistError::Generation(ref message) if message.contains("authentication failed")),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_empty_completion_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
        .mount(&server)
        .await;

    let config = llm_config_with_base_url("openai/gpt-4o-mini", format!("{}/v1", server.uri()), 0);
    let provider = LlmProvider::new(Some(&config));

    let result = provider.complete("Summarize an empty meeting.").await;
    assert!(matches!(result, Err(GistError::Generation(_))));
}

#[tokio::test]
async fn test_blank_prompt_is_rejected_before_sending() {
    let config = llm_config("openai/gpt-4o-mini");
    let provider = LlmProvider::new(Some(&config));

    let err = provider.complete(" \n ").await.unwrap_err();
    assert!(matches!(err, GistError::Validation(ref message) if message.contains("Prompt cannot be empty")));
}

#[tokio::test]
async fn test_unavailable_provider_fails_fast() {
    let provider = LlmProvider::new(None);
    let result = provider.complete("Summarize this.").await;
    assert!(matches!(result, Err(GistError::LlmUnavailable(_))));
}
