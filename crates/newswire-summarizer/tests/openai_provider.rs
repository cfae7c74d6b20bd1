//! Integration tests for `OpenAiProvider` and the retrying client using
//! wiremock HTTP mocks.

use std::time::Duration;

use newswire_core::AiSettings;
use newswire_summarizer::{
    Backend, CompletionProvider, Mode, OpenAiProvider, RetryPolicy, SummarizerClient,
    SummarizerError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }
        ]
    })
}

fn provider(base_url: &str) -> OpenAiProvider {
    OpenAiProvider::with_base_url("test-key", Duration::from_secs(5), base_url, "test-model")
        .expect("provider construction should not fail")
}

fn client(base_url: &str) -> SummarizerClient {
    SummarizerClient::new(
        Backend::Configured(provider(base_url)),
        RetryPolicy::new(3, Duration::from_millis(20)),
    )
}

#[tokio::test]
async fn complete_posts_chat_request_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({ "model": "test-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  Short summary.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider(&format!("{}/v1", server.uri()))
        .complete("Long article text", Mode::Summarize)
        .await
        .expect("completion should succeed");
    assert_eq!(text, "Short summary.");
}

#[tokio::test]
async fn empty_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let result = provider(&server.uri()).complete("x", Mode::Reply).await;
    assert!(matches!(result, Err(SummarizerError::EmptyResponse)));
}

#[tokio::test]
async fn server_errors_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .summarize("article")
        .await
        .expect_err("should fail after retries");
    match err {
        SummarizerError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn rate_limit_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello there.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server.uri()).chat("hello").await.expect("chat should recover");
    assert_eq!(reply, "Hello there.");
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server.uri()).chat("hello").await;
    assert!(matches!(result, Err(SummarizerError::Status { status: 401, .. })));
}

#[tokio::test]
async fn missing_credential_never_calls_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let settings = AiSettings {
        api_key: None,
        base_url: server.uri(),
        model: "test-model".to_string(),
        max_attempts: 3,
        retry_delay: Duration::from_secs(2),
        request_timeout: Duration::from_secs(5),
    };
    let client = SummarizerClient::from_settings(&settings).expect("offline client");
    assert!(!client.is_configured());

    let reply = client.chat("hello").await.expect("canned reply");
    assert!(reply.starts_with("[offline]"));
    assert!(matches!(
        client.summarize("text").await,
        Err(SummarizerError::Unconfigured)
    ));
}
