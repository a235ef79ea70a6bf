//! HTTP adapter tests against a mock server
//!
//! Exercises request shape, streaming decoders, status mapping, and the
//! per-stage timeout through delayed responses.

use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use sdk::errors::{Budget, PipelineError, Stage};
use slidewright_engine::config::{OpenAICompatibleConfig, OpenAIConfig};
use slidewright_engine::llm::openai::OpenAIProvider;
use slidewright_engine::llm::ollama::OllamaProvider;
use slidewright_engine::llm::{LLMError, LLMProvider, Message};
use slidewright_engine::pipeline::Generator;
use slidewright_engine::secrets::SecretCache;

fn openai(server: &MockServer, key: Option<&str>) -> OpenAIProvider {
    let secrets = match key {
        Some(key) => SecretCache::with_values([("openai_api_key", key)]),
        None => SecretCache::with_values(Vec::<(String, String)>::new()),
    };
    OpenAIProvider::new(
        &OpenAIConfig {
            base_url: server.uri(),
            model: "gpt-4o-mini".to_string(),
        },
        Arc::new(secrets),
    )
}

async fn collect(provider: &dyn LLMProvider) -> Result<String, LLMError> {
    let mut stream = provider.generate_stream(&[Message::user("hi")]).await?;
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}

#[tokio::test]
async fn test_ollama_complete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "[]"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    let text = provider.complete(&[Message::user("extract")]).await.unwrap();
    assert_eq!(text, "[]");
}

#[tokio::test]
async fn test_ollama_ndjson_stream() {
    let server = MockServer::start().await;
    let body = concat!(
        r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#, "\n",
        r#"{"message":{"role":"assistant","content":"lo "},"done":false}"#, "\n",
        r#"{"message":{"role":"assistant","content":"there"},"done":false}"#, "\n",
        r#"{"message":{"role":"assistant","content":""},"done":true}"#, "\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri(), "llama3.1:8b");
    assert_eq!(collect(&provider).await.unwrap(), "Hello there");
}

#[tokio::test]
async fn test_ollama_unreachable() {
    let provider = OllamaProvider::new("http://127.0.0.1:1", "llama3.1:8b");
    let err = provider.complete(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LLMError::ProviderUnavailable(_) | LLMError::NetworkError(_)));
    assert!(!provider.check_health().await);
}

#[tokio::test]
async fn test_openai_sends_bearer_and_parses_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "deck"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = openai(&server, Some("sk-test-key"));
    assert_eq!(provider.complete(&[Message::user("hi")]).await.unwrap(), "deck");
}

#[tokio::test]
async fn test_openai_sse_stream() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Slide \"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ready\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let provider = openai(&server, Some("sk-test-key"));
    assert_eq!(collect(&provider).await.unwrap(), "Slide ready");
}

#[tokio::test]
async fn test_openai_missing_key_is_auth_failure() {
    let server = MockServer::start().await;
    let provider = openai(&server, None);
    let err = provider.complete(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LLMError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_openai_status_mapping_scrubs_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("invalid key sk-abcdefghijklmnopqrstuvwxyz"),
        )
        .mount(&server)
        .await;

    let provider = openai(&server, Some("sk-test-key"));
    match provider.complete(&[Message::user("hi")]).await.unwrap_err() {
        LLMError::AuthenticationFailed(body) => {
            assert!(body.contains("[REDACTED]"));
            assert!(!body.contains("sk-abc"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_compatible_works_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .mount(&server)
        .await;

    let provider = OpenAIProvider::compatible(
        &OpenAICompatibleConfig {
            base_url: format!("{}/v1", server.uri()),
            model: "local-model".to_string(),
        },
        Arc::new(SecretCache::with_values(Vec::<(String, String)>::new())),
    );
    assert_eq!(provider.name(), "openai_compatible");
    assert_eq!(provider.complete(&[Message::user("hi")]).await.unwrap(), "ok");
}

#[tokio::test]
async fn test_slow_provider_times_out_at_stage_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": {"role": "assistant", "content": "late"}, "done": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let generator = Generator::new(Arc::new(OllamaProvider::new(server.uri(), "llama3.1:8b")));
    let started = std::time::Instant::now();
    let err = generator
        .generate("system", "prompt", Stage::Deck, Duration::from_millis(300))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(
        err,
        PipelineError::Timeout { stage: Stage::Deck, limit: Budget::Seconds(_) }
    ));
}
