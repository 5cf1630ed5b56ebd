//! HTTP mock tests for the built-in providers.
//!
//! Uses wiremock to stand in for each provider's API.

use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orchd::config::{self, ProviderSettings};
use orchd::providers::{AnthropicProvider, OllamaProvider, OpenAiProvider};
use orchd::{Deadline, Error, ModelConfig, ModelProvider};

const UNSET_KEY_ENV: &str = "ORCHD_TEST_KEY_THAT_IS_NEVER_SET";

fn settings(
  defaults: config::ProviderDefaults
, server: &MockServer
, route: &str
) -> ProviderSettings
{   ProviderSettings::from(defaults)
      .with_endpoint(format!("{}{}", server.uri(), route))
      .with_api_key_env(UNSET_KEY_ENV)
}

fn model(provider: &str, model: &str) -> ModelConfig
{   let mut cfg = ModelConfig::new("m", provider, model);
    cfg.api_key = Some("test-key".to_string());
    cfg
}

fn deadline() -> Deadline
{   Deadline::after(Duration::from_secs(5))
}

// =============================================================================
// OpenAI
// =============================================================================

#[tokio::test]
async fn openai_sends_bearer_and_fenced_code()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/chat/completions"))
      .and(header("authorization", "Bearer test-key"))
      .and(body_partial_json(json!({
        "model": "gpt-test",
        "messages": [
          {"role": "user", "content": "explain\n\n```code\nfn main() {}\n```"}
        ],
        "max_tokens": 64
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [
          {"message": {"role": "assistant", "content": "It does nothing."},
           "finish_reason": "stop"}
        ]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let mut cfg = model("openai", "gpt-test");
    cfg.max_tokens = Some(64);

    let text = assert_ok!(
      provider.call(&deadline(), &cfg, "explain", "fn main() {}").await
    );
    assert_eq!(text, "It does nothing.");
}

#[tokio::test]
async fn openai_error_envelope_wins_over_status()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(401).set_body_json(json!({
        "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
      })))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("openai", "gpt-test"), "hi", "").await
    );
    assert_eq!(err.to_string(), "openai error: Incorrect API key provided");
}

#[tokio::test]
async fn openai_without_choices_is_an_error()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("openai", "gpt-test"), "hi", "").await
    );
    assert_eq!(err, Error::NoContentInResponse("openai".to_string()));
    assert_eq!(err.to_string(), "openai: no content in response");
}

#[tokio::test]
async fn openai_null_content_is_no_content()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [
          {"message": {"role": "assistant", "content": null}, "finish_reason": "tool_calls"}
        ]
      })))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("openai", "gpt-test"), "hi", "").await
    );
    assert_eq!(err, Error::NoContentInResponse("openai".to_string()));
}

#[tokio::test]
async fn openai_choice_without_message_is_no_content()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"finish_reason": "content_filter"}]
      })))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("openai", "gpt-test"), "hi", "").await
    );
    assert_eq!(err.to_string(), "openai: no content in response");
}

#[tokio::test]
async fn failure_status_wins_over_answer_in_body()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": "stale"}}]
      })))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("openai", "gpt-test"), "hi", "").await
    );
    assert_eq!(err.to_string(), "openai error: HTTP 503 Service Unavailable");
}

#[tokio::test]
async fn openai_missing_key_makes_no_request()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      settings(config::OPENAI, &server, "/v1/chat/completions")
    );
    let cfg = ModelConfig::new("m", "openai", "gpt-test");
    let err = assert_err!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(err, Error::MissingApiKey("OpenAI".to_string()));
}

#[tokio::test]
async fn model_endpoint_overrides_default()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/custom"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": "routed"}}]
      })))
      .mount(&server)
      .await;

    let provider = OpenAiProvider::with_settings(
      ProviderSettings::from(config::OPENAI)
        .with_endpoint("http://127.0.0.1:9/never-used")
    );
    let mut cfg = model("openai", "gpt-test");
    cfg.endpoint = Some(format!("{}/custom", server.uri()));

    let text = assert_ok!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(text, "routed");
}

// =============================================================================
// Anthropic
// =============================================================================

#[tokio::test]
async fn anthropic_sends_key_version_and_default_max_tokens()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/v1/messages"))
      .and(header("x-api-key", "test-key"))
      .and(header("anthropic-version", "2023-06-01"))
      .and(body_partial_json(json!({
        "model": "claude-test",
        "max_tokens": 2048,
        "messages": [{"role": "user", "content": "hi"}]
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "content": [{"type": "text", "text": "hello there"}]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let provider = AnthropicProvider::with_settings(
      settings(config::ANTHROPIC, &server, "/v1/messages")
    );
    let text = assert_ok!(
      provider.call(&deadline(), &model("anthropic", "claude-test"), "hi", "").await
    );
    assert_eq!(text, "hello there");
}

#[tokio::test]
async fn anthropic_error_field_is_checked_before_content()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "type": "error",
        "error": {"type": "overloaded_error", "message": "Overloaded"},
        "content": [{"text": "ignored"}]
      })))
      .mount(&server)
      .await;

    let provider = AnthropicProvider::with_settings(
      settings(config::ANTHROPIC, &server, "/v1/messages")
    );
    let err = assert_err!(
      provider.call(&deadline(), &model("anthropic", "claude-test"), "hi", "").await
    );
    assert_eq!(err.to_string(), "anthropic error: Overloaded");
}

#[tokio::test]
async fn anthropic_missing_key_is_reported()
{   let server = MockServer::start().await;
    let provider = AnthropicProvider::with_settings(
      settings(config::ANTHROPIC, &server, "/v1/messages")
    );
    let cfg = ModelConfig::new("m", "anthropic", "claude-test");
    let err = assert_err!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(err.to_string(), "missing Anthropic API key");
}

// =============================================================================
// Ollama
// =============================================================================

#[tokio::test]
async fn ollama_needs_no_key_and_disables_streaming()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/api/chat"))
      .and(body_partial_json(json!({
        "model": "llama-test",
        "stream": false,
        "options": {"temperature": 0.2}
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "message": {"role": "assistant", "content": "local answer"},
        "done": true
      })))
      .expect(1)
      .mount(&server)
      .await;

    let provider = OllamaProvider::with_settings(
      settings(config::OLLAMA, &server, "/api/chat")
    );
    let mut cfg = ModelConfig::new("m", "ollama", "llama-test");
    cfg.temperature = Some(0.2);

    let text = assert_ok!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(text, "local answer");
}

#[tokio::test]
async fn ollama_error_string_is_reported()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({
        "error": "model 'llama-test' not found"
      })))
      .mount(&server)
      .await;

    let provider = OllamaProvider::with_settings(
      settings(config::OLLAMA, &server, "/api/chat")
    );
    let cfg = ModelConfig::new("m", "ollama", "llama-test");
    let err = assert_err!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(err.to_string(), "ollama error: model 'llama-test' not found");
}

#[tokio::test]
async fn ollama_empty_message_is_an_error()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "message": {"role": "assistant", "content": ""}
      })))
      .mount(&server)
      .await;

    let provider = OllamaProvider::with_settings(
      settings(config::OLLAMA, &server, "/api/chat")
    );
    let cfg = ModelConfig::new("m", "ollama", "llama-test");
    let err = assert_err!(provider.call(&deadline(), &cfg, "hi", "").await);
    assert_eq!(err.to_string(), "ollama: no content in response");
}

#[tokio::test]
async fn non_json_failure_carries_status()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
      .mount(&server)
      .await;

    let provider = OllamaProvider::with_settings(
      settings(config::OLLAMA, &server, "/api/chat")
    );
    let cfg = ModelConfig::new("m", "ollama", "llama-test");
    let err = assert_err!(provider.call(&deadline(), &cfg, "hi", "").await);
    let msg = err.to_string();
    assert!(msg.starts_with("ollama error: HTTP 500"), "{}", msg);
    assert!(msg.contains("upstream exploded"), "{}", msg);
}

// =============================================================================
// Deadline
// =============================================================================

#[tokio::test]
async fn slow_provider_is_abandoned_at_deadline()
{   let server = MockServer::start().await;

    Mock::given(method("POST"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"message": {"content": "too late"}}))
          .set_delay(Duration::from_secs(10))
      )
      .mount(&server)
      .await;

    let provider = OllamaProvider::with_settings(
      settings(config::OLLAMA, &server, "/api/chat")
    );
    let cfg = ModelConfig::new("m", "ollama", "llama-test");
    let deadline = Deadline::after(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = assert_err!(provider.call(&deadline, &cfg, "hi", "").await);
    assert_eq!(err, Error::Timeout);
    assert!(started.elapsed() < Duration::from_secs(5));
}
