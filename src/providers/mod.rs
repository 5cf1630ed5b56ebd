//! LLM provider implementations and the capability they share

pub mod anthropic;
pub mod ollama;
pub mod openai;

// Re-export for convenience
pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use log::{debug, error, trace};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::ProviderSettings;
use crate::deadline::Deadline;
use crate::error::Error;
use crate::request::ModelConfig;

/// A backend the orchestrator can dispatch one model invocation to.
///
/// Implementations make exactly one outbound call per invocation and
/// must give up as soon as `deadline` ends.
#[async_trait]
pub trait ModelProvider: Send + Sync
{   /// Identifier used for logging and error prefixes
    fn id(&self) -> &str;

    /// Full text of a single answer, or why there is none
    async fn call(
      &self
    , deadline: &Deadline
    , cfg: &ModelConfig
    , prompt: &str
    , code: &str
    ) -> Result<String, Error>;
}

/// Provider response body: either an error envelope or an answer
pub(crate) trait Envelope: DeserializeOwned
{   /// Envelope-level error, checked before any answer
    fn error_message(&self) -> Option<String>;

    /// Answer text, if the body carries one
    fn answer(self) -> Option<String>;
}

/// Explicit key, then the settings' env var, else `MissingApiKey`
pub(crate) fn resolve_api_key(
  cfg: &ModelConfig
, settings: &ProviderSettings
, label: &str
) -> Result<String, Error>
{   if let Some(key) = cfg.api_key()
    {   debug!("Using explicit api key for: {}", cfg.name);
        return Ok(key.to_string());
    }

    if let Some(var) = &settings.api_key_env
    {   if let Ok(key) = std::env::var(var)
        {   if !key.is_empty()
            {   debug!("Using {} for: {}", var, cfg.name);
                return Ok(key);
            }
        }
    }

    error!("No API key for model: {}", cfg.name);
    Err(Error::MissingApiKey(label.to_string()))
}

/// Explicit endpoint, else the settings' default
pub(crate) fn resolve_endpoint(
  cfg: &ModelConfig
, settings: &ProviderSettings
) -> String
{   cfg.endpoint()
      .unwrap_or(settings.endpoint.as_str())
      .to_string()
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client
{   reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .unwrap_or_else(|e| {
        error!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
      })
}

/// Send `request` under `deadline` and decode the answer.
///
/// An envelope-level error always wins; a body that is not an envelope
/// is reported with the HTTP status when the status is a failure.
pub(crate) async fn exchange<E: Envelope>(
  provider: &str
, deadline: &Deadline
, request: reqwest::RequestBuilder
) -> Result<String, Error>
{   let (status, body) = deadline.run(async {
      let response = request.send().await.map_err(|e| {
        error!("{} HTTP error: {}", provider, e);
        Error::from(e)
      })?;
      let status = response.status();
      let body = response.bytes().await.map_err(Error::from)?;
      Ok((status, body))
    }).await?;

    trace!("{} response status: {}", provider, status);

    let envelope: E = match serde_json::from_slice(&body)
    {   Ok(envelope) => envelope
      , Err(_) if !status.is_success() => {
          let text = String::from_utf8_lossy(&body);
          error!("{} API error {}: {}", provider, status, text);
          return Err(Error::ApiError(format!(
            "{} error: HTTP {}: {}", provider, status, text.trim()
          )));
        }
      , Err(e) => {
          error!("{} parse error: {}", provider, e);
          return Err(Error::ParseError(format!("{}: {}", provider, e)));
        }
    };

    if let Some(msg) = envelope.error_message()
    {   error!("{} reported error: {}", provider, msg);
        return Err(Error::ApiError(format!("{} error: {}", provider, msg)));
    }

    if !status.is_success()
    {   error!("{} answered with status {}", provider, status);
        return Err(Error::ApiError(format!(
          "{} error: HTTP {}", provider, status
        )));
    }

    envelope.answer()
      .filter(|text| !text.is_empty())
      .ok_or_else(|| {
        error!("No content in {} response", provider);
        Error::NoContentInResponse(provider.to_string())
      })
}
