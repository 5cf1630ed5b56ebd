use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::{self, ProviderSettings};
use crate::deadline::Deadline;
use crate::error::Error;
use crate::request::{compose_content, ModelConfig};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API requires max_tokens on every request
const DEFAULT_MAX_TOKENS: u32 = 2048;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub struct MessageContent
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessageRequest
{   pub model: String
  , pub max_tokens: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , pub messages: Vec<MessageContent>
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicMessageResponse
{   #[serde(default)]
    pub content: Vec<ContentBlock>
  , #[serde(default)]
    pub error: Option<ApiErrorBody>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock
{   #[serde(default)]
    pub text: String
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody
{   #[serde(default)]
    pub message: String
}

impl super::Envelope for AnthropicMessageResponse
{   fn error_message(&self) -> Option<String>
    {   self.error.as_ref().map(|e| e.message.clone())
    }

    fn answer(self) -> Option<String>
    {   self.content.into_iter()
          .next()
          .map(|block| block.text)
    }
}

// ===== Provider =====

/// Messages API with api-key and version headers
pub struct AnthropicProvider
{   settings: ProviderSettings
  , http_client: reqwest::Client
}

impl AnthropicProvider
{   pub fn new() -> Self
    {   Self::with_settings(config::ANTHROPIC.into())
    }

    pub fn with_settings(settings: ProviderSettings) -> Self
    {   debug!("Creating AnthropicProvider for {}", settings.endpoint);
        let http_client = super::http_client(settings.http_timeout);
        AnthropicProvider
        {   settings
          , http_client
        }
    }
}

impl Default for AnthropicProvider
{   fn default() -> Self
    {   Self::new()
    }
}

#[async_trait]
impl super::ModelProvider for AnthropicProvider
{   fn id(&self) -> &str
    {   config::ANTHROPIC.id
    }

    async fn call(
      &self
    , deadline: &Deadline
    , cfg: &ModelConfig
    , prompt: &str
    , code: &str
    ) -> Result<String, Error>
    {   debug!("Anthropic call for: {}", cfg.name);

        let api_key = super::resolve_api_key(
          cfg, &self.settings, config::ANTHROPIC.label
        )?;

        let request = AnthropicMessageRequest
        {   model: cfg.model.clone()
          , max_tokens: cfg.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS)
          , temperature: cfg.temperature()
          , messages: vec![
              MessageContent
              {   role: "user".to_string()
                , content: compose_content(prompt, code)
              }
            ]
        };

        trace!("Anthropic request: {:?}", request);

        let builder = self.http_client
          .post(super::resolve_endpoint(cfg, &self.settings))
          .header("x-api-key", api_key)
          .header("anthropic-version", ANTHROPIC_VERSION)
          .header("Content-Type", "application/json")
          .json(&request);

        super::exchange::<AnthropicMessageResponse>(
          self.id(), deadline, builder
        ).await
    }
}
