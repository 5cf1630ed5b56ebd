use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::{self, ProviderSettings};
use crate::deadline::Deadline;
use crate::error::Error;
use crate::request::{compose_content, ModelConfig};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChatResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
  , #[serde(default)]
    pub error: Option<ApiErrorBody>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   #[serde(default)]
    pub message: Option<ResponseMessage>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

/// Assistant message; content is null for refusals and tool calls
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody
{   #[serde(default)]
    pub message: String
}

impl super::Envelope for OpenAiChatResponse
{   fn error_message(&self) -> Option<String>
    {   self.error.as_ref().map(|e| e.message.clone())
    }

    fn answer(self) -> Option<String>
    {   self.choices.into_iter()
          .next()
          .and_then(|c| c.message)
          .and_then(|m| m.content)
    }
}

// ===== Provider =====

/// Chat-completions API with bearer authentication
pub struct OpenAiProvider
{   settings: ProviderSettings
  , http_client: reqwest::Client
}

impl OpenAiProvider
{   pub fn new() -> Self
    {   Self::with_settings(config::OPENAI.into())
    }

    pub fn with_settings(settings: ProviderSettings) -> Self
    {   debug!("Creating OpenAiProvider for {}", settings.endpoint);
        let http_client = super::http_client(settings.http_timeout);
        OpenAiProvider
        {   settings
          , http_client
        }
    }
}

impl Default for OpenAiProvider
{   fn default() -> Self
    {   Self::new()
    }
}

#[async_trait]
impl super::ModelProvider for OpenAiProvider
{   fn id(&self) -> &str
    {   config::OPENAI.id
    }

    async fn call(
      &self
    , deadline: &Deadline
    , cfg: &ModelConfig
    , prompt: &str
    , code: &str
    ) -> Result<String, Error>
    {   debug!("OpenAI call for: {}", cfg.name);

        let api_key = super::resolve_api_key(
          cfg, &self.settings, config::OPENAI.label
        )?;

        let request = OpenAiChatRequest
        {   model: cfg.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "user".to_string()
                , content: compose_content(prompt, code)
              }
            ]
          , temperature: cfg.temperature()
          , max_tokens: cfg.max_tokens()
        };

        trace!("OpenAI request: {:?}", request);

        let builder = self.http_client
          .post(super::resolve_endpoint(cfg, &self.settings))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&request);

        super::exchange::<OpenAiChatResponse>(
          self.id(), deadline, builder
        ).await
    }
}
