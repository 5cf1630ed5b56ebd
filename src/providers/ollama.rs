use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::{self, ProviderSettings};
use crate::deadline::Deadline;
use crate::error::Error;
use crate::request::{compose_content, ModelConfig};

// ===== Message Types =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaChatMessage
{   #[serde(default)]
    pub role: String
  , #[serde(default)]
    pub content: String
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OllamaOptions
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>
}

impl OllamaOptions
{   fn is_empty(&self) -> bool
    {   self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest
{   pub model: String
  , pub messages: Vec<OllamaChatMessage>
  , pub stream: bool
  , #[serde(skip_serializing_if = "OllamaOptions::is_empty")]
    pub options: OllamaOptions
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse
{   #[serde(default)]
    pub message: Option<OllamaChatMessage>
  , #[serde(default)]
    pub error: Option<String>
}

impl super::Envelope for OllamaChatResponse
{   fn error_message(&self) -> Option<String>
    {   self.error.clone().filter(|e| !e.is_empty())
    }

    fn answer(self) -> Option<String>
    {   self.message.map(|m| m.content)
    }
}

// ===== Provider =====

/// Local daemon chat API, no credentials
pub struct OllamaProvider
{   settings: ProviderSettings
  , http_client: reqwest::Client
}

impl OllamaProvider
{   pub fn new() -> Self
    {   Self::with_settings(config::OLLAMA.into())
    }

    pub fn with_settings(settings: ProviderSettings) -> Self
    {   debug!("Creating OllamaProvider for {}", settings.endpoint);
        let http_client = super::http_client(settings.http_timeout);
        OllamaProvider
        {   settings
          , http_client
        }
    }
}

impl Default for OllamaProvider
{   fn default() -> Self
    {   Self::new()
    }
}

#[async_trait]
impl super::ModelProvider for OllamaProvider
{   fn id(&self) -> &str
    {   config::OLLAMA.id
    }

    async fn call(
      &self
    , deadline: &Deadline
    , cfg: &ModelConfig
    , prompt: &str
    , code: &str
    ) -> Result<String, Error>
    {   debug!("Ollama call for: {}", cfg.name);

        let request = OllamaChatRequest
        {   model: cfg.model.clone()
          , messages: vec![
              OllamaChatMessage
              {   role: "user".to_string()
                , content: compose_content(prompt, code)
              }
            ]
          , stream: false
          , options: OllamaOptions
            {   temperature: cfg.temperature()
              , num_predict: cfg.max_tokens()
            }
        };

        trace!("Ollama request: {:?}", request);

        let builder = self.http_client
          .post(super::resolve_endpoint(cfg, &self.settings))
          .header("Content-Type", "application/json")
          .json(&request);

        super::exchange::<OllamaChatResponse>(
          self.id(), deadline, builder
        ).await
    }
}
