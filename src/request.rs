//! Request, result and stream event types shared by every mode

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One requested backend invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig
{   /// Caller-facing label
    pub name: String
  , /// Registry identifier of the provider
    pub provider: String
  , /// Provider-specific model identifier
    pub model: String
  , /// Credential override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>
  , /// Endpoint override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>
  , /// Sampling temperature, provider default if unset or zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , /// Output token cap, provider default if unset or non-positive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>
}

impl ModelConfig
{   pub fn new(
      name: impl Into<String>
    , provider: impl Into<String>
    , model: impl Into<String>
    ) -> Self
    {   ModelConfig
        {   name: name.into()
          , provider: provider.into()
          , model: model.into()
          , api_key: None
          , endpoint: None
          , temperature: None
          , max_tokens: None
        }
    }

    /// Explicit API key, ignoring empty strings
    pub fn api_key(&self) -> Option<&str>
    {   self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Explicit endpoint, ignoring empty strings
    pub fn endpoint(&self) -> Option<&str>
    {   self.endpoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Temperature only when strictly positive
    pub fn temperature(&self) -> Option<f64>
    {   self.temperature.filter(|t| *t > 0.0)
    }

    /// Max tokens only when strictly positive
    pub fn max_tokens(&self) -> Option<u32>
    {   self.max_tokens
          .filter(|n| *n > 0)
          .map(|n| n.min(u32::MAX as i64) as u32)
    }
}

/// The unit of work submitted to the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request
{   #[serde(default)]
    pub prompt: String
  , #[serde(default)]
    pub code: String
  , #[serde(default)]
    pub models: Vec<ModelConfig>
  , /// `<= 0` means the default deadline
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout_seconds: i64
  , #[serde(default, skip_serializing_if = "is_false")]
    pub stream: bool
}

fn is_zero(n: &i64) -> bool
{   *n == 0
}

fn is_false(b: &bool) -> bool
{   !*b
}

impl Request
{   /// Deadline covering the whole fan-out
    pub fn effective_timeout(&self) -> Duration
    {   crate::config::effective_timeout(self.timeout_seconds)
    }

    /// Structural problems that make the request useless.
    /// Empty result means the request looks valid.
    pub fn validate(&self) -> Vec<String>
    {   let mut issues = vec![];

        if self.models.is_empty()
        {   issues.push(
              "no models configured (models array is empty)".to_string()
            );
        }

        for (i, m) in self.models.iter().enumerate()
        {   let fields
              = [("name", &m.name), ("provider", &m.provider), ("model", &m.model)];
            for (field, value) in fields
            {   if value.is_empty()
                {   issues.push(format!("models[{}].{} is empty", i, field));
                }
            }
        }

        if self.timeout_seconds < 0
        {   issues.push("timeout_seconds is negative".to_string());
        }

        issues
    }
}

/// Outcome of one configured model's invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult
{   pub name: String
  , pub provider: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl ModelResult
{   pub fn ok(cfg: &ModelConfig, text: String) -> Self
    {   ModelResult
        {   name: cfg.name.clone()
          , provider: cfg.provider.clone()
          , text: Some(text)
          , error: None
        }
    }

    pub fn failed(cfg: &ModelConfig, error: impl ToString) -> Self
    {   ModelResult
        {   name: cfg.name.clone()
          , provider: cfg.provider.clone()
          , text: None
          , error: Some(error.to_string())
        }
    }

    pub fn is_ok(&self) -> bool
    {   self.error.is_none()
    }
}

/// Batched-mode output, index-aligned with `Request.models`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response
{   pub results: Vec<ModelResult>
}

/// One line of streaming-mode output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent
{   Result(ModelResult)
  , Done
}

/// Content sent to a provider: the prompt, with code fenced below it
pub fn compose_content(prompt: &str, code: &str) -> String
{   if code.is_empty()
    {   prompt.to_string()
    } else
    {   format!("{}\n\n```code\n{}\n```", prompt, code)
    }
}
