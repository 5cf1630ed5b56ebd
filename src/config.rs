//! Defaults for the built-in providers and the dispatch deadline

use std::time::Duration;

/// Deadline applied when a request carries `timeout_seconds <= 0`
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound on any requested deadline (one day)
pub const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Transport timeout on every provider HTTP client.
/// Backstop only; the shared deadline normally fires first.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Static description of a built-in provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDefaults
{   /// Identifier used in `ModelConfig.provider`
    pub id: &'static str
  , /// Human-readable label used in messages
    pub label: &'static str
  , /// Endpoint used when the model config has none
    pub endpoint: &'static str
  , /// Credential environment variable, `None` for no-auth providers
    pub api_key_env: Option<&'static str>
}

pub const OPENAI: ProviderDefaults = ProviderDefaults
{   id: "openai"
  , label: "OpenAI"
  , endpoint: "https://api.openai.com/v1/chat/completions"
  , api_key_env: Some("OPENAI_API_KEY")
};

pub const ANTHROPIC: ProviderDefaults = ProviderDefaults
{   id: "anthropic"
  , label: "Anthropic"
  , endpoint: "https://api.anthropic.com/v1/messages"
  , api_key_env: Some("ANTHROPIC_API_KEY")
};

pub const OLLAMA: ProviderDefaults = ProviderDefaults
{   id: "ollama"
  , label: "Ollama"
  , endpoint: "http://127.0.0.1:11434/api/chat"
  , api_key_env: None
};

/// Every provider registered by `ProviderRegistry::with_defaults`
pub const BUILTIN_PROVIDERS: [ProviderDefaults; 3]
  = [OPENAI, ANTHROPIC, OLLAMA];

/// Per-instance provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings
{   /// Endpoint used when the model config has none
    pub endpoint: String
  , /// Credential environment variable
    pub api_key_env: Option<String>
  , /// Transport timeout for the HTTP client
    pub http_timeout: Duration
}

impl ProviderSettings
{   /// Override the default endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self
    {   self.endpoint = endpoint.into();
        self
    }

    /// Override the credential environment variable
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self
    {   self.api_key_env = Some(var.into());
        self
    }
}

impl From<ProviderDefaults> for ProviderSettings
{   fn from(d: ProviderDefaults) -> Self
    {   ProviderSettings
        {   endpoint: d.endpoint.to_string()
          , api_key_env: d.api_key_env.map(str::to_string)
          , http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS)
        }
    }
}

/// Turn a wire `timeout_seconds` into the deadline duration
pub fn effective_timeout(timeout_seconds: i64) -> Duration
{   if timeout_seconds <= 0
    {   Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    } else
    {   Duration::from_secs((timeout_seconds as u64).min(MAX_TIMEOUT_SECS))
    }
}
