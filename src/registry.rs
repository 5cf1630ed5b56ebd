//! Identifier → provider mapping, built once at startup

use std::collections::HashMap;
use std::sync::Arc;
use log::debug;

use crate::config;
use crate::providers::{
  AnthropicProvider, ModelProvider, OllamaProvider, OpenAiProvider
};

/// Providers the orchestrator can dispatch to.
/// Populated before serving, then shared read-only behind an `Arc`.
#[derive(Default, Clone)]
pub struct ProviderRegistry
{   providers: HashMap<String, Arc<dyn ModelProvider>>
}

impl ProviderRegistry
{   /// Empty registry
    pub fn new() -> Self
    {   ProviderRegistry::default()
    }

    /// Registry holding every built-in provider
    pub fn with_defaults() -> Self
    {   let mut registry = ProviderRegistry::new();
        registry.register(config::OPENAI.id, OpenAiProvider::new());
        registry.register(config::ANTHROPIC.id, AnthropicProvider::new());
        registry.register(config::OLLAMA.id, OllamaProvider::new());
        registry
    }

    /// Associate `id` with `provider`, replacing any previous entry
    pub fn register<P>(&mut self, id: impl Into<String>, provider: P)
    where
      P: ModelProvider + 'static
    {   self.register_arc(id, Arc::new(provider));
    }

    pub fn register_arc(
      &mut self
    , id: impl Into<String>
    , provider: Arc<dyn ModelProvider>
    )
    {   let id = id.into();
        debug!("Registering provider: {}", id);
        self.providers.insert(id, provider);
    }

    pub fn resolve(&self, id: &str) -> Option<Arc<dyn ModelProvider>>
    {   self.providers.get(id).cloned()
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<String>
    {   let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize
    {   self.providers.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.debug_struct("ProviderRegistry")
          .field("providers", &self.ids())
          .finish()
    }
}
