pub mod error;
pub mod config;
pub mod deadline;
pub mod providers;
pub mod registry;
pub mod request;
pub mod engine;

/*

orchd takes one request (a prompt, an optional code excerpt and a list
of model configs) and sends it to every configured model at once,
collecting each answer or error into one result set.

orchd/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── main.rs         # stdin/stdout binary
│   ├── error.rs        # Error type
│   ├── config.rs       # Provider defaults, timeouts
│   ├── deadline.rs     # Shared cancellation scope
│   ├── request.rs      # Request / result / event types
│   ├── registry.rs     # Provider id -> provider
│   ├── engine.rs       # Batched and streaming fan-out
│   └── providers/
│       ├── mod.rs      # ModelProvider trait, shared HTTP decode
│       ├── openai.rs
│       ├── anthropic.rs
│       └── ollama.rs
└── tests/

*/

pub use deadline::Deadline;
pub use engine::Orchestrator;
pub use error::Error;
pub use providers::ModelProvider;
pub use registry::ProviderRegistry;
pub use request::{ModelConfig, ModelResult, Request, Response, StreamEvent};

/// Crate version reported by `orchd --version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
