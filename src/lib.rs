//! Chorus - one completion request, many LLM backends
//!
//! This crate provides:
//! - A uniform, validated options model shared by all backends
//! - A polymorphic completion contract every backend implements
//! - Adapters for OpenAI, Anthropic, HuggingFace and Ollama
//! - A fan-out executor that invokes many providers concurrently and
//!   aggregates per-provider results or failures
//!
//! ```no_run
//! use chorus::{options, Anthropic, Ollama, OpenAi, ProviderMap};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let providers = ProviderMap::new()
//!     .with(Arc::new(OpenAi::from_env()?))
//!     .with(Arc::new(Anthropic::from_env()?))
//!     .with(Arc::new(Ollama::from_env()?));
//!
//! let responses = providers
//!     .completion_many(
//!         &CancellationToken::new(),
//!         &[
//!             options::system_messages(["you are a salty pirate"]),
//!             options::user_messages(["why is the sky blue"]),
//!             options::temperature(1.0),
//!         ],
//!     )
//!     .await?;
//!
//! for (name, response) in &responses {
//!     println!("{name}: {response}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fanout;
pub mod message;
pub mod options;
pub mod provider;
pub mod registry;
pub mod settings;

pub use error::{CompletionError, FanoutError, OptionsError};
pub use fanout::{completion_many, completion_many_as};
pub use message::{Message, Role};
pub use options::{CompletionOptions, Opt};
pub use provider::{
    Anthropic, Completion, CompletionCounters, CompletionExt, HuggingFace, Identity, Observability,
    Ollama, OpenAi, Provider, ProviderConfig,
};
pub use registry::ProviderMap;
pub use settings::Settings;
