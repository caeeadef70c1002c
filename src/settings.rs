//! Backend endpoints, credentials and default models resolved from the
//! environment.
//!
//! Resolved once, at provider construction; nothing here is consulted on the
//! completion path. No globals: callers ask for a [`Settings`] value and own
//! it.

use crate::provider::ProviderConfig;

/// Default OpenAI chat-completions endpoint.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default Anthropic messages endpoint.
pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Default HuggingFace inference endpoint.
pub const DEFAULT_HUGGINGFACE_ENDPOINT: &str =
    "https://api-inference.huggingface.co/v1/chat/completions";

/// Default local Ollama chat endpoint.
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/chat";

/// Default OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Default Anthropic model.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default HuggingFace model.
pub const DEFAULT_HUGGINGFACE_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// Default Ollama model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Per-backend endpoint URLs, credentials and default models.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_endpoint: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,

    pub anthropic_endpoint: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,

    pub huggingface_endpoint: String,
    pub huggingface_api_key: Option<String>,
    pub huggingface_model: String,

    pub ollama_endpoint: String,
    pub ollama_model: String,
}

impl Settings {
    /// Reads settings from the process environment, loading a `.env` file if
    /// one is present. Endpoints and models fall back to the documented
    /// defaults; keys stay unset when their variable is missing.
    pub fn from_env() -> Self {
        // Best effort; a missing .env file is fine.
        let _ = dotenvy::dotenv();

        Self {
            openai_endpoint: env_or("OPENAI_ENDPOINT", DEFAULT_OPENAI_ENDPOINT),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            anthropic_endpoint: env_or("ANTHROPIC_ENDPOINT", DEFAULT_ANTHROPIC_ENDPOINT),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            anthropic_model: env_or("ANTHROPIC_MODEL", DEFAULT_ANTHROPIC_MODEL),
            huggingface_endpoint: env_or("HUGGINGFACE_ENDPOINT", DEFAULT_HUGGINGFACE_ENDPOINT),
            huggingface_api_key: env_opt("HUGGINGFACE_API_KEY"),
            huggingface_model: env_or("HUGGINGFACE_MODEL", DEFAULT_HUGGINGFACE_MODEL),
            ollama_endpoint: env_or("OLLAMA_ENDPOINT", DEFAULT_OLLAMA_ENDPOINT),
            ollama_model: env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
        }
    }

    /// Config for the OpenAI adapter: the preset with env overrides applied.
    pub fn openai_config(&self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.openai_endpoint.clone(),
            api_key: self.openai_api_key.clone(),
            default_model: self.openai_model.clone(),
            ..ProviderConfig::openai()
        }
    }

    /// Config for the Anthropic adapter: the preset with env overrides applied.
    pub fn anthropic_config(&self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.anthropic_endpoint.clone(),
            api_key: self.anthropic_api_key.clone(),
            default_model: self.anthropic_model.clone(),
            ..ProviderConfig::anthropic()
        }
    }

    /// Config for the HuggingFace adapter: the preset with env overrides applied.
    pub fn huggingface_config(&self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.huggingface_endpoint.clone(),
            api_key: self.huggingface_api_key.clone(),
            default_model: self.huggingface_model.clone(),
            ..ProviderConfig::huggingface()
        }
    }

    /// Config for the Ollama adapter: the preset with env overrides applied.
    pub fn ollama_config(&self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.ollama_endpoint.clone(),
            default_model: self.ollama_model.clone(),
            ..ProviderConfig::ollama()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
