//! Shared per-provider state and construction.

use crate::error::CompletionError;
use crate::provider::metrics::CompletionCounters;
use crate::settings;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for constructing a provider.
///
/// Resolved once, at construction time; providers hold no per-call mutable
/// state beyond their counters, which is what makes sharing one instance
/// across concurrent fan-out calls safe.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Display name for the provider, used as the fan-out aggregation key.
    pub name: String,
    /// Endpoint URL the completion request is posted to.
    pub endpoint: String,
    /// API key, if the backend requires one.
    pub api_key: Option<String>,
    /// Model used when the caller does not override it.
    pub default_model: String,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: None,
            default_model: String::new(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the default model.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// OpenAI preset: default endpoint and model, no credential.
    pub fn openai() -> Self {
        Self::new("openai", settings::DEFAULT_OPENAI_ENDPOINT)
            .with_default_model(settings::DEFAULT_OPENAI_MODEL)
    }

    /// Anthropic preset: default endpoint and model, no credential.
    pub fn anthropic() -> Self {
        Self::new("anthropic", settings::DEFAULT_ANTHROPIC_ENDPOINT)
            .with_default_model(settings::DEFAULT_ANTHROPIC_MODEL)
    }

    /// HuggingFace preset: default endpoint and model, no credential.
    pub fn huggingface() -> Self {
        Self::new("huggingface", settings::DEFAULT_HUGGINGFACE_ENDPOINT)
            .with_default_model(settings::DEFAULT_HUGGINGFACE_MODEL)
    }

    /// Local Ollama preset: default endpoint and model.
    pub fn ollama() -> Self {
        Self::new("ollama", settings::DEFAULT_OLLAMA_ENDPOINT)
            .with_default_model(settings::DEFAULT_OLLAMA_MODEL)
    }
}

/// Identity, endpoint, credential and counters common to every adapter.
#[derive(Debug)]
pub struct ProviderBase {
    pub(crate) name: String,
    pub(crate) kind: &'static str,
    pub(crate) endpoint: String,
    pub(crate) api_key: Option<String>,
    pub(crate) default_model: String,
    pub(crate) counters: CompletionCounters,
}

impl ProviderBase {
    /// Builds the shared state from a config, filling an empty name with the
    /// backend kind. The endpoint is required.
    pub(crate) fn new(kind: &'static str, config: ProviderConfig) -> Result<Self, CompletionError> {
        if config.endpoint.is_empty() {
            return Err(CompletionError::Setup(format!(
                "{kind}: endpoint is required"
            )));
        }

        let name = if config.name.is_empty() {
            kind.to_string()
        } else {
            config.name
        };

        Ok(Self {
            name,
            kind,
            endpoint: config.endpoint,
            api_key: config.api_key,
            default_model: config.default_model,
            counters: CompletionCounters::new(),
        })
    }

    /// Runs one backend request raced against cancellation, recording the
    /// outcome in the counters and the log.
    pub(crate) async fn run<F>(
        &self,
        cancel: &CancellationToken,
        request: F,
    ) -> Result<String, CompletionError>
    where
        F: Future<Output = Result<String, CompletionError>> + Send,
    {
        let started = Instant::now();

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CompletionError::Cancelled),
            result = request => result,
        };

        match &result {
            Ok(_) => {
                self.counters.record_success();
                debug!(
                    provider = %self.name,
                    kind = self.kind,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "completion created"
                );
            }
            Err(err) => {
                self.counters.record_failure();
                warn!(provider = %self.name, kind = self.kind, error = %err, "completion failed");
            }
        }

        result
    }

    /// The API key, or a setup error naming the backend.
    pub(crate) fn require_api_key(&self) -> Result<&str, CompletionError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CompletionError::Setup(format!("{}: API key is required", self.kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_falls_back_to_kind() {
        let base =
            ProviderBase::new("testkind", ProviderConfig::new("", "http://localhost")).unwrap();
        assert_eq!(base.name, "testkind");
    }

    #[test]
    fn test_missing_endpoint_is_a_setup_error() {
        let err = ProviderBase::new("testkind", ProviderConfig::new("x", "")).unwrap_err();
        assert!(matches!(err, CompletionError::Setup(_)));
    }

    #[test]
    fn test_presets_carry_a_default_model() {
        for preset in [
            ProviderConfig::openai(),
            ProviderConfig::anthropic(),
            ProviderConfig::huggingface(),
            ProviderConfig::ollama(),
        ] {
            assert!(!preset.default_model.is_empty(), "{}", preset.name);
            assert!(!preset.endpoint.is_empty(), "{}", preset.name);
        }
    }

    #[test]
    fn test_require_api_key() {
        let base = ProviderBase::new(
            "testkind",
            ProviderConfig::new("x", "http://localhost").with_api_key("secret"),
        )
        .unwrap();
        assert_eq!(base.require_api_key().unwrap(), "secret");

        let keyless =
            ProviderBase::new("testkind", ProviderConfig::new("x", "http://localhost")).unwrap();
        assert!(keyless.require_api_key().is_err());
    }
}
