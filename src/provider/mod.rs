//! LLM provider layer.
//!
//! Every backend implements the [`Completion`] capability; identity and
//! counters are separate capabilities so the fan-out executor only depends
//! on what it actually uses. [`Provider`] bundles all three for registry
//! storage.

use crate::error::CompletionError;
use crate::options::Opt;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

mod anthropic;
mod base;
mod huggingface;
mod metrics;
mod ollama;
mod openai;

pub use anthropic::Anthropic;
pub use base::{ProviderBase, ProviderConfig};
pub use huggingface::HuggingFace;
pub use metrics::CompletionCounters;
pub use ollama::Ollama;
pub use openai::OpenAi;

/// The core capability: one completion request against one backend.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Merges `opts` on top of the provider's defaults, performs one request
    /// and returns the primary text extracted from the backend's response.
    ///
    /// Cancelling `cancel` aborts the in-flight request and surfaces
    /// [`CompletionError::Cancelled`].
    async fn complete(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<String, CompletionError>;
}

/// Stable identity of a provider instance.
pub trait Identity {
    /// Instance name; the default fan-out aggregation key.
    fn name(&self) -> &str;

    /// Backend kind, e.g. `"openai"` or `"ollama"`.
    fn kind(&self) -> &'static str;
}

/// Observability accessors.
pub trait Observability {
    /// Success/failure counters for this instance.
    fn counters(&self) -> &CompletionCounters;
}

/// A full-fledged backend: completion plus identity plus counters. This is
/// what the registry stores.
pub trait Provider: Completion + Identity + Observability {}

impl<T: Completion + Identity + Observability + ?Sized> Provider for T {}

/// Typed completion, as an extension over [`Completion`].
///
/// The raw response is decoded into a fresh `T`; no caller-owned value is
/// mutated in place.
#[async_trait]
pub trait CompletionExt: Completion {
    /// Runs [`Completion::complete`], then decodes the extracted text as
    /// JSON into a new `T`.
    async fn complete_as<T>(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<T, CompletionError>
    where
        T: DeserializeOwned + Send,
    {
        let raw = self.complete(cancel, opts).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl<P: Completion + ?Sized> CompletionExt for P {}

/// Maps a non-success HTTP response to the error taxonomy: 401 is an auth
/// failure, everything else carries the status and body.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(CompletionError::Auth);
    }
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(CompletionError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options;

    struct Fixed;

    #[async_trait]
    impl Completion for Fixed {
        async fn complete(
            &self,
            _cancel: &CancellationToken,
            _opts: &[Opt],
        ) -> Result<String, CompletionError> {
            Ok(r#"{"answer": 42}"#.to_string())
        }
    }

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Answer {
        answer: u32,
    }

    #[tokio::test]
    async fn test_complete_as_decodes_raw_response() {
        let cancel = CancellationToken::new();
        let answer: Answer = Fixed
            .complete_as(&cancel, &[options::user_messages(["q"])])
            .await
            .unwrap();
        assert_eq!(answer, Answer { answer: 42 });
    }

    #[tokio::test]
    async fn test_complete_as_surfaces_decode_error() {
        struct NotJson;

        #[async_trait]
        impl Completion for NotJson {
            async fn complete(
                &self,
                _cancel: &CancellationToken,
                _opts: &[Opt],
            ) -> Result<String, CompletionError> {
                Ok("plain text".to_string())
            }
        }

        let cancel = CancellationToken::new();
        let result: Result<Answer, _> = NotJson.complete_as(&cancel, &[]).await;
        assert!(matches!(result, Err(CompletionError::Decode(_))));
    }
}
