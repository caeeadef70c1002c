//! Error types for completion calls and fan-out aggregation.

use std::fmt;
use thiserror::Error;

/// Validation failure for a merged set of completion options.
///
/// Reported once, after the whole option chain has been applied; individual
/// option constructors never fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("model is required")]
    MissingModel,

    #[error("at least one user message is required")]
    NoUserMessages,

    #[error("{field} must be non-negative, got {value}")]
    NegativeField { field: &'static str, value: f64 },
}

/// Failure of a single completion call against one backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The merged options failed validation; no request was sent.
    #[error("invalid options: {0}")]
    Options(#[from] OptionsError),

    /// Network-level failure talking to the backend.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the credential.
    #[error("authentication failed")]
    Auth,

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered successfully but produced no usable content.
    /// Distinct from a transport error.
    #[error("no content in response")]
    NoContent,

    /// The raw response could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call observed cancellation before the backend answered.
    #[error("cancelled")]
    Cancelled,

    /// The provider could not be constructed (missing credential, bad
    /// endpoint).
    #[error("provider setup: {0}")]
    Setup(String),
}

/// Aggregated failure of a fan-out call.
///
/// Enumerates every individual provider failure as a `(key, cause)` pair,
/// sorted by key. A fan-out call is all-or-nothing: if this error exists, no
/// success map was returned.
#[derive(Debug)]
pub struct FanoutError {
    failures: Vec<(String, CompletionError)>,
}

impl std::error::Error for FanoutError {}

impl FanoutError {
    pub(crate) fn new(mut failures: Vec<(String, CompletionError)>) -> Self {
        failures.sort_by(|a, b| a.0.cmp(&b.0));
        Self { failures }
    }

    /// The individual `(provider key, cause)` failures, sorted by key.
    pub fn failures(&self) -> &[(String, CompletionError)] {
        &self.failures
    }

    /// The keys of the providers that failed, sorted.
    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Whether the provider under `key` is among the failures.
    pub fn contains(&self, key: &str) -> bool {
        self.failures.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for FanoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} provider(s) failed: ", self.failures.len())?;
        for (i, (key, cause)) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{key}: {cause}")?;
        }
        Ok(())
    }
}
