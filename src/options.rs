//! Request options shared by every backend.
//!
//! Options are built with an ordered chain of mutators: each `Opt` is a pure
//! function over the in-progress [`CompletionOptions`], applied left to right
//! on top of the baseline defaults. Later options win for the same field.
//! Validation runs once, after the whole chain has been applied.

use crate::error::OptionsError;
use std::fmt;
use std::sync::Arc;

/// Baseline maximum response tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Baseline sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// The merged, validated configuration for one completion call.
///
/// Created fresh per call and discarded after use; providers never retain it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// Model identifier. Providers prepend their own default, so callers only
    /// set this to override it.
    pub model: String,

    /// User-role messages. At least one is required.
    pub user_messages: Vec<String>,

    /// System-role messages, sent before the user messages.
    pub system_messages: Vec<String>,

    /// Maximum tokens in the response.
    pub max_tokens: u32,

    /// Sampling seed. 0 means unset; determinism is best-effort on the
    /// backend side either way.
    pub seed: u64,

    /// Whether the backend should stream. Carried on the wire; this crate
    /// exposes no streaming API.
    pub stream: bool,

    /// Sampling temperature. Higher is more random.
    pub temperature: f64,

    /// Keep only the top-k highest-probability tokens. 0 means unset.
    pub top_k: u32,

    /// Nucleus sampling mass. 0 means unset.
    pub top_p: f64,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            user_messages: Vec::new(),
            system_messages: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            seed: 0,
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            top_k: 0,
            top_p: 0.0,
        }
    }
}

impl CompletionOptions {
    /// Applies `opts` in order on top of the baseline defaults, then
    /// validates the merged result as a whole.
    pub fn resolve<'a, I>(opts: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = &'a Opt>,
    {
        let mut merged = Self::default();
        for opt in opts {
            opt.apply(&mut merged);
        }
        merged.validate()?;
        Ok(merged)
    }

    /// Checks the merged configuration, reporting the first failing
    /// constraint.
    fn validate(&self) -> Result<(), OptionsError> {
        if self.model.is_empty() {
            return Err(OptionsError::MissingModel);
        }
        if self.user_messages.is_empty() {
            return Err(OptionsError::NoUserMessages);
        }
        if self.temperature < 0.0 {
            return Err(OptionsError::NegativeField {
                field: "temperature",
                value: self.temperature,
            });
        }
        if self.top_p < 0.0 {
            return Err(OptionsError::NegativeField {
                field: "top_p",
                value: self.top_p,
            });
        }
        Ok(())
    }
}

/// One mutation of the in-progress options.
///
/// Cheap to clone and shareable across concurrent calls; the executor hands
/// the same chain to every provider in a fan-out.
#[derive(Clone)]
pub struct Opt {
    name: &'static str,
    apply: Arc<dyn Fn(&mut CompletionOptions) + Send + Sync>,
}

impl Opt {
    fn new(
        name: &'static str,
        apply: impl Fn(&mut CompletionOptions) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            apply: Arc::new(apply),
        }
    }

    fn apply(&self, options: &mut CompletionOptions) {
        (self.apply)(options)
    }
}

impl fmt::Debug for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opt").field(&self.name).finish()
    }
}

/// Overrides the model. An empty string is a no-op, which is what lets
/// providers prepend their default model and still lose to the caller.
pub fn model(model: impl Into<String>) -> Opt {
    let model = model.into();
    Opt::new("model", move |o| {
        if !model.is_empty() {
            o.model = model.clone();
        }
    })
}

/// Replaces the user messages. An empty set is a no-op.
pub fn user_messages<I, S>(messages: I) -> Opt
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
    Opt::new("user_messages", move |o| {
        if !messages.is_empty() {
            o.user_messages = messages.clone();
        }
    })
}

/// Replaces the system messages. An empty set is a no-op.
pub fn system_messages<I, S>(messages: I) -> Opt
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
    Opt::new("system_messages", move |o| {
        if !messages.is_empty() {
            o.system_messages = messages.clone();
        }
    })
}

/// Overrides the response token limit. 0 is a no-op.
pub fn max_tokens(max_tokens: u32) -> Opt {
    Opt::new("max_tokens", move |o| {
        if max_tokens > 0 {
            o.max_tokens = max_tokens;
        }
    })
}

/// Sets the sampling seed. 0 is a no-op.
pub fn seed(seed: u64) -> Opt {
    Opt::new("seed", move |o| {
        if seed > 0 {
            o.seed = seed;
        }
    })
}

/// Sets the sampling temperature. 0 is a no-op, so the baseline default
/// cannot be explicitly reset to zero through this option.
pub fn temperature(temperature: f64) -> Opt {
    Opt::new("temperature", move |o| {
        if temperature != 0.0 {
            o.temperature = temperature;
        }
    })
}

/// Sets top-k sampling. 0 is a no-op.
pub fn top_k(top_k: u32) -> Opt {
    Opt::new("top_k", move |o| {
        if top_k > 0 {
            o.top_k = top_k;
        }
    })
}

/// Sets nucleus sampling mass. 0 is a no-op.
pub fn top_p(top_p: f64) -> Opt {
    Opt::new("top_p", move |o| {
        if top_p != 0.0 {
            o.top_p = top_p;
        }
    })
}

/// Sets the stream flag. Unlike the numeric options this always applies,
/// since `false` is a meaningful value.
pub fn stream(stream: bool) -> Opt {
    Opt::new("stream", move |o| o.stream = stream)
}
