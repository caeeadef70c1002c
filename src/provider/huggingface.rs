//! HuggingFace router adapter.
//!
//! The router speaks the OpenAI chat-completions shape, with `max_tokens`
//! instead of `max_completion_tokens`.

use crate::error::CompletionError;
use crate::message::Message;
use crate::options::{self, CompletionOptions, Opt};
use crate::provider::{check_status, Completion, Identity, Observability};
use crate::provider::{CompletionCounters, ProviderBase, ProviderConfig};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const KIND: &str = "huggingface";

/// Provider for HuggingFace's hosted chat-completions router.
pub struct HuggingFace {
    base: ProviderBase,
    client: reqwest::Client,
}

impl HuggingFace {
    /// Creates a provider from an explicit config.
    pub fn new(config: ProviderConfig) -> Result<Self, CompletionError> {
        Ok(Self {
            base: ProviderBase::new(KIND, config)?,
            client: reqwest::Client::new(),
        })
    }

    /// Creates a provider from already-resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self, CompletionError> {
        Self::new(settings.huggingface_config())
    }

    /// Creates a provider from [`Settings`] resolved from the environment.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::from_settings(&Settings::from_env())
    }

    /// Replaces the HTTP client, e.g. to set timeouts or proxies.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The underlying HTTP transport.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn request(&self, merged: &CompletionOptions) -> Result<String, CompletionError> {
        let api_key = self.base.require_api_key()?;
        let body = RequestBody::from_options(merged);

        let response = self
            .client
            .post(&self.base.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: ResponseBody = response.json().await?;
        body.into_content()
    }
}

#[async_trait]
impl Completion for HuggingFace {
    async fn complete(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<String, CompletionError> {
        let defaults = [options::model(self.base.default_model.clone())];
        let merged = CompletionOptions::resolve(defaults.iter().chain(opts))?;

        self.base.run(cancel, self.request(&merged)).await
    }
}

impl Identity for HuggingFace {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn kind(&self) -> &'static str {
        KIND
    }
}

impl Observability for HuggingFace {
    fn counters(&self) -> &CompletionCounters {
        &self.base.counters
    }
}

// Wire format.

#[derive(Debug, Serialize)]
struct RequestBody {
    messages: Vec<Message>,
    model: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

impl RequestBody {
    fn from_options(o: &CompletionOptions) -> Self {
        Self {
            messages: Message::thread(&o.system_messages, &o.user_messages),
            model: o.model.clone(),
            stream: o.stream,
            max_tokens: (o.max_tokens > 0).then_some(o.max_tokens),
            seed: (o.seed > 0).then_some(o.seed),
            temperature: (o.temperature != 0.0).then_some(o.temperature),
            top_p: (o.top_p != 0.0).then_some(o.top_p),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    choices: Vec<Choice>,
}

impl ResponseBody {
    /// First non-empty choice content, or the distinct no-content error.
    fn into_content(self) -> Result<String, CompletionError> {
        self.choices
            .into_iter()
            .map(|c| c.message.content)
            .find(|content| !content.trim().is_empty())
            .ok_or(CompletionError::NoContent)
    }
}
