//! Ollama local-inference adapter.
//!
//! No credential; sampling parameters travel in a nested `options` object
//! and content comes back as a single `message`.

use crate::error::CompletionError;
use crate::message::Message;
use crate::options::{self, CompletionOptions, Opt};
use crate::provider::{check_status, Completion, Identity, Observability};
use crate::provider::{CompletionCounters, ProviderBase, ProviderConfig};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const KIND: &str = "ollama";

/// Provider for a local Ollama server.
pub struct Ollama {
    base: ProviderBase,
    client: reqwest::Client,
}

impl Ollama {
    /// Creates a provider from an explicit config.
    pub fn new(config: ProviderConfig) -> Result<Self, CompletionError> {
        Ok(Self {
            base: ProviderBase::new(KIND, config)?,
            client: reqwest::Client::new(),
        })
    }

    /// Creates a provider from already-resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self, CompletionError> {
        Self::new(settings.ollama_config())
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
        let body = RequestBody::from_options(merged);

        let response = self
            .client
            .post(&self.base.endpoint)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: ResponseBody = response.json().await?;
        body.into_content()
    }
}

#[async_trait]
impl Completion for Ollama {
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

impl Identity for Ollama {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn kind(&self) -> &'static str {
        KIND
    }
}

impl Observability for Ollama {
    fn counters(&self) -> &CompletionCounters {
        &self.base.counters
    }
}

// Wire format.

#[derive(Debug, Serialize)]
struct RequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RequestBody {
    messages: Vec<Message>,
    model: String,
    stream: bool,
    options: RequestOptions,
}

impl RequestBody {
    fn from_options(o: &CompletionOptions) -> Self {
        Self {
            messages: Message::thread(&o.system_messages, &o.user_messages),
            model: o.model.clone(),
            stream: o.stream,
            options: RequestOptions {
                seed: (o.seed > 0).then_some(o.seed),
                temperature: (o.temperature != 0.0).then_some(o.temperature),
                top_k: (o.top_k > 0).then_some(o.top_k),
                top_p: (o.top_p != 0.0).then_some(o.top_p),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    message: Message,
}

impl ResponseBody {
    /// Message content, or the distinct no-content error.
    fn into_content(self) -> Result<String, CompletionError> {
        if self.message.content.trim().is_empty() {
            return Err(CompletionError::NoContent);
        }
        Ok(self.message.content)
    }
}
