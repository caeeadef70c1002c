//! OpenAI chat-completions adapter.

use crate::error::CompletionError;
use crate::message::Message;
use crate::options::{self, CompletionOptions, Opt};
use crate::provider::{check_status, Completion, Identity, Observability};
use crate::provider::{CompletionCounters, ProviderBase, ProviderConfig};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

const KIND: &str = "openai";

/// Provider for the OpenAI chat-completions API.
pub struct OpenAi {
    base: ProviderBase,
    client: reqwest::Client,
}

impl OpenAi {
    /// Creates a provider from an explicit config.
    pub fn new(config: ProviderConfig) -> Result<Self, CompletionError> {
        Ok(Self {
            base: ProviderBase::new(KIND, config)?,
            client: reqwest::Client::new(),
        })
    }

    /// Creates a provider from already-resolved [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self, CompletionError> {
        Self::new(settings.openai_config())
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
impl Completion for OpenAi {
    async fn complete(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<String, CompletionError> {
        // Default model first, so caller options still win.
        let defaults = [options::model(self.base.default_model.clone())];
        let merged = CompletionOptions::resolve(defaults.iter().chain(opts))?;

        self.base.run(cancel, self.request(&merged)).await
    }
}

impl Identity for OpenAi {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn kind(&self) -> &'static str {
        KIND
    }
}

impl Observability for OpenAi {
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
    max_completion_tokens: Option<u32>,
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
            max_completion_tokens: (o.max_tokens > 0).then_some(o.max_tokens),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn merged() -> CompletionOptions {
        CompletionOptions::resolve(&[
            options::model("gpt-4o"),
            options::system_messages(["be brief"]),
            options::user_messages(["why is the sky blue"]),
            options::seed(7),
            options::top_p(0.9),
        ])
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RequestBody::from_options(&merged())).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_completion_tokens"], 4096);
        assert_eq!(body["seed"], 7);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "why is the sky blue");
        // Unset sampling fields are omitted entirely.
        assert!(body.get("top_k").is_none());
    }

    #[test]
    fn test_extracts_first_nonempty_choice() {
        let response: ResponseBody = serde_json::from_str(
            r#"{
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "  "}},
                    {"index": 1, "message": {"role": "assistant", "content": "blue skies"}}
                ],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
            }"#,
        )
        .unwrap();

        assert_eq!(response.into_content().unwrap(), "blue skies");
    }

    #[test]
    fn test_empty_choices_is_no_content() {
        let response: ResponseBody = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            response.into_content(),
            Err(CompletionError::NoContent)
        ));
    }

    #[tokio::test]
    async fn test_preset_default_model_fills_in_for_empty_override() {
        // No credential, so the call stops at the key check. Reaching it at
        // all means the preset's default model satisfied validation.
        let provider = OpenAi::new(ProviderConfig::openai()).unwrap();

        let cancel = CancellationToken::new();
        let err = provider
            .complete(
                &cancel,
                &[options::model(""), options::user_messages(["hi"])],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Setup(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let provider = OpenAi::new(
            ProviderConfig::new("", "http://localhost:1/never").with_default_model("gpt-4o"),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let err = provider
            .complete(&cancel, &[options::user_messages(["hi"])])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Setup(_)));
        assert_eq!(provider.counters().failed(), 1);
    }
}
