//! Concurrent fan-out of one completion request across many providers.
//!
//! Every provider in the set is invoked with the same option chain, one task
//! per provider, joined before returning. Failures are isolated per provider
//! and aggregated: a fan-out call is all-or-nothing, but the aggregated
//! error enumerates every individual failure.

use crate::error::{CompletionError, FanoutError};
use crate::options::Opt;
use crate::registry::ProviderMap;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Invokes every provider in `providers` concurrently with the same options.
///
/// On full success, returns one extracted response per provider key. If any
/// provider fails, no success map is returned; the [`FanoutError`] lists
/// each failing `(key, cause)` pair. Cancelling `cancel` aborts all in-flight
/// calls, each of which then participates in the aggregate as `Cancelled`.
pub async fn completion_many(
    cancel: &CancellationToken,
    providers: &ProviderMap,
    opts: &[Opt],
) -> Result<HashMap<String, String>, FanoutError> {
    debug!(providers = %providers.describe(), "fan-out started");

    let tasks = providers.iter().map(|(key, provider)| {
        let key = key.to_string();
        let provider = provider.clone();
        async move { (key, provider.complete(cancel, opts).await) }
    });

    collect(join_all(tasks).await)
}

/// Like [`completion_many`], but decodes each provider's raw response into a
/// fresh `T`.
///
/// Decoding is per provider: one provider's decode failure never disturbs
/// what another provider produced, though any failure still fails the whole
/// call.
pub async fn completion_many_as<T>(
    cancel: &CancellationToken,
    providers: &ProviderMap,
    opts: &[Opt],
) -> Result<HashMap<String, T>, FanoutError>
where
    T: DeserializeOwned + Send,
{
    debug!(providers = %providers.describe(), "typed fan-out started");

    let tasks = providers.iter().map(|(key, provider)| {
        let key = key.to_string();
        let provider = provider.clone();
        async move {
            // Fresh T per provider: decode failures stay with their provider.
            let result = match provider.complete(cancel, opts).await {
                Ok(raw) => serde_json::from_str::<T>(&raw).map_err(CompletionError::from),
                Err(err) => Err(err),
            };
            (key, result)
        }
    });

    collect(join_all(tasks).await)
}

/// Folds joined per-provider results into a success map or an aggregated
/// error. All-or-nothing: a single failure discards every success.
fn collect<T>(
    results: Vec<(String, Result<T, CompletionError>)>,
) -> Result<HashMap<String, T>, FanoutError> {
    let mut successes = HashMap::new();
    let mut failures = Vec::new();

    for (key, result) in results {
        match result {
            Ok(value) => {
                successes.insert(key, value);
            }
            Err(err) => failures.push((key, err)),
        }
    }

    if !failures.is_empty() {
        let err = FanoutError::new(failures);
        warn!(error = %err, "fan-out failed");
        return Err(err);
    }

    Ok(successes)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::CompletionError;
    use crate::options::Opt;
    use crate::provider::{Completion, CompletionCounters, Identity, Observability};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    type Respond = Arc<dyn Fn() -> Result<String, CompletionError> + Send + Sync>;

    /// In-memory provider with a scripted outcome and optional latency.
    pub(crate) struct MockProvider {
        name: String,
        respond: Respond,
        delay: Duration,
        counters: CompletionCounters,
    }

    impl MockProvider {
        pub(crate) fn ok(name: &str, response: &str) -> Self {
            let response = response.to_string();
            Self::scripted(name, move || Ok(response.clone()))
        }

        pub(crate) fn failing(
            name: &str,
            err: impl Fn() -> CompletionError + Send + Sync + 'static,
        ) -> Self {
            Self::scripted(name, move || Err(err()))
        }

        pub(crate) fn scripted(
            name: &str,
            respond: impl Fn() -> Result<String, CompletionError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                name: name.to_string(),
                respond: Arc::new(respond),
                delay: Duration::ZERO,
                counters: CompletionCounters::new(),
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Completion for MockProvider {
        async fn complete(
            &self,
            cancel: &CancellationToken,
            _opts: &[Opt],
        ) -> Result<String, CompletionError> {
            let result = tokio::select! {
                _ = cancel.cancelled() => Err(CompletionError::Cancelled),
                _ = tokio::time::sleep(self.delay) => (self.respond)(),
            };
            match &result {
                Ok(_) => self.counters.record_success(),
                Err(_) => self.counters.record_failure(),
            }
            result
        }
    }

    impl Identity for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> &'static str {
            "mock"
        }
    }

    impl Observability for MockProvider {
        fn counters(&self) -> &CompletionCounters {
            &self.counters
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockProvider;
    use super::*;
    use crate::error::CompletionError;
    use crate::options;
    use crate::provider::Observability;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn ping() -> Vec<Opt> {
        vec![options::user_messages(["ping"])]
    }

    #[tokio::test]
    async fn test_all_success_returns_full_map() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("a", "hi")))
            .with(Arc::new(MockProvider::ok("b", "yo")));

        let cancel = CancellationToken::new();
        let responses = completion_many(&cancel, &map, &ping()).await.unwrap();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses["a"], "hi");
        assert_eq!(responses["b"], "yo");
    }

    #[tokio::test]
    async fn test_key_set_matches_provider_set() {
        let mut map = ProviderMap::new();
        // Key differs from the provider's own name; the registry key wins.
        map.insert("primary", Arc::new(MockProvider::ok("a", "hi")));

        let cancel = CancellationToken::new();
        let responses = completion_many(&cancel, &map, &ping()).await.unwrap();

        let mut keys: Vec<_> = responses.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["primary"]);
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_whole_call() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("a", "hi")))
            .with(Arc::new(MockProvider::failing("b", || {
                CompletionError::NoContent
            })));

        let cancel = CancellationToken::new();
        let err = completion_many(&cancel, &map, &ping()).await.unwrap_err();

        // Exactly the failing providers, no more, no fewer.
        assert_eq!(err.failed_keys(), vec!["b"]);
        assert!(matches!(
            err.failures()[0].1,
            CompletionError::NoContent
        ));
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_siblings() {
        let succeeding = Arc::new(MockProvider::ok("a", "hi").with_delay(Duration::from_millis(30)));
        let map = ProviderMap::new()
            .with(succeeding.clone())
            .with(Arc::new(MockProvider::failing("b", || {
                CompletionError::Api {
                    status: 500,
                    message: "boom".to_string(),
                }
            })));

        let cancel = CancellationToken::new();
        let err = completion_many(&cancel, &map, &ping()).await.unwrap_err();

        assert_eq!(err.failed_keys(), vec!["b"]);
        // The sibling ran to successful completion despite b's early failure.
        assert_eq!(succeeding.counters().completed(), 1);
        assert_eq!(succeeding.counters().failed(), 0);
    }

    #[tokio::test]
    async fn test_all_failures_are_enumerated() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::failing("a", || {
                CompletionError::Auth
            })))
            .with(Arc::new(MockProvider::failing("b", || {
                CompletionError::NoContent
            })))
            .with(Arc::new(MockProvider::ok("c", "fine")));

        let cancel = CancellationToken::new();
        let err = completion_many(&cancel, &map, &ping()).await.unwrap_err();

        assert_eq!(err.len(), 2);
        assert_eq!(err.failed_keys(), vec!["a", "b"]);
        assert!(!err.contains("c"));
    }

    #[tokio::test]
    async fn test_empty_provider_set_yields_empty_map() {
        let cancel = CancellationToken::new();
        let responses = completion_many(&cancel, &ProviderMap::new(), &ping())
            .await
            .unwrap();
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_all_calls_promptly() {
        let map = ProviderMap::new()
            .with(Arc::new(
                MockProvider::ok("slow-a", "never").with_delay(Duration::from_secs(60)),
            ))
            .with(Arc::new(
                MockProvider::ok("slow-b", "never").with_delay(Duration::from_secs(60)),
            ));

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = completion_many(&cancel, &map, &ping()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));

        assert_eq!(err.failed_keys(), vec!["slow-a", "slow-b"]);
        for (_, cause) in err.failures() {
            assert!(matches!(cause, CompletionError::Cancelled));
        }
    }

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Verdict {
        ok: bool,
    }

    #[tokio::test]
    async fn test_typed_fanout_decodes_each_response() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("a", r#"{"ok": true}"#)))
            .with(Arc::new(MockProvider::ok("b", r#"{"ok": false}"#)));

        let cancel = CancellationToken::new();
        let verdicts: HashMap<String, Verdict> =
            completion_many_as(&cancel, &map, &ping()).await.unwrap();

        assert_eq!(verdicts["a"], Verdict { ok: true });
        assert_eq!(verdicts["b"], Verdict { ok: false });
    }

    #[tokio::test]
    async fn test_typed_decode_failures_are_isolated_per_provider() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("good", r#"{"ok": true}"#)))
            .with(Arc::new(MockProvider::ok("bad", "not json")));

        let cancel = CancellationToken::new();
        let err = completion_many_as::<Verdict>(&cancel, &map, &ping())
            .await
            .unwrap_err();

        // Only the undecodable provider fails, and it fails with Decode.
        assert_eq!(err.failed_keys(), vec!["bad"]);
        assert!(matches!(err.failures()[0].1, CompletionError::Decode(_)));
    }

    #[tokio::test]
    async fn test_scenario_one_timeout_one_success() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("A", "hi")))
            .with(Arc::new(MockProvider::failing("B", || {
                CompletionError::Cancelled
            })));

        let cancel = CancellationToken::new();
        let err = completion_many(&cancel, &map, &ping()).await.unwrap_err();
        assert_eq!(err.failed_keys(), vec!["B"]);
    }

    #[tokio::test]
    async fn test_scenario_two_successes() {
        let map = ProviderMap::new()
            .with(Arc::new(MockProvider::ok("A", "hi")))
            .with(Arc::new(MockProvider::ok("B", "yo")));

        let cancel = CancellationToken::new();
        let responses = map.completion_many(&cancel, &ping()).await.unwrap();
        assert_eq!(responses["A"], "hi");
        assert_eq!(responses["B"], "yo");
    }
}
