//! Keyed collection of providers.

use crate::error::FanoutError;
use crate::fanout;
use crate::options::Opt;
use crate::provider::Provider;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Providers keyed by a caller-chosen label, typically the provider's name.
///
/// Built once at composition time and treated as read-only for the duration
/// of any fan-out call. Iteration order is unspecified.
#[derive(Default, Clone)]
pub struct ProviderMap {
    inner: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a provider under an explicit key, replacing any previous
    /// entry for that key.
    pub fn insert(&mut self, key: impl Into<String>, provider: Arc<dyn Provider>) {
        self.inner.insert(key.into(), provider);
    }

    /// Inserts a provider under its own name.
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn Provider>) -> Self {
        self.insert(provider.name().to_string(), provider);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Provider>> {
        self.inner.get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Provider>)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Flattens to a sequence, for when key identity is not needed. Order is
    /// unspecified.
    pub fn to_vec(&self) -> Vec<Arc<dyn Provider>> {
        self.inner.values().cloned().collect()
    }

    /// Comma-joined key listing for diagnostics. Order is unspecified.
    pub fn describe(&self) -> String {
        self.inner
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fans the same options out to every provider concurrently. See
    /// [`fanout::completion_many`].
    pub async fn completion_many(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<HashMap<String, String>, FanoutError> {
        fanout::completion_many(cancel, self, opts).await
    }

    /// Typed fan-out. See [`fanout::completion_many_as`].
    pub async fn completion_many_as<T>(
        &self,
        cancel: &CancellationToken,
        opts: &[Opt],
    ) -> Result<HashMap<String, T>, FanoutError>
    where
        T: DeserializeOwned + Send,
    {
        fanout::completion_many_as(cancel, self, opts).await
    }
}

impl FromIterator<(String, Arc<dyn Provider>)> for ProviderMap {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn Provider>)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ProviderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for ProviderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderMap")
            .field("keys", &self.inner.keys().collect::<Vec<_>>())
            .finish()
    }
}
