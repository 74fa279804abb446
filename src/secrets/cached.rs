//! TTL cache in front of a secrets client.
//!
//! CA documents change rarely while issuance can be frequent, so a short TTL
//! takes most reads off the store. Entries live in memory only and are
//! refetched after the TTL or once a caller invalidates them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::client::SecretsClient;
use super::error::Result;
use super::types::SecretString;

#[derive(Debug, Clone)]
struct CachedSecret {
    value: SecretString,
    cached_at: Instant,
}

impl CachedSecret {
    fn new(value: String) -> Self {
        Self { value: SecretString::new(value), cached_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Wraps any [`SecretsClient`] with an in-memory TTL cache.
///
/// Failed reads are not cached.
pub struct CachedSecretsClient<T: SecretsClient> {
    inner: T,
    cache: Arc<RwLock<HashMap<String, CachedSecret>>>,
    ttl: Duration,
}

impl<T: SecretsClient> CachedSecretsClient<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self { inner, cache: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    #[cfg(test)]
    async fn cache_size(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl<T: SecretsClient> SecretsClient for CachedSecretsClient<T> {
    async fn get_secret(&self, key: &str) -> Result<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(key) {
                if !cached.is_expired(self.ttl) {
                    tracing::debug!(key = %key, "Cache hit for secret");
                    return Ok(cached.value.expose_secret().to_string());
                }
                tracing::debug!(key = %key, "Cached secret expired");
            }
        }

        tracing::debug!(key = %key, "Cache miss, fetching from backend");
        let value = self.inner.get_secret(key).await?;

        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), CachedSecret::new(value.clone()));

        Ok(value)
    }

    async fn invalidate(&self, key: &str) {
        if self.cache.write().await.remove(key).is_some() {
            tracing::debug!(key = %key, "Invalidated cached secret");
        }
    }
}
