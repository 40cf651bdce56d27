//! Cached secrets client with TTL.
//!
//! A reconciliation loop recompiles routes on every observed change, and each
//! compilation resolves the same Redis password and client secrets again. The
//! cache keeps those lookups off the backend for the configured TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use routeplane::secrets::{CachedSecretsClient, EnvVarSecretsClient};
//! use std::time::Duration;
//!
//! let client = CachedSecretsClient::new(EnvVarSecretsClient::new(), Duration::from_secs(300));
//! let secret = client.get_secret("redis_password").await?;
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::client::SecretsClient;
use super::error::Result;

#[derive(Debug, Clone)]
struct CachedSecret {
    value: String,
    cached_at: Instant,
}

impl CachedSecret {
    fn new(value: String) -> Self {
        Self { value, cached_at: Instant::now() }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Wraps any [`SecretsClient`] with an in-memory TTL cache.
///
/// Safe to share across concurrent compilations.
pub struct CachedSecretsClient<T: SecretsClient> {
    inner: T,
    cache: Arc<RwLock<HashMap<String, CachedSecret>>>,
    ttl: Duration,
}

impl<T: SecretsClient> CachedSecretsClient<T> {
    /// Creates a new cached secrets client.
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
                    return Ok(cached.value.clone());
                }
                tracing::debug!(key = %key, "Cached secret expired");
            }
        }

        tracing::debug!(key = %key, "Cache miss, fetching from backend");
        let value = self.inner.get_secret(key).await?;

        {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), CachedSecret::new(value.clone()));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsClient;

    #[tokio::test]
    async fn test_cache_hit() {
        let backend = InMemorySecretsClient::new().with_secret("cached_key", "cached-value");
        let client = CachedSecretsClient::new(backend, Duration::from_secs(60));

        assert_eq!(client.get_secret("cached_key").await.unwrap(), "cached-value");
        assert_eq!(client.cache_size().await, 1);
        assert_eq!(client.get_secret("cached_key").await.unwrap(), "cached-value");

        assert_eq!(client.inner.lookups(), 1);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let backend = InMemorySecretsClient::new().with_secret("expiry_key", "initial-value");
        let client = CachedSecretsClient::new(backend, Duration::from_millis(100));

        assert_eq!(client.get_secret("expiry_key").await.unwrap(), "initial-value");

        tokio::time::sleep(Duration::from_millis(150)).await;
        client.inner.insert("expiry_key", "updated-value");

        assert_eq!(client.get_secret("expiry_key").await.unwrap(), "updated-value");
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let backend = InMemorySecretsClient::new();
        let client = CachedSecretsClient::new(backend, Duration::from_secs(60));

        assert!(client.get_secret("missing").await.is_err());
        assert_eq!(client.cache_size().await, 0);
    }
}
