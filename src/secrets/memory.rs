//! In-memory secrets backend for dry runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::client::SecretsClient;
use super::error::{Result, SecretsError};

/// Secrets held in a map. Lookups are counted so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemorySecretsClient {
    secrets: RwLock<HashMap<String, String>>,
    lookups: AtomicUsize,
}

impl InMemorySecretsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.insert(key.into(), value.into());
        }
    }

    /// Number of `get_secret` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SecretsClient for InMemorySecretsClient {
    async fn get_secret(&self, key: &str) -> Result<String> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let secrets =
            self.secrets.read().map_err(|_| SecretsError::backend_error("secret map poisoned"))?;
        secrets.get(key).cloned().ok_or_else(|| SecretsError::not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_and_count() {
        let client = InMemorySecretsClient::new().with_secret("a", "1");

        assert_eq!(client.get_secret("a").await.unwrap(), "1");
        assert!(matches!(client.get_secret("b").await, Err(SecretsError::NotFound { .. })));
        assert_eq!(client.lookups(), 2);
    }
}
