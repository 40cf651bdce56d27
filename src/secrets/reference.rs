//! Secret references embedded in declarative resources.
//!
//! Credentials in routes, consumers and gateways are either literal values or
//! references of the form `$<key>`. References are resolved through a
//! [`SecretsClient`]; literals are passed through untouched.

use std::sync::Arc;

use super::client::SecretsClient;
use super::error::{Result, SecretsError};

const START_TAG: &str = "$<";
const END_TAG: &str = ">";

/// Whether `value` is a `$<key>` reference.
pub fn is_reference(value: &str) -> bool {
    value.starts_with(START_TAG) && value.ends_with(END_TAG) && value.len() > START_TAG.len()
}

/// Strip the reference tags, returning the backend key.
pub fn reference_key(value: &str) -> Option<&str> {
    if !is_reference(value) {
        return None;
    }
    value.strip_prefix(START_TAG).and_then(|v| v.strip_suffix(END_TAG))
}

/// Resolves credential values for the compiler.
#[derive(Clone)]
pub struct SecretResolver {
    client: Arc<dyn SecretsClient>,
}

impl SecretResolver {
    pub fn new(client: Arc<dyn SecretsClient>) -> Self {
        Self { client }
    }

    /// Resolve `value`: fetch references, pass literals through.
    pub async fn resolve(&self, value: &str) -> Result<String> {
        match reference_key(value) {
            Some("") => Err(SecretsError::invalid_reference(value, "empty key")),
            Some(key) => self.client.get_secret(key).await,
            None => Ok(value.to_string()),
        }
    }

    /// Like [`resolve`](Self::resolve) but an empty value stays empty.
    pub async fn resolve_optional(&self, value: &str) -> Result<String> {
        if value.is_empty() {
            return Ok(String::new());
        }
        self.resolve(value).await
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsClient;

    #[test]
    fn test_reference_parsing() {
        assert!(is_reference("$<zone/route/password>"));
        assert_eq!(reference_key("$<zone/route/password>"), Some("zone/route/password"));
        assert_eq!(reference_key("plain"), None);
        assert_eq!(reference_key("$<unterminated"), None);
    }

    #[tokio::test]
    async fn test_resolve_reference_and_literal() {
        let backend = Arc::new(InMemorySecretsClient::new().with_secret("k", "v"));
        let resolver = SecretResolver::new(backend.clone());

        assert_eq!(resolver.resolve("$<k>").await.unwrap(), "v");
        assert_eq!(resolver.resolve("literal").await.unwrap(), "literal");
        assert_eq!(resolver.resolve_optional("").await.unwrap(), "");
        assert_eq!(backend.lookups(), 1);
    }

    #[tokio::test]
    async fn test_resolve_missing_reference_fails() {
        let resolver = SecretResolver::new(Arc::new(InMemorySecretsClient::new()));

        assert!(matches!(resolver.resolve("$<missing>").await, Err(SecretsError::NotFound { .. })));
        assert!(matches!(
            resolver.resolve("$<>").await,
            Err(SecretsError::InvalidReference { .. })
        ));
    }
}
