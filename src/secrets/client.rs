//! Core secrets client trait.

use async_trait::async_trait;

use super::error::Result;

/// Trait for secret-resolution backends.
///
/// The compiler only ever reads secrets: every password or client secret a
/// route, consumer or gateway references is looked up through this trait
/// right before it is written into the sidecar handoff or a plugin config.
///
/// Implementations MUST NOT log secret values.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use routeplane::secrets::{Result, SecretsClient};
/// use async_trait::async_trait;
///
/// struct MySecretStore;
///
/// #[async_trait]
/// impl SecretsClient for MySecretStore {
///     async fn get_secret(&self, key: &str) -> Result<String> {
///         Ok("secret-value".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Retrieve a secret value by key.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`](super::SecretsError::NotFound) if the secret doesn't exist
    /// - [`SecretsError::BackendError`](super::SecretsError::BackendError) if the backend cannot serve the lookup
    async fn get_secret(&self, key: &str) -> Result<String>;
}
