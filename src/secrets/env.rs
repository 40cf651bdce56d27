//! Environment variable secrets backend.
//!
//! Reads secrets from environment variables with the `ROUTEPLANE_SECRET_`
//! prefix. Intended for local runs of the CLI and for development:
//!
//! ```bash
//! export ROUTEPLANE_SECRET_REDIS_PASSWORD="s3cr3t"
//! ```
//!
//! A reference `$<redis_password>` then resolves to `s3cr3t`. Characters other
//! than ASCII letters and digits are mapped to `_`.

use async_trait::async_trait;
use std::env;

use super::client::SecretsClient;
use super::error::{Result, SecretsError};

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "ROUTEPLANE_SECRET_";

/// Environment variable secrets backend (development only).
#[derive(Debug, Clone, Default)]
pub struct EnvVarSecretsClient {}

impl EnvVarSecretsClient {
    /// Creates a new environment variable secrets client.
    pub fn new() -> Self {
        Self::default()
    }

    fn key_to_env_var(key: &str) -> String {
        let normalized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, normalized)
    }
}

#[async_trait]
impl SecretsClient for EnvVarSecretsClient {
    async fn get_secret(&self, key: &str) -> Result<String> {
        let env_var = Self::key_to_env_var(key);

        env::var(&env_var).map_err(|_| {
            SecretsError::not_found(format!(
                "Secret '{}' not found in environment (looking for {})",
                key, env_var
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_env_var() {
        assert_eq!(
            EnvVarSecretsClient::key_to_env_var("redis_password"),
            "ROUTEPLANE_SECRET_REDIS_PASSWORD"
        );
        assert_eq!(
            EnvVarSecretsClient::key_to_env_var("zone-a/route-1/clientSecret"),
            "ROUTEPLANE_SECRET_ZONE_A_ROUTE_1_CLIENTSECRET"
        );
    }

    #[tokio::test]
    async fn test_get_secret_not_found() {
        let client = EnvVarSecretsClient::new();
        let result = client.get_secret("routeplane_nonexistent_secret").await;
        assert!(matches!(result.unwrap_err(), SecretsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_secret_from_env() {
        std::env::set_var("ROUTEPLANE_SECRET_ENV_BACKEND_TEST", "from-env");

        let client = EnvVarSecretsClient::new();
        assert_eq!(client.get_secret("env_backend_test").await.unwrap(), "from-env");

        std::env::remove_var("ROUTEPLANE_SECRET_ENV_BACKEND_TEST");
    }
}
