//! # Configuration Settings
//!
//! Defines the configuration structure for the routeplane compiler.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::admin::AdminClientConfig;
use crate::errors::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Gateway admin API connection
    #[validate(nested)]
    pub admin: AdminConfig,

    /// Environment name stamped on every tag and header
    #[validate(length(min = 1, message = "Environment cannot be empty"))]
    pub environment: String,

    /// Secret resolution
    #[validate(nested)]
    pub secrets: SecretsConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin: AdminConfig::default(),
            environment: "default".to_string(),
            secrets: SecretsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if !self.admin.url.starts_with("http://") && !self.admin.url.starts_with("https://") {
            return Err(Error::validation_field(
                "Admin URL must start with 'http://' or 'https://'",
                "admin.url",
            ));
        }

        Ok(())
    }
}

/// Gateway admin API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AdminConfig {
    /// Base URL of the admin API
    #[validate(url(message = "Admin URL must be a valid URL"))]
    pub url: String,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Log request and response bodies
    pub verbose: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { url: "http://localhost:8001".to_string(), timeout_seconds: 30, verbose: false }
    }
}

impl AdminConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn client_config(&self) -> AdminClientConfig {
        AdminClientConfig {
            base_url: self.url.clone(),
            timeout: self.timeout_seconds,
            verbose: self.verbose,
        }
    }
}

/// Where `$<key>` references are looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretsBackend {
    /// `ROUTEPLANE_SECRET_<KEY>` environment variables
    #[default]
    Env,
    /// Process-local map, seeded by the caller
    Memory,
}

impl fmt::Display for SecretsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsBackend::Env => write!(f, "env"),
            SecretsBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SecretsConfig {
    pub backend: SecretsBackend,

    /// Cache lifetime of resolved secrets; 0 disables caching
    #[validate(range(max = 86400, message = "Cache TTL cannot exceed one day"))]
    pub cache_ttl_seconds: u64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self { backend: SecretsBackend::Env, cache_ttl_seconds: 300 }
    }
}

impl SecretsConfig {
    /// None when caching is disabled
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_seconds > 0).then(|| Duration::from_secs(self.cache_ttl_seconds))
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g. "info", "routeplane=debug")
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Service name for logs
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logs: false, service_name: "routeplane".to_string() }
    }
}
