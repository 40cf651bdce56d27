//! Integration tests for configuration management
//!
//! These tests validate that settings are layered from defaults, an optional
//! YAML file and `ROUTEPLANE__` environment variables.

use std::env;
use std::io::Write;
use std::sync::Mutex;

use routeplane::config::{self, SecretsBackend};
use routeplane::{AppConfig, Result};
use tempfile::NamedTempFile;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 4] = [
    "ROUTEPLANE__ADMIN__URL",
    "ROUTEPLANE__ADMIN__TIMEOUT_SECONDS",
    "ROUTEPLANE__ENVIRONMENT",
    "ROUTEPLANE__SECRETS__BACKEND",
];

/// Clears the variables on creation and restores them on drop.
struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let saved = VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
        for name in VARS {
            env::remove_var(name);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }
}

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_defaults_integration() -> Result<()> {
    let _lock = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::new();

    let config = AppConfig::from_env()?;
    assert_eq!(config.admin.url, "http://localhost:8001");
    assert_eq!(config.admin.timeout_seconds, 30);
    assert_eq!(config.environment, "default");
    assert_eq!(config.secrets.backend, SecretsBackend::Env);
    Ok(())
}

#[test]
fn test_config_environment_integration() -> Result<()> {
    let _lock = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::new();

    env::set_var("ROUTEPLANE__ADMIN__URL", "http://gateway-admin:8001");
    env::set_var("ROUTEPLANE__ADMIN__TIMEOUT_SECONDS", "5");
    env::set_var("ROUTEPLANE__ENVIRONMENT", "prod");
    env::set_var("ROUTEPLANE__SECRETS__BACKEND", "memory");

    let config = AppConfig::from_env()?;
    assert_eq!(config.admin.url, "http://gateway-admin:8001");
    assert_eq!(config.admin.timeout_seconds, 5);
    assert_eq!(config.environment, "prod");
    assert_eq!(config.secrets.backend, SecretsBackend::Memory);

    env::set_var("ROUTEPLANE__ADMIN__TIMEOUT_SECONDS", "invalid");
    assert!(AppConfig::from_env().is_err());
    Ok(())
}

#[test]
fn test_yaml_file_with_environment_override() -> Result<()> {
    let _lock = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::new();

    let file = yaml_file(
        r#"
admin:
  url: https://admin.zone-a.internal:8444
  timeout_seconds: 10
environment: staging
secrets:
  backend: memory
  cache_ttl_seconds: 0
observability:
  json_logs: true
"#,
    );

    let config = config::load(Some(file.path()))?;
    assert_eq!(config.admin.url, "https://admin.zone-a.internal:8444");
    assert_eq!(config.environment, "staging");
    assert_eq!(config.secrets.cache_ttl(), None);
    assert!(config.observability.json_logs);
    assert_eq!(config.observability.log_level, "info");

    env::set_var("ROUTEPLANE__ENVIRONMENT", "prod");
    let config = config::load(Some(file.path()))?;
    assert_eq!(config.environment, "prod");
    assert_eq!(config.admin.timeout_seconds, 10);
    Ok(())
}

#[test]
fn test_invalid_file_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    let _env = EnvGuard::new();

    let file = yaml_file("admin:\n  url: ftp://admin.internal\n");
    assert!(config::load(Some(file.path())).is_err());

    let missing = std::path::Path::new("/nonexistent/routeplane.yaml");
    assert!(config::load(Some(missing)).is_err());
}
