//! # Configuration Management
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `ROUTEPLANE__`-prefixed environment variables with `__` as the nesting
//! separator (e.g. `ROUTEPLANE__ADMIN__URL`). The result is validated before
//! it is returned.

pub mod settings;

use std::path::Path;

use ::config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::errors::Result;

pub use settings::{AdminConfig, AppConfig, ObservabilityConfig, SecretsBackend, SecretsConfig};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "ROUTEPLANE";

/// Load configuration from an optional YAML file plus the environment.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = ConfigBuilder::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Configuration from the environment only
    pub fn from_env() -> Result<Self> {
        load(None)
    }
}
