//! # Structured Logging
//!
//! Subscriber setup and span macros. Credential values never appear in log
//! fields; features log names and keys only.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for one compilation.
///
/// ```rust,ignore
/// let span = compile_span!("route", route.name);
/// ```
#[macro_export]
macro_rules! compile_span {
    ($kind:expr, $name:expr) => {
        tracing::info_span!(
            "compile",
            kind = %$kind,
            name = %$name,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($kind:expr, $name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "compile",
            kind = %$kind,
            name = %$name,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for an admin API call
#[macro_export]
macro_rules! admin_span {
    ($operation:expr) => {
        tracing::debug_span!(
            "admin_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "admin_operation",
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json_logs {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .flatten_event(true)
            .with_filter(filter);
        tracing_subscriber::registry().with(layer).try_init()
    } else {
        let layer = fmt::layer().with_target(true).with_filter(filter);
        tracing_subscriber::registry().with(layer).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to initialise logging: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        admin_url = %config.admin.url,
        environment = %config.environment,
        secrets_backend = %config.secrets.backend,
        "routeplane configuration"
    );
}
