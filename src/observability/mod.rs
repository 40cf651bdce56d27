//! # Observability Infrastructure
//!
//! Structured logging through `tracing` and compiler metrics through the
//! `metrics` facade.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::MetricsRecorder;

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialise logging and describe the compiler metrics.
pub fn init_observability(config: &ObservabilityConfig) -> Result<MetricsRecorder> {
    init_logging(config)?;

    let recorder = MetricsRecorder::new();
    recorder.register();

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Observability initialized"
    );

    Ok(recorder)
}
