//! # Metrics Collection
//!
//! Compiler metrics recorded through the `metrics` facade. The library never
//! installs an exporter; whoever embeds the compiler chooses one.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics recorder that tracks compiler activity
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record a finished route or consumer build
    pub fn record_build(&self, kind: &str, success: bool, duration: f64) {
        let status = if success { "success" } else { "error" };
        let labels = [("kind", kind.to_string()), ("status", status.to_string())];
        counter!("compiler_builds_total", &labels).increment(1);

        let duration_labels = [("kind", kind.to_string())];
        histogram!("compiler_build_duration_seconds", &duration_labels).record(duration);
    }

    /// Record a feature that was applied during a build
    pub fn record_feature_applied(&self, feature: &str) {
        let labels = [("feature", feature.to_string())];
        counter!("compiler_features_applied_total", &labels).increment(1);
    }

    /// Record an admin API call; status 0 means no response was received
    pub fn record_admin_call(&self, operation: &str, status: u16, duration: f64) {
        let labels = [("operation", operation.to_string()), ("status", status.to_string())];
        counter!("admin_api_requests_total", &labels).increment(1);

        let duration_labels = [("operation", operation.to_string())];
        histogram!("admin_api_request_duration_seconds", &duration_labels).record(duration);
    }

    /// Record stale plugins removed by a build
    pub fn record_plugins_removed(&self, count: usize) {
        counter!("compiler_plugins_removed_total").increment(count as u64);
    }

    /// Describe every metric so exporters render help text before the first event.
    pub fn register(&self) {
        describe_counter!("compiler_builds_total", Unit::Count, "Builds grouped by kind and outcome");
        describe_histogram!(
            "compiler_build_duration_seconds",
            Unit::Seconds,
            "Duration of route and consumer builds"
        );
        describe_counter!(
            "compiler_features_applied_total",
            Unit::Count,
            "Features applied, grouped by feature"
        );
        describe_counter!(
            "admin_api_requests_total",
            Unit::Count,
            "Gateway admin API calls grouped by operation and status"
        );
        describe_histogram!(
            "admin_api_request_duration_seconds",
            Unit::Seconds,
            "Duration of gateway admin API calls"
        );
        describe_counter!(
            "compiler_plugins_removed_total",
            Unit::Count,
            "Stale plugins deleted during cleanup"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_a_noop() {
        let recorder = MetricsRecorder::new();
        recorder.register();
        recorder.record_build("route", true, 0.01);
        recorder.record_feature_applied("rate_limit");
        recorder.record_admin_call("upsert_route", 200, 0.002);
        recorder.record_plugins_removed(2);
    }
}
