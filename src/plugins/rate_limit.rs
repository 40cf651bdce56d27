//! Rate limiting plugin configuration
//!
//! One plugin instance carries both the subscriber's own window limits
//! (`limits.consumer`) and the provider's route-wide limits
//! (`limits.service`). Counters always live in the gateway's Redis.

use serde::{Deserialize, Serialize};

use super::PluginConfig;
use crate::domain::{Limits, RateLimitOptions};
use crate::errors::{Error, Result};

/// Policy name for the Redis-backed counter store.
pub const POLICY_REDIS: &str = "redis";

/// Identity the limits are keyed on when the plugin omits the consumer.
pub const OMIT_CONSUMER_GATEWAY: &str = "gateway";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RedisConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redis_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_timeout: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redis_username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redis_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_database: Option<u32>,
    pub redis_ssl: bool,
    pub redis_ssl_verify: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub redis_server_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LimitsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<Limits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Limits>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub policy: String,
    pub fault_tolerant: bool,
    pub hide_client_headers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub omit_consumer: String,
    #[serde(flatten)]
    pub redis: RedisConfig,
    pub limits: LimitsConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            policy: POLICY_REDIS.to_string(),
            fault_tolerant: true,
            hide_client_headers: false,
            error_code: None,
            error_message: None,
            omit_consumer: String::new(),
            redis: RedisConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl RateLimitConfig {
    /// Redis-backed config keyed on the whole gateway.
    pub fn redis_backed(redis: RedisConfig) -> Self {
        Self { omit_consumer: OMIT_CONSUMER_GATEWAY.to_string(), redis, ..Default::default() }
    }

    pub fn apply_options(&mut self, options: &RateLimitOptions) {
        self.fault_tolerant = options.fault_tolerant;
        self.hide_client_headers = options.hide_client_headers;
    }
}

impl PluginConfig for RateLimitConfig {
    const NAME: &'static str = "rate-limiting-merged";

    fn validate(&self) -> Result<()> {
        let consumer_empty = self.limits.consumer.as_ref().map_or(true, Limits::is_empty);
        let service_empty = self.limits.service.as_ref().map_or(true, Limits::is_empty);
        if consumer_empty && service_empty {
            return Err(Error::validation("rate limiting plugin without any limits"));
        }
        for limits in [&self.limits.consumer, &self.limits.service].into_iter().flatten() {
            limits.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape_is_flat() {
        let mut config = RateLimitConfig::redis_backed(RedisConfig {
            redis_host: "redis.internal".to_string(),
            redis_port: Some(6379),
            redis_password: "pw".to_string(),
            ..Default::default()
        });
        config.limits.service = Some(Limits::per_second(100));

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["policy"], "redis");
        assert_eq!(json["omit_consumer"], "gateway");
        assert_eq!(json["redis_host"], "redis.internal");
        assert_eq!(json["redis_port"], 6379);
        assert_eq!(json["limits"]["service"]["second"], 100);
        assert!(json["limits"].get("consumer").is_none());
        assert!(json.get("error_code").is_none());
    }

    #[test]
    fn test_validate_requires_limits() {
        let config = RateLimitConfig::default();
        assert!(config.validate().is_err());

        let mut config = RateLimitConfig::default();
        config.limits.consumer = Some(Limits::per_second(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_options() {
        let mut config = RateLimitConfig::default();
        config.apply_options(&RateLimitOptions { hide_client_headers: true, fault_tolerant: false });
        assert!(config.hide_client_headers);
        assert!(!config.fault_tolerant);
    }
}
