//! Realm and gateway: environment-scoped, read-only inputs of a build

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Capability tags. Also used as the gateway's list of supported features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    AccessControl,
    BasicAuth,
    CircuitBreaker,
    CustomScopes,
    ExternalIdp,
    Failover,
    HeaderTransformation,
    IpRestriction,
    LastMileSecurity,
    LoadBalancing,
    PassThrough,
    RateLimit,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::AccessControl => "access_control",
            FeatureType::BasicAuth => "basic_auth",
            FeatureType::CircuitBreaker => "circuit_breaker",
            FeatureType::CustomScopes => "custom_scopes",
            FeatureType::ExternalIdp => "external_idp",
            FeatureType::Failover => "failover",
            FeatureType::HeaderTransformation => "header_transformation",
            FeatureType::IpRestriction => "ip_restriction",
            FeatureType::LastMileSecurity => "last_mile_security",
            FeatureType::LoadBalancing => "load_balancing",
            FeatureType::PassThrough => "pass_through",
            FeatureType::RateLimit => "rate_limit",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment-scoped issuer and default consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Realm {
    pub name: String,
    pub environment: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub issuer_url: String,
    /// Consumers that may call every route of this realm
    #[serde(default)]
    pub default_consumers: Vec<String>,
}

impl Realm {
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self { name: name.into(), environment: environment.into(), ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_field("Realm name cannot be empty", "name"));
        }
        if self.environment.is_empty() {
            return Err(Error::validation_field(
                format!("Realm '{}' has no environment", self.name),
                "environment",
            ));
        }
        Ok(())
    }
}

/// Redis store backing the rate-limit policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisSettings {
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// Literal password or `$<key>` reference
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ssl: bool,
}

fn default_redis_port() -> u16 {
    6379
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self { host: "localhost".to_string(), port: 6379, password: String::new(), ssl: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassiveHealthcheck {
    pub healthy_http_statuses: Vec<u16>,
    pub healthy_successes: u32,
    pub unhealthy_http_failures: u32,
    pub unhealthy_http_statuses: Vec<u16>,
    pub unhealthy_tcp_failures: u32,
    pub unhealthy_timeouts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHealthcheck {
    pub healthy_http_statuses: Vec<u16>,
    pub unhealthy_http_statuses: Vec<u16>,
}

/// Health-check thresholds of circuit-breaker upstream objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerPolicy {
    pub passive: PassiveHealthcheck,
    pub active: ActiveHealthcheck,
}

impl Default for CircuitBreakerPolicy {
    fn default() -> Self {
        Self {
            passive: PassiveHealthcheck {
                healthy_http_statuses: vec![
                    200, 201, 202, 203, 204, 205, 206, 207, 208, 226, 300, 301, 302, 303, 304, 305,
                    306, 307, 308,
                ],
                healthy_successes: 30,
                unhealthy_http_failures: 10,
                unhealthy_http_statuses: vec![429, 500, 503],
                unhealthy_tcp_failures: 10,
                unhealthy_timeouts: 10,
            },
            active: ActiveHealthcheck {
                healthy_http_statuses: vec![302, 200],
                unhealthy_http_statuses: vec![429, 404, 500, 501, 502, 503, 504, 505],
            },
        }
    }
}

/// The gateway engine a realm is served by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub name: String,
    #[serde(default)]
    pub admin_url: String,
    #[serde(default)]
    pub redis: RedisSettings,
    /// Features this gateway supports; empty means all
    #[serde(default)]
    pub features: Vec<FeatureType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerPolicy>,
}

impl Gateway {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_redis(mut self, redis: RedisSettings) -> Self {
        self.redis = redis;
        self
    }

    pub fn with_features(mut self, features: Vec<FeatureType>) -> Self {
        self.features = features;
        self
    }

    pub fn supports_feature(&self, feature: FeatureType) -> bool {
        self.features.is_empty() || self.features.contains(&feature)
    }

    /// Gateway override or the built-in default
    pub fn circuit_breaker_policy(&self) -> CircuitBreakerPolicy {
        self.circuit_breaker.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_feature() {
        let gateway = Gateway::new("gw");
        assert!(gateway.supports_feature(FeatureType::CircuitBreaker));

        let gateway = gateway.with_features(vec![FeatureType::RateLimit]);
        assert!(gateway.supports_feature(FeatureType::RateLimit));
        assert!(!gateway.supports_feature(FeatureType::CircuitBreaker));
    }

    #[test]
    fn test_default_circuit_breaker_policy() {
        let policy = Gateway::new("gw").circuit_breaker_policy();
        assert_eq!(policy.passive.healthy_successes, 30);
        assert_eq!(policy.passive.unhealthy_http_statuses, vec![429, 500, 503]);
        assert_eq!(policy.active.healthy_http_statuses, vec![302, 200]);
        assert_eq!(policy.passive.healthy_http_statuses.len(), 19);
    }

    #[test]
    fn test_feature_type_serde() {
        let features: Vec<FeatureType> =
            serde_yaml::from_str("[rate_limit, external_idp, circuit_breaker]").unwrap();
        assert_eq!(
            features,
            vec![FeatureType::RateLimit, FeatureType::ExternalIdp, FeatureType::CircuitBreaker]
        );
        assert_eq!(FeatureType::LastMileSecurity.to_string(), "last_mile_security");
    }
}
