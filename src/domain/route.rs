//! Route domain types
//!
//! A [`Route`] is the provider-side exposure of one API version. Its proxy,
//! primary and failover-secondary classification is always computed from the
//! upstream shape, never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::consumer::ConsumeRoute;
use super::security::Security;
use super::upstream::{Downstream, Upstream};
use crate::errors::{Error, Result};

/// Route resource: identity, declared spec and compiler-owned status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub spec: RouteSpec,
    #[serde(default)]
    pub status: RouteStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Name of the realm the route is exposed in
    pub realm: String,
    #[serde(default)]
    pub pass_through: bool,
    pub upstreams: Vec<Upstream>,
    pub downstreams: Vec<Downstream>,
    #[serde(default)]
    pub traffic: Traffic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Traffic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover: Option<Failover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerToggle>,
}

/// Alternate upstreams in another zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Failover {
    /// Zone the sidecar health-checks before trusting the normal path
    pub target_zone_name: String,
    pub upstreams: Vec<Upstream>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CircuitBreakerToggle {
    pub enabled: bool,
}

/// Request/second, minute and hour limits. Unset windows are unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
}

impl Limits {
    pub fn per_second(second: u32) -> Self {
        Self { second: Some(second), ..Default::default() }
    }

    pub fn new(second: Option<u32>, minute: Option<u32>, hour: Option<u32>) -> Self {
        Self { second, minute, hour }
    }

    pub fn is_empty(&self) -> bool {
        self.second.is_none() && self.minute.is_none() && self.hour.is_none()
    }

    /// Larger windows must allow at least as much as smaller ones.
    pub fn validate(&self) -> Result<()> {
        let windows = [("second", self.second), ("minute", self.minute), ("hour", self.hour)];
        let set: Vec<(&str, u32)> =
            windows.iter().filter_map(|(name, v)| v.map(|v| (*name, v))).collect();
        for pair in set.windows(2) {
            let ((small, small_value), (large, large_value)) = (pair[0], pair[1]);
            if large_value < small_value {
                return Err(Error::validation_field(
                    format!(
                        "Rate limit per {} ({}) is lower than per {} ({})",
                        large, large_value, small, small_value
                    ),
                    large,
                ));
            }
        }
        Ok(())
    }
}

/// Per-subscriber limit for one named client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerLimitOverride {
    pub consumer: String,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitOptions {
    #[serde(default)]
    pub hide_client_headers: bool,
    #[serde(default = "default_fault_tolerant")]
    pub fault_tolerant: bool,
}

fn default_fault_tolerant() -> bool {
    true
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self { hide_client_headers: false, fault_tolerant: true }
    }
}

/// Provider limits plus the per-subscriber default and named overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_default: Option<Limits>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumer_overrides: Vec<ConsumerLimitOverride>,
    #[serde(default)]
    pub options: RateLimitOptions,
}

/// Request header rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(default)]
    pub request: HeaderTransformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeaderTransformation {
    /// Header names to drop
    #[serde(default)]
    pub remove: Vec<String>,
    /// `name:value` pairs added when absent
    #[serde(default)]
    pub add: Vec<String>,
    /// `name:value` pairs overwriting present headers
    #[serde(default)]
    pub replace: Vec<String>,
}

impl HeaderTransformation {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty() && self.replace.is_empty()
    }
}

/// Ids the gateway engine assigned during previous builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    /// Circuit-breaker upstream object; written only by the circuit breaker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Plugin key to plugin id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, String>,
    /// Directly bound consumers at the last build
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_compiled: Option<DateTime<Utc>>,
}

impl Route {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into(), ..Default::default() }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.spec.realm = realm.into();
        self
    }

    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.spec.upstreams.push(upstream);
        self
    }

    pub fn with_downstream(mut self, downstream: Downstream) -> Self {
        self.spec.downstreams.push(downstream);
        self
    }

    pub fn with_security(mut self, security: Security) -> Self {
        self.spec.security = Some(security);
        self
    }

    pub fn with_failover(mut self, failover: Failover) -> Self {
        self.spec.traffic.failover = Some(failover);
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.spec.traffic.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_circuit_breaker(mut self, enabled: bool) -> Self {
        self.spec.traffic.circuit_breaker = Some(CircuitBreakerToggle { enabled });
        self
    }

    pub fn with_transformation(mut self, request: HeaderTransformation) -> Self {
        self.spec.transformation = Some(Transformation { request });
        self
    }

    pub fn with_pass_through(mut self) -> Self {
        self.spec.pass_through = true;
        self
    }

    /// True when some upstream carries an issuer URL
    pub fn is_proxy(&self) -> bool {
        self.spec.upstreams.iter().any(Upstream::is_proxy)
    }

    /// Terminates directly at a backend
    pub fn is_primary(&self) -> bool {
        !self.is_proxy()
    }

    pub fn failover(&self) -> Option<&Failover> {
        self.spec.traffic.failover.as_ref()
    }

    /// The failover block holds the real backend
    pub fn is_failover_secondary(&self) -> bool {
        self.failover().is_some_and(|f| f.upstreams.iter().any(|u| !u.is_proxy()))
    }

    pub fn failover_security(&self) -> Option<&Security> {
        self.failover().and_then(|f| f.security.as_ref())
    }

    /// Failover security when declared, otherwise the route's own
    pub fn active_security(&self) -> Option<&Security> {
        self.failover_security().or(self.spec.security.as_ref())
    }

    pub fn first_upstream(&self) -> Result<&Upstream> {
        self.spec
            .upstreams
            .first()
            .ok_or_else(|| Error::validation(format!("Route '{}' has no upstreams", self.name)))
    }

    pub fn circuit_breaker_enabled(&self) -> bool {
        self.spec.traffic.circuit_breaker.is_some_and(|cb| cb.enabled)
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.spec.traffic.rate_limit.as_ref()
    }

    /// Non-empty limits the provider sets for the whole route
    pub fn provider_limits(&self) -> Option<&Limits> {
        self.rate_limit().map(|rl| &rl.limits).filter(|limits| !limits.is_empty())
    }

    /// Limits that apply to one subscriber: its own, then the named override, then the default.
    pub fn effective_consumer_limits<'a>(&'a self, consumer: &'a ConsumeRoute) -> Option<&'a Limits> {
        if let Some(own) = consumer.own_limits() {
            return Some(own);
        }
        let rate_limit = self.rate_limit()?;
        rate_limit
            .consumer_overrides
            .iter()
            .find(|o| o.consumer == consumer.consumer_name)
            .map(|o| &o.limits)
            .or(rate_limit.consumer_default.as_ref())
            .filter(|limits| !limits.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_field("Route name cannot be empty", "name"));
        }
        if self.spec.upstreams.is_empty() {
            return Err(Error::validation_field(
                format!("Route '{}' must declare at least one upstream", self.name),
                "upstreams",
            ));
        }
        if self.spec.downstreams.is_empty() {
            return Err(Error::validation_field(
                format!("Route '{}' must declare at least one downstream", self.name),
                "downstreams",
            ));
        }
        for upstream in &self.spec.upstreams {
            upstream.validate()?;
        }
        if let Some(failover) = self.failover() {
            for upstream in &failover.upstreams {
                upstream.validate()?;
            }
        }
        if let Some(rate_limit) = self.rate_limit() {
            rate_limit.limits.validate()?;
            if let Some(default) = &rate_limit.consumer_default {
                default.validate()?;
            }
            for o in &rate_limit.consumer_overrides {
                o.limits.validate()?;
            }
        }
        Ok(())
    }
}
