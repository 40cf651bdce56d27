//! Subscriptions (ConsumeRoute) and gateway-engine consumers

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::route::{Limits, Route};
use super::security::ConsumerSecurity;
use crate::errors::{Error, Result};

/// Reference to a route by name and namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl RouteRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }

    pub fn points_to(&self, route: &Route) -> bool {
        self.name == route.name && self.namespace == route.namespace
    }
}

/// One subscriber's binding to a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeRoute {
    pub name: String,
    pub route: RouteRef,
    /// Client id of the subscriber
    pub consumer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<ConsumerSecurity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<ConsumerTraffic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerTraffic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<ConsumerRateLimit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerRateLimit {
    pub limits: Limits,
}

impl ConsumeRoute {
    pub fn new(consumer_name: impl Into<String>, route: RouteRef) -> Self {
        let consumer_name = consumer_name.into();
        Self {
            name: format!("{}--{}", route.name, consumer_name),
            route,
            consumer_name,
            ..Default::default()
        }
    }

    pub fn with_security(mut self, security: ConsumerSecurity) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.traffic = Some(ConsumerTraffic { rate_limit: Some(ConsumerRateLimit { limits }) });
        self
    }

    /// True when this subscription names `route` itself rather than a sibling in another zone
    pub fn is_bound_to(&self, route: &Route) -> bool {
        self.route.points_to(route)
    }

    /// Limits the subscriber declared on its own, if any
    pub fn own_limits(&self) -> Option<&Limits> {
        self.traffic
            .as_ref()
            .and_then(|t| t.rate_limit.as_ref())
            .map(|rl| &rl.limits)
            .filter(|limits| !limits.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.consumer_name.is_empty() {
            return Err(Error::validation_field(
                format!("ConsumeRoute '{}' has no consumer name", self.name),
                "consumerName",
            ));
        }
        if let Some(limits) = self.own_limits() {
            limits.validate()?;
        }
        Ok(())
    }
}

/// IP allow/deny lists of a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IpRestrictions {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

impl IpRestrictions {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// Ids assigned by the gateway engine on the last successful consumer build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugins: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_compiled: Option<DateTime<Utc>>,
}

/// The gateway-engine consumer of one client id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_restrictions: Option<IpRestrictions>,
    #[serde(default)]
    pub status: ConsumerStatus,
}

impl Consumer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_ip_restrictions(mut self, allow: Vec<String>, deny: Vec<String>) -> Self {
        self.ip_restrictions = Some(IpRestrictions { allow, deny });
        self
    }

    pub fn has_ip_restrictions(&self) -> bool {
        self.ip_restrictions.as_ref().is_some_and(|ip| !ip.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_field("Consumer name cannot be empty", "name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_requires_name_and_namespace() {
        let route = Route::new("orders-v1", "zone-a");
        assert!(RouteRef::new("orders-v1", "zone-a").points_to(&route));
        assert!(!RouteRef::new("orders-v1", "zone-b").points_to(&route));
        assert!(!RouteRef::new("orders-v2", "zone-a").points_to(&route));
    }

    #[test]
    fn test_own_limits_ignores_empty_block() {
        let consumer = ConsumeRoute::new("client-a", RouteRef::new("r", ""))
            .with_limits(Limits::default());
        assert!(consumer.own_limits().is_none());

        let consumer = consumer.with_limits(Limits::per_second(5));
        assert_eq!(consumer.own_limits(), Some(&Limits::per_second(5)));
    }

    #[test]
    fn test_ip_restrictions() {
        assert!(!Consumer::new("c").has_ip_restrictions());
        assert!(!Consumer::new("c").with_ip_restrictions(vec![], vec![]).has_ip_restrictions());
        assert!(Consumer::new("c")
            .with_ip_restrictions(vec!["10.0.0.0/8".to_string()], vec![])
            .has_ip_restrictions());
    }
}
