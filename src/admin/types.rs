//! Request and response shapes of the gateway admin API.

use serde::{Deserialize, Serialize};

use crate::domain::{CircuitBreakerPolicy, Downstream, ServiceUpstream};
use crate::plugins::PluginScope;

/// Service plus route exposure of one compiled route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRequest {
    pub name: String,
    pub upstream: ServiceUpstream,
    pub hosts: Vec<String>,
    pub paths: Vec<String>,
    pub tags: Vec<String>,
}

impl RouteRequest {
    pub fn new(name: &str, upstream: ServiceUpstream, downstreams: &[Downstream]) -> Self {
        let mut hosts: Vec<String> = Vec::new();
        let mut paths: Vec<String> = Vec::new();
        for downstream in downstreams {
            if !downstream.host.is_empty() && !hosts.contains(&downstream.host) {
                hosts.push(downstream.host.clone());
            }
            if !downstream.path.is_empty() && !paths.contains(&downstream.path) {
                paths.push(downstream.path.clone());
            }
        }
        Self { name: name.to_string(), upstream, hosts, paths, tags: Vec::new() }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Ids assigned to the service and route objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteIds {
    pub service_id: String,
    pub route_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerRequest {
    pub username: String,
    pub custom_id: String,
    /// ACL group the consumer is a member of
    pub acl_group: String,
    pub tags: Vec<String>,
}

impl ConsumerRequest {
    /// A consumer whose ACL group is its own name.
    pub fn named(name: &str, tags: Vec<String>) -> Self {
        Self {
            username: name.to_string(),
            custom_id: name.to_string(),
            acl_group: name.to_string(),
            tags,
        }
    }
}

/// A plugin instance as listed by the admin API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthyThresholds {
    pub http_statuses: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnhealthyThresholds {
    pub http_statuses: Vec<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Healthcheck {
    pub healthy: HealthyThresholds,
    pub unhealthy: UnhealthyThresholds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Healthchecks {
    pub active: Healthcheck,
    pub passive: Healthcheck,
}

impl From<&CircuitBreakerPolicy> for Healthchecks {
    fn from(policy: &CircuitBreakerPolicy) -> Self {
        Self {
            active: Healthcheck {
                healthy: HealthyThresholds {
                    http_statuses: policy.active.healthy_http_statuses.clone(),
                    successes: None,
                },
                unhealthy: UnhealthyThresholds {
                    http_statuses: policy.active.unhealthy_http_statuses.clone(),
                    http_failures: None,
                    tcp_failures: None,
                    timeouts: None,
                },
            },
            passive: Healthcheck {
                healthy: HealthyThresholds {
                    http_statuses: policy.passive.healthy_http_statuses.clone(),
                    successes: Some(policy.passive.healthy_successes),
                },
                unhealthy: UnhealthyThresholds {
                    http_statuses: policy.passive.unhealthy_http_statuses.clone(),
                    http_failures: Some(policy.passive.unhealthy_http_failures),
                    tcp_failures: Some(policy.passive.unhealthy_tcp_failures),
                    timeouts: Some(policy.passive.unhealthy_timeouts),
                },
            },
        }
    }
}

/// Load-balancing algorithm of circuit-breaker upstream objects.
pub const ROUND_ROBIN: &str = "round-robin";

/// Upstream object with health checks, upserted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    pub name: String,
    pub algorithm: String,
    pub healthchecks: Healthchecks,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    /// `host:port`
    pub target: String,
    pub weight: u32,
    pub tags: Vec<String>,
}

/// Tags selecting the plugins a build owns for cleanup.
pub fn cleanup_tags(environment: &str, scope: &PluginScope) -> Vec<String> {
    use crate::plugins::{build_tag, NO_OWNER};

    let mut tags = vec![build_tag("env", environment)];
    match scope {
        PluginScope::Route { route } => tags.push(build_tag("route", route)),
        PluginScope::Consumer { consumer } => {
            tags.push(build_tag("route", NO_OWNER));
            tags.push(build_tag("consumer", consumer));
        }
        PluginScope::RouteConsumer { route, consumer } => {
            tags.push(build_tag("route", route));
            tags.push(build_tag("consumer", consumer));
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_request_deduplicates_downstreams() {
        let downstreams = vec![
            Downstream::new("api.zone-a", "/orders/v1"),
            Downstream::new("api.zone-a", "/orders/v1/"),
            Downstream::new("api.zone-b", "/orders/v1"),
        ];
        let request =
            RouteRequest::new("orders-v1", ServiceUpstream::localhost_proxy(), &downstreams);
        assert_eq!(request.hosts, vec!["api.zone-a", "api.zone-b"]);
        assert_eq!(request.paths, vec!["/orders/v1", "/orders/v1/"]);
    }

    #[test]
    fn test_healthchecks_from_policy() {
        let checks = Healthchecks::from(&CircuitBreakerPolicy::default());
        let json = serde_json::to_value(&checks).unwrap();
        assert_eq!(json["passive"]["healthy"]["successes"], 30);
        assert_eq!(json["passive"]["unhealthy"]["timeouts"], 10);
        assert!(json["active"]["healthy"].get("successes").is_none());
        assert_eq!(json["active"]["healthy"]["http_statuses"], serde_json::json!([302, 200]));
    }

    #[test]
    fn test_cleanup_tags() {
        let scope = PluginScope::Route { route: "orders".to_string() };
        assert_eq!(cleanup_tags("prod", &scope), vec!["env--prod", "route--orders"]);

        let scope = PluginScope::Consumer { consumer: "client-a".to_string() };
        assert_eq!(
            cleanup_tags("prod", &scope),
            vec!["env--prod", "route--none", "consumer--client-a"]
        );
    }
}
