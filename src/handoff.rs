//! # Sidecar Handoff Format
//!
//! The only channel by which compiled policy reaches the request-time sidecar:
//! a [`JumperConfig`] (credentials and load balancing) or an ordered list of
//! [`RoutingConfig`] entries (normal path first, failover path after),
//! serialized to JSON, base64-encoded with the standard padded alphabet and
//! appended to upstream requests as one header by the request transformer.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::Upstream;
use crate::errors::{Error, Result};

/// Header carrying a single [`JumperConfig`].
pub const JUMPER_CONFIG_HEADER: &str = "jumper_config";

/// Header carrying a [`RoutingConfig`] list. Takes precedence over [`JUMPER_CONFIG_HEADER`].
pub const ROUTING_CONFIG_HEADER: &str = "routing_config";

/// Credential map key for the route's own (provider) credentials.
pub const DEFAULT_PROVIDER_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OauthCredentials {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Space separated
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scopes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_request: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancingServer {
    pub upstream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoadBalancing {
    pub servers: Vec<LoadBalancingServer>,
}

impl LoadBalancing {
    /// One server per upstream, weights carried over verbatim.
    pub fn from_upstreams(upstreams: &[Upstream]) -> Self {
        Self {
            servers: upstreams
                .iter()
                .map(|u| LoadBalancingServer {
                    upstream: u.url(),
                    weight: (u.weight > 0).then_some(u.weight),
                })
                .collect(),
        }
    }
}

/// Credentials and load balancing for the sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct JumperConfig {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub oauth: BTreeMap<String, OauthCredentials>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub basic_auth: BTreeMap<String, BasicAuthCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancing: Option<LoadBalancing>,
}

impl JumperConfig {
    pub fn is_empty(&self) -> bool {
        self.oauth.is_empty() && self.basic_auth.is_empty() && self.load_balancing.is_none()
    }
}

/// One path the sidecar may route a request over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingConfig {
    #[serde(flatten)]
    pub jumper: JumperConfig,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_api_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_base_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    /// Zone to health-check before trusting this path; only on the normal path
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_zone_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_endpoint: String,
}

/// The handoff attached to a compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    Jumper(JumperConfig),
    Routing(Vec<RoutingConfig>),
}

impl Handoff {
    pub fn header_name(&self) -> &'static str {
        match self {
            Handoff::Jumper(_) => JUMPER_CONFIG_HEADER,
            Handoff::Routing(_) => ROUTING_CONFIG_HEADER,
        }
    }

    /// Base64 header value
    pub fn encode(&self) -> Result<String> {
        match self {
            Handoff::Jumper(config) => encode(config),
            Handoff::Routing(configs) => encode(configs),
        }
    }

    /// Parse a `name:value` request-transformer entry back into a handoff.
    pub fn from_header(entry: &str) -> Result<Self> {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| Error::validation("handoff header must be 'name:value'"))?;
        match name {
            JUMPER_CONFIG_HEADER => Ok(Handoff::Jumper(decode(value)?)),
            ROUTING_CONFIG_HEADER => Ok(Handoff::Routing(decode(value)?)),
            other => Err(Error::validation(format!("'{}' is not a handoff header", other))),
        }
    }
}

/// JSON then standard base64.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(STANDARD.encode(serde_json::to_vec(value)?))
}

pub fn decode<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::validation(format!("handoff value is not base64: {}", e)))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jumper_config_wire_shape() {
        let mut config = JumperConfig::default();
        config.oauth.insert(
            DEFAULT_PROVIDER_KEY.to_string(),
            OauthCredentials {
                client_id: "provider".to_string(),
                scopes: "read write".to_string(),
                ..Default::default()
            },
        );
        config.basic_auth.insert(
            "client-a".to_string(),
            BasicAuthCredentials { username: "u".to_string(), password: "p".to_string() },
        );

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["oauth"]["default"]["clientId"], "provider");
        assert_eq!(json["oauth"]["default"]["scopes"], "read write");
        assert!(json["oauth"]["default"].get("clientSecret").is_none());
        assert_eq!(json["basicAuth"]["client-a"]["username"], "u");
        assert!(json.get("loadBalancing").is_none());
    }

    #[test]
    fn test_routing_config_inlines_jumper_fields() {
        let entry = RoutingConfig {
            jumper: JumperConfig {
                load_balancing: Some(LoadBalancing {
                    servers: vec![LoadBalancingServer {
                        upstream: "http://a:80/x".to_string(),
                        weight: Some(50),
                    }],
                }),
                ..Default::default()
            },
            realm: "default".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["loadBalancing"]["servers"][0]["weight"], 50);
        assert_eq!(json["realm"], "default");
        assert!(json.get("targetZoneName").is_none());
        assert!(json.get("jumper").is_none());
    }

    #[test]
    fn test_header_round_trip() {
        let handoff = Handoff::Routing(vec![RoutingConfig {
            remote_api_url: "http://backend:8080/api".to_string(),
            target_zone_name: "eu-west".to_string(),
            ..Default::default()
        }]);
        let entry = format!("{}:{}", handoff.header_name(), handoff.encode().unwrap());

        assert!(entry.starts_with("routing_config:"));
        assert_eq!(Handoff::from_header(&entry).unwrap(), handoff);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode::<JumperConfig>("%%%").is_err());
        assert!(Handoff::from_header("other_header:e30=").is_err());
    }

    #[test]
    fn test_load_balancing_from_upstreams() {
        let upstreams = vec![
            Upstream::new("http", "a", 80, "/x").with_weight(70),
            Upstream::new("http", "b", 80, "/x"),
        ];
        let lb = LoadBalancing::from_upstreams(&upstreams);
        assert_eq!(lb.servers[0].upstream, "http://a:80/x");
        assert_eq!(lb.servers[0].weight, Some(70));
        assert_eq!(lb.servers[1].weight, None);
    }
}
