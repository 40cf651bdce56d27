//! Upstream and downstream endpoint types
//!
//! An [`Upstream`] is a backend (or another zone's gateway) a route forwards
//! to. A [`ServiceUpstream`] is what the compiler finally points the gateway
//! engine's service object at: the local sidecar, a circuit-breaker upstream,
//! or for pass-through routes the backend itself.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{Error, Result};

/// Address of the sidecar co-located with the gateway engine.
pub const LOCALHOST_PROXY_URL: &str = "http://localhost:8080/proxy";

/// Port the circuit-breaker upstream object listens on.
pub const CIRCUIT_BREAKER_PORT: u16 = 8080;

/// A backend declared on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Upstream {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub weight: u32,
    pub scheme: String,
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub path: String,
    /// Issuer of the remote zone's gateway. Non-empty marks a proxy upstream.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Upstream {
    /// Create an upstream from its parts
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Parse an upstream from a URL such as `https://api.example.com:8443/v1`
    pub fn from_url(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .map_err(|e| Error::validation(format!("Invalid upstream URL '{}': {}", raw, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::validation(format!("Upstream URL '{}' has no host", raw)))?;
        let port = url.port_or_known_default().unwrap_or_default();
        Ok(Self::new(url.scheme(), host, port, url.path()))
    }

    /// Set the load-balancing weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Mark the upstream as another zone's gateway
    pub fn with_issuer(
        mut self,
        issuer_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.issuer_url = issuer_url.into();
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// True when this upstream forwards to an already-secured gateway
    pub fn is_proxy(&self) -> bool {
        !self.issuer_url.is_empty()
    }

    fn authority(&self) -> String {
        if self.port == 0 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `scheme://host:port/path`
    pub fn url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.authority(), self.path)
    }

    /// URL handed to the sidecar; duplicate slashes after the authority are collapsed.
    pub fn remote_api_url(&self) -> String {
        let mut rest = format!("{}{}", self.authority(), self.path);
        while rest.contains("//") {
            rest = rest.replace("//", "/");
        }
        format!("{}://{}", self.scheme, rest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheme.is_empty() {
            return Err(Error::validation_field("Upstream scheme cannot be empty", "scheme"));
        }
        if self.host.is_empty() {
            return Err(Error::validation_field("Upstream host cannot be empty", "host"));
        }
        Ok(())
    }
}

/// Where a route is exposed on the gateway engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Downstream {
    pub host: String,
    #[serde(default)]
    pub port: u16,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer_url: String,
}

impl Downstream {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self { host: host.into(), path: path.into(), ..Default::default() }
    }
}

/// The target the gateway engine's service object is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpstream {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ServiceUpstream {
    /// The local sidecar
    pub fn localhost_proxy() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            path: "/proxy".to_string(),
        }
    }

    /// The gateway-engine upstream object created for a circuit-breaking route
    pub fn circuit_breaker(route_name: &str) -> Self {
        Self {
            scheme: "http".to_string(),
            host: route_name.to_string(),
            port: CIRCUIT_BREAKER_PORT,
            path: "/proxy".to_string(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

impl From<&Upstream> for ServiceUpstream {
    fn from(upstream: &Upstream) -> Self {
        let port = if upstream.port != 0 {
            upstream.port
        } else if upstream.scheme == "https" {
            443
        } else {
            80
        };
        Self {
            scheme: upstream.scheme.clone(),
            host: upstream.host.clone(),
            port,
            path: upstream.path.clone(),
        }
    }
}
