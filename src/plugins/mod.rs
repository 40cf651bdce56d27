//! # Plugin Configuration Types
//!
//! Typed configuration shapes for the gateway-engine plugins the compiler
//! manages. Each config type names its plugin through [`PluginConfig::NAME`];
//! a [`Plugin`] binds a config to the route and/or consumer it applies to and
//! converts into the untyped [`PluginRequest`] the admin client sends.

pub mod acl;
pub mod ip_restriction;
pub mod jwt;
pub mod rate_limit;
pub mod request_transformer;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub use acl::AclConfig;
pub use ip_restriction::IpRestrictionConfig;
pub use jwt::JwtConfig;
pub use rate_limit::{LimitsConfig, RateLimitConfig, RedisConfig};
pub use request_transformer::{HeaderNames, HeaderValues, RequestTransformerConfig};

/// Separator between tag key and value, e.g. `env--prod`.
pub const TAG_SEPARATOR: &str = "--";

/// Placeholder for an absent route or consumer in tags.
pub const NO_OWNER: &str = "none";

/// Build a `key--value` tag.
pub fn build_tag(key: &str, value: &str) -> String {
    format!("{}{}{}", key, TAG_SEPARATOR, value)
}

/// A plugin configuration with a fixed gateway-engine plugin name.
pub trait PluginConfig: Serialize {
    const NAME: &'static str;

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// What a plugin instance is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginScope {
    Route { route: String },
    Consumer { consumer: String },
    RouteConsumer { route: String, consumer: String },
}

impl PluginScope {
    pub fn route(&self) -> Option<&str> {
        match self {
            PluginScope::Route { route } | PluginScope::RouteConsumer { route, .. } => Some(route),
            PluginScope::Consumer { .. } => None,
        }
    }

    pub fn consumer(&self) -> Option<&str> {
        match self {
            PluginScope::Consumer { consumer } | PluginScope::RouteConsumer { consumer, .. } => {
                Some(consumer)
            }
            PluginScope::Route { .. } => None,
        }
    }
}

/// A typed plugin instance produced by features.
#[derive(Debug, Clone, PartialEq)]
pub struct Plugin<C> {
    /// Stable key under which the plugin id is recorded in status
    pub key: String,
    pub scope: PluginScope,
    pub config: C,
}

impl<C: PluginConfig> Plugin<C> {
    pub fn new(key: impl Into<String>, scope: PluginScope, config: C) -> Self {
        Self { key: key.into(), scope, config }
    }

    /// Tags identifying the owner of this plugin on the gateway engine.
    pub fn tags(&self, environment: &str) -> Vec<String> {
        vec![
            build_tag("env", environment),
            build_tag("plugin", C::NAME),
            build_tag("route", self.scope.route().unwrap_or(NO_OWNER)),
            build_tag("consumer", self.scope.consumer().unwrap_or(NO_OWNER)),
        ]
    }

    /// Serialize into the untyped request the admin client sends.
    pub fn to_request(&self, environment: &str, id: Option<String>) -> Result<PluginRequest> {
        self.config.validate()?;
        Ok(PluginRequest {
            key: self.key.clone(),
            id,
            name: C::NAME.to_string(),
            scope: self.scope.clone(),
            config: serde_json::to_value(&self.config)?,
            tags: self.tags(environment),
        })
    }
}

/// An untyped plugin upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRequest {
    pub key: String,
    /// Id from a previous build, if known
    pub id: Option<String>,
    pub name: String,
    pub scope: PluginScope,
    pub config: serde_json::Value,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tag() {
        assert_eq!(build_tag("env", "prod"), "env--prod");
    }

    #[test]
    fn test_plugin_tags_and_request() {
        let plugin = Plugin::new(
            "acl",
            PluginScope::Route { route: "orders-v1".to_string() },
            AclConfig::allow(["client-a"]),
        );

        let request = plugin.to_request("prod", None).unwrap();
        assert_eq!(request.name, "acl");
        assert_eq!(
            request.tags,
            vec!["env--prod", "plugin--acl", "route--orders-v1", "consumer--none"]
        );
        assert_eq!(request.config["allow"][0], "client-a");
    }

    #[test]
    fn test_scope_accessors() {
        let scope =
            PluginScope::RouteConsumer { route: "r".to_string(), consumer: "c".to_string() };
        assert_eq!(scope.route(), Some("r"));
        assert_eq!(scope.consumer(), Some("c"));
        assert_eq!(PluginScope::Consumer { consumer: "c".to_string() }.route(), None);
    }
}
