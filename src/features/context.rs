//! Build context shared by the features of one compilation.
//!
//! The context is split into read-only [`BuildInputs`] and the mutable
//! [`BuildState`] features write to, so a feature can hold a borrow of the
//! route while it fills in plugin configs or the sidecar handoff.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::admin::GatewayAdmin;
use crate::domain::{
    ConsumeRoute, Consumer, ConsumerStatus, Gateway, Realm, Route, RouteStatus, ServiceUpstream,
};
use crate::errors::{Error, Result};
use crate::handoff::{Handoff, JumperConfig, RoutingConfig};
use crate::plugins::{
    AclConfig, IpRestrictionConfig, JwtConfig, RateLimitConfig, RedisConfig, RequestTransformerConfig,
};
use crate::secrets::SecretResolver;

/// Declarative inputs of one build. Never modified by features.
#[derive(Debug, Clone, Default)]
pub struct BuildInputs {
    pub route: Option<Route>,
    pub consumer: Option<Consumer>,
    /// Subscriptions allowed to call the route, including ones bound to sibling routes
    pub allowed_consumers: Vec<ConsumeRoute>,
    pub realm: Realm,
    pub gateway: Gateway,
}

impl BuildInputs {
    pub fn route(&self) -> Result<&Route> {
        self.route.as_ref().ok_or_else(Error::no_route)
    }

    pub fn consumer(&self) -> Result<&Consumer> {
        self.consumer.as_ref().ok_or_else(Error::no_consumer)
    }

    pub fn environment(&self) -> &str {
        &self.realm.environment
    }

    /// Subscriptions naming the route under compilation itself.
    pub fn bound_consumers(&self) -> impl Iterator<Item = &ConsumeRoute> {
        let route = self.route.as_ref();
        self.allowed_consumers
            .iter()
            .filter(move |consumer| route.is_some_and(|r| consumer.is_bound_to(r)))
    }

    /// Rate-limit plugin base config pointing at the gateway's Redis. The password is resolved.
    pub async fn redis_backed_rate_limit(
        &self,
        secrets: &SecretResolver,
    ) -> Result<RateLimitConfig> {
        let redis = &self.gateway.redis;
        let password = secrets
            .resolve_optional(&redis.password)
            .await
            .map_err(|e| Error::secret(&self.gateway.name, "redis", e))?;
        Ok(RateLimitConfig::redis_backed(RedisConfig {
            redis_host: redis.host.clone(),
            redis_port: Some(redis.port),
            redis_password: password,
            redis_ssl: redis.ssl,
            ..Default::default()
        }))
    }
}

/// Plugin configs populated by features. Only populated entries are upserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSet {
    pub request_transformer: Option<RequestTransformerConfig>,
    pub acl: Option<AclConfig>,
    pub jwt: Option<JwtConfig>,
    /// Provider limits for the whole route
    pub rate_limit: Option<RateLimitConfig>,
    /// Consumer name to its route+consumer rate limit
    pub consumer_rate_limits: BTreeMap<String, RateLimitConfig>,
    pub ip_restriction: Option<IpRestrictionConfig>,
}

impl PluginSet {
    pub fn request_transformer(&mut self) -> &mut RequestTransformerConfig {
        self.request_transformer.get_or_insert_with(RequestTransformerConfig::default)
    }
}

/// Everything features write.
#[derive(Debug, Clone, Default)]
pub struct BuildState {
    /// Where the gateway-engine service points; must be set by some feature
    pub upstream: Option<ServiceUpstream>,
    pub plugins: PluginSet,
    jumper: Option<JumperConfig>,
    pub routing: Vec<RoutingConfig>,
    /// Working copy of the route status; carries the circuit-breaker ids
    pub route_status: RouteStatus,
    pub consumer_status: ConsumerStatus,
}

impl BuildState {
    /// The jumper config, initialised on first use.
    pub fn jumper(&mut self) -> &mut JumperConfig {
        self.jumper.get_or_insert_with(JumperConfig::default)
    }

    /// The jumper config if some feature initialised it.
    pub fn jumper_config(&self) -> Option<&JumperConfig> {
        self.jumper.as_ref()
    }

    /// Routing list wins over the jumper config; neither when nothing was produced.
    pub fn handoff(&self) -> Option<Handoff> {
        if !self.routing.is_empty() {
            return Some(Handoff::Routing(self.routing.clone()));
        }
        self.jumper.clone().map(Handoff::Jumper)
    }
}

/// One compilation's inputs, state and collaborators.
pub struct BuildContext {
    pub inputs: BuildInputs,
    pub state: BuildState,
    pub admin: Arc<dyn GatewayAdmin>,
    pub secrets: SecretResolver,
}

impl BuildContext {
    pub fn new(inputs: BuildInputs, admin: Arc<dyn GatewayAdmin>, secrets: SecretResolver) -> Self {
        let mut state = BuildState::default();
        if let Some(route) = &inputs.route {
            state.route_status = route.status.clone();
        }
        if let Some(consumer) = &inputs.consumer {
            state.consumer_status = consumer.status.clone();
        }
        Self { inputs, state, admin, secrets }
    }

    /// Context for compiling `route`.
    pub fn for_route(
        route: Route,
        realm: Realm,
        gateway: Gateway,
        allowed_consumers: Vec<ConsumeRoute>,
        admin: Arc<dyn GatewayAdmin>,
        secrets: SecretResolver,
    ) -> Self {
        let inputs = BuildInputs {
            route: Some(route),
            consumer: None,
            allowed_consumers,
            realm,
            gateway,
        };
        Self::new(inputs, admin, secrets)
    }

    /// Context for compiling `consumer`.
    pub fn for_consumer(
        consumer: Consumer,
        realm: Realm,
        gateway: Gateway,
        admin: Arc<dyn GatewayAdmin>,
        secrets: SecretResolver,
    ) -> Self {
        let inputs = BuildInputs {
            route: None,
            consumer: Some(consumer),
            allowed_consumers: Vec::new(),
            realm,
            gateway,
        };
        Self::new(inputs, admin, secrets)
    }

    pub fn environment(&self) -> &str {
        self.inputs.environment()
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("inputs", &self.inputs)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteRef;

    #[test]
    fn test_bound_consumers_filters_siblings() {
        let route = Route::new("orders-v1", "zone-a");
        let inputs = BuildInputs {
            route: Some(route),
            allowed_consumers: vec![
                ConsumeRoute::new("a", RouteRef::new("orders-v1", "zone-a")),
                ConsumeRoute::new("b", RouteRef::new("orders-v1", "zone-b")),
            ],
            ..Default::default()
        };
        let names: Vec<&str> =
            inputs.bound_consumers().map(|c| c.consumer_name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_handoff_precedence() {
        let mut state = BuildState::default();
        assert!(state.handoff().is_none());

        state.jumper();
        assert!(matches!(state.handoff(), Some(Handoff::Jumper(_))));

        state.routing.push(RoutingConfig::default());
        assert!(matches!(state.handoff(), Some(Handoff::Routing(_))));
    }

    #[test]
    fn test_missing_route() {
        let inputs = BuildInputs::default();
        assert!(inputs.route().unwrap_err().is_missing_context());
        assert!(inputs.consumer().unwrap_err().is_missing_context());
    }
}
