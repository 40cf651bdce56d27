//! Concrete features.

mod access_control;
mod basic_auth;
mod circuit_breaker;
mod custom_scopes;
mod external_idp;
mod failover;
mod header_transformation;
mod ip_restriction;
mod last_mile_security;
mod load_balancing;
mod pass_through;
mod rate_limit;

pub use access_control::AccessControlFeature;
pub use basic_auth::BasicAuthFeature;
pub use circuit_breaker::CircuitBreakerFeature;
pub use custom_scopes::CustomScopesFeature;
pub use external_idp::ExternalIdpFeature;
pub use failover::FailoverFeature;
pub use header_transformation::HeaderTransformationFeature;
pub use ip_restriction::IpRestrictionFeature;
pub use last_mile_security::LastMileSecurityFeature;
pub use load_balancing::LoadBalancingFeature;
pub use pass_through::PassThroughFeature;
pub use rate_limit::RateLimitFeature;

/// Header names exchanged with the sidecar through the request transformer.
pub mod headers {
    pub const REMOTE_API_URL: &str = "remote_api_url";
    pub const API_BASE_PATH: &str = "api_base_path";
    pub const ISSUER: &str = "issuer";
    pub const CLIENT_ID: &str = "client_id";
    pub const CLIENT_SECRET: &str = "client_secret";
    pub const TOKEN_ENDPOINT: &str = "token_endpoint";
    pub const ACCESS_TOKEN_FORWARDING: &str = "access_token_forwarding";
    pub const CONSUMER_TOKEN: &str = "consumer-token";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const ENVIRONMENT: &str = "environment";
    pub const REALM: &str = "realm";
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::admin::InMemoryGatewayAdmin;
    use crate::domain::{ConsumeRoute, Consumer, Gateway, Realm, Route, Upstream};
    use crate::features::BuildContext;
    use crate::secrets::{InMemorySecretsClient, SecretResolver};

    pub fn realm() -> Realm {
        Realm::new("default", "prod")
    }

    pub fn upstream(url: &str) -> Upstream {
        Upstream::from_url(url).unwrap()
    }

    pub fn proxy_upstream(url: &str) -> Upstream {
        upstream(url).with_issuer("https://iris.zone-b/auth/realms/default", "gateway", "$<gateway-secret>")
    }

    pub fn primary_route() -> Route {
        Route::new("orders-v1", "zone-a")
            .with_realm("default")
            .with_upstream(upstream("https://orders.internal:8443/api/v1"))
    }

    pub fn secrets() -> InMemorySecretsClient {
        InMemorySecretsClient::new()
            .with_secret("provider-secret", "s3cr3t")
            .with_secret("consumer-secret", "c0nsum3r")
            .with_secret("basic-password", "hunter2")
            .with_secret("redis-password", "r3dis")
    }

    pub fn route_context(route: Route, consumers: Vec<ConsumeRoute>) -> BuildContext {
        route_context_with(route, consumers, Arc::new(InMemoryGatewayAdmin::new()))
    }

    pub fn route_context_with(
        route: Route,
        consumers: Vec<ConsumeRoute>,
        admin: Arc<InMemoryGatewayAdmin>,
    ) -> BuildContext {
        BuildContext::for_route(
            route,
            realm(),
            Gateway::new("gateway-a"),
            consumers,
            admin,
            SecretResolver::new(Arc::new(secrets())),
        )
    }

    pub fn consumer_context(consumer: Consumer) -> BuildContext {
        BuildContext::for_consumer(
            consumer,
            realm(),
            Gateway::new("gateway-a"),
            Arc::new(InMemoryGatewayAdmin::new()),
            SecretResolver::new(Arc::new(secrets())),
        )
    }
}
