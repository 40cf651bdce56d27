//! Domain layer
//!
//! Declarative inputs of the compiler: routes, subscriptions, consumers,
//! realms and gateways. These types carry validation and the derived route
//! taxonomy; they know nothing about the admin API or the sidecar.
//!
//! ## Module Organization
//!
//! - `upstream`: backend endpoints and URL composition
//! - `security`: provider and subscriber credentials
//! - `route`: routes, traffic policies and compiler-owned status
//! - `consumer`: subscriptions and gateway-engine consumers
//! - `gateway`: realms, gateways and feature tags

pub mod consumer;
pub mod gateway;
pub mod route;
pub mod security;
pub mod upstream;

pub use consumer::{
    ConsumeRoute, Consumer, ConsumerRateLimit, ConsumerStatus, ConsumerTraffic, IpRestrictions,
    RouteRef,
};
pub use gateway::{
    ActiveHealthcheck, CircuitBreakerPolicy, FeatureType, Gateway, PassiveHealthcheck, Realm,
    RedisSettings,
};
pub use route::{
    CircuitBreakerToggle, ConsumerLimitOverride, Failover, HeaderTransformation, Limits,
    RateLimit, RateLimitOptions, Route, RouteSpec, RouteStatus, Traffic, Transformation,
};
pub use security::{
    BasicAuthCredentials, ConsumerSecurity, ExternalIdentityProvider,
    Machine2MachineAuthentication, OAuth2ClientCredentials, Security,
    SubscriberMachine2MachineAuthentication,
};
pub use upstream::{Downstream, ServiceUpstream, Upstream, CIRCUIT_BREAKER_PORT, LOCALHOST_PROXY_URL};
