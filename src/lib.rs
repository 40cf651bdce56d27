//! # Routeplane
//!
//! Routeplane compiles declarative gateway resources (routes, consumers and
//! their subscriptions) into calls against a Kong-style gateway admin API and
//! into the base64 handoff header read by the request-time sidecar.
//!
//! ## Architecture
//!
//! ```text
//! Route / Consumer → BuildContext → Features (by priority) → Builder → Admin API
//!                         ↑                                      ↓
//!                  SecretResolver                       jumper_config / routing_config
//! ```
//!
//! Each [`features::Feature`] inspects the context, decides whether it applies
//! and contributes plugin configuration, an upstream or sidecar credentials.
//! The [`Builder`] then commits the accumulated state in one pass: service
//! and route upsert, plugin upserts and the removal of stale plugins.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use routeplane::admin::InMemoryGatewayAdmin;
//! use routeplane::domain::{Gateway, Realm, Route};
//! use routeplane::secrets::{EnvVarSecretsClient, SecretResolver};
//! use routeplane::{BuildContext, Builder, Result};
//!
//! async fn compile(route: Route) -> Result<()> {
//!     let mut ctx = BuildContext::for_route(
//!         route,
//!         Realm::new("default", "prod"),
//!         Gateway::new("gateway-a"),
//!         Vec::new(),
//!         Arc::new(InMemoryGatewayAdmin::new()),
//!         SecretResolver::new(Arc::new(EnvVarSecretsClient::new())),
//!     );
//!     let outcome = Builder::new().build(&mut ctx).await?;
//!     println!("{:?}", outcome.handoff_header);
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod features;
pub mod handoff;
pub mod observability;
pub mod plugins;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};
pub use features::{BuildContext, Builder, ConsumerOutcome, Feature, RouteOutcome};
pub use handoff::{Handoff, JumperConfig, RoutingConfig};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
