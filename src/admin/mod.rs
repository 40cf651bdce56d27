//! # Gateway Admin API
//!
//! The compiler's only write path to the gateway engine. Every operation is an
//! idempotent upsert keyed by name (or by a previously recorded id), so a build
//! can always be re-run from scratch.
//!
//! - [`HttpGatewayAdmin`]: `reqwest` client for a Kong-style admin API
//! - [`InMemoryGatewayAdmin`]: recording implementation for dry runs and tests

pub mod client;
pub mod memory;
pub mod types;

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::Result;
use crate::plugins::{PluginRequest, PluginScope};

pub use client::{AdminClientConfig, HttpGatewayAdmin};
pub use memory::{AdminCall, InMemoryGatewayAdmin};
pub use types::{
    cleanup_tags, ConsumerRequest, Healthchecks, PluginRecord, RouteIds, RouteRequest,
    TargetRequest, UpstreamRequest, ROUND_ROBIN,
};

#[async_trait]
pub trait GatewayAdmin: Send + Sync {
    /// Upsert the service and the route exposing it.
    async fn upsert_route(&self, request: &RouteRequest) -> Result<RouteIds>;

    /// Delete a route and its service. Missing objects are not an error.
    async fn delete_route(&self, name: &str) -> Result<()>;

    /// Upsert a consumer and its ACL group membership; returns the consumer id.
    async fn upsert_consumer(&self, request: &ConsumerRequest) -> Result<String>;

    async fn delete_consumer(&self, name: &str) -> Result<()>;

    /// Upsert a plugin; returns its id.
    async fn upsert_plugin(&self, request: &PluginRequest) -> Result<String>;

    /// Plugins carrying every one of `tags`.
    async fn list_plugins(&self, tags: &[String]) -> Result<Vec<PluginRecord>>;

    async fn delete_plugin(&self, id: &str) -> Result<()>;

    /// Upsert an upstream object by name; returns its id.
    async fn upsert_upstream(&self, request: &UpstreamRequest) -> Result<String>;

    /// Add a target to an upstream; returns the target id.
    async fn create_target(&self, upstream: &str, request: &TargetRequest) -> Result<String>;

    /// Delete an upstream object by id. Missing objects are not an error.
    async fn delete_upstream(&self, id: &str) -> Result<()>;

    /// Delete every plugin owned by `scope` whose id is not in `keep`.
    async fn cleanup_plugins(
        &self,
        environment: &str,
        scope: &PluginScope,
        keep: &BTreeSet<String>,
    ) -> Result<usize> {
        let tags = cleanup_tags(environment, scope);
        let mut removed = 0;
        for plugin in self.list_plugins(&tags).await? {
            if keep.contains(&plugin.id) {
                continue;
            }
            debug!(plugin_id = %plugin.id, plugin = %plugin.name, "Removing stale plugin");
            self.delete_plugin(&plugin.id).await?;
            removed += 1;
        }
        Ok(removed)
    }
}
