//! Circuit breaking through the gateway engine's native health-checked
//! upstream objects.
//!
//! Two states, told apart by the upstream id recorded on the route status:
//! unconfigured (no id) and configured. Enabling upserts an upstream named
//! after the route plus one target at the sidecar and points the service at
//! it. Disabling with an id still recorded deletes the upstream, clears both
//! ids and reverts to the plain sidecar address.

use async_trait::async_trait;
use tracing::info;

use crate::admin::{Healthchecks, TargetRequest, UpstreamRequest, ROUND_ROBIN};
use crate::domain::{FeatureType, ServiceUpstream, CIRCUIT_BREAKER_PORT};
use crate::errors::Result;
use crate::features::{BuildContext, Feature};
use crate::plugins::build_tag;

const TARGET_WEIGHT: u32 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitBreakerFeature;

impl CircuitBreakerFeature {
    pub const PRIORITY: i32 = 110;
}

#[async_trait]
impl Feature for CircuitBreakerFeature {
    fn name(&self) -> FeatureType {
        FeatureType::CircuitBreaker
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.as_ref().is_some_and(|route| {
            route.circuit_breaker_enabled() || ctx.state.route_status.upstream_id.is_some()
        })
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let environment = ctx.inputs.environment();

        if !route.circuit_breaker_enabled() {
            if let Some(upstream_id) = ctx.state.route_status.upstream_id.clone() {
                ctx.admin.delete_upstream(&upstream_id).await?;
                ctx.state.route_status.upstream_id = None;
                ctx.state.route_status.target_id = None;
                ctx.state.upstream = Some(ServiceUpstream::localhost_proxy());
                info!(route = %route.name, upstream_id = %upstream_id, "Circuit breaker removed");
            }
            return Ok(());
        }

        let upstream_request = UpstreamRequest {
            name: route.name.clone(),
            algorithm: ROUND_ROBIN.to_string(),
            healthchecks: Healthchecks::from(&ctx.inputs.gateway.circuit_breaker_policy()),
            tags: vec![
                build_tag("env", environment),
                build_tag("upstream", &route.name),
                build_tag("route", &route.name),
            ],
        };
        let upstream_id = ctx.admin.upsert_upstream(&upstream_request).await?;

        let target_request = TargetRequest {
            target: format!("localhost:{}", CIRCUIT_BREAKER_PORT),
            weight: TARGET_WEIGHT,
            tags: vec![
                build_tag("env", environment),
                build_tag("targets", &route.name),
                build_tag("route", &route.name),
            ],
        };
        let target_id = ctx.admin.create_target(&route.name, &target_request).await?;

        ctx.state.route_status.upstream_id = Some(upstream_id);
        ctx.state.route_status.target_id = Some(target_id);
        ctx.state.upstream = Some(ServiceUpstream::circuit_breaker(&route.name));
        Ok(())
    }
}
