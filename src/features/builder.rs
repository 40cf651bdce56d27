//! # Compiler
//!
//! Runs the applicable features over a [`BuildContext`] and commits the
//! result to the gateway engine: service and route (or consumer), every
//! populated plugin, then a cleanup pass deleting plugins this owner no
//! longer produces. The first failure aborts the build; nothing is retried
//! and nothing already written is rolled back. Re-running is always safe.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, Instrument};

use super::{consumer_features, route_features, BuildContext, Feature};
use crate::admin::{ConsumerRequest, RouteRequest};
use crate::compile_span;
use crate::domain::{ConsumerStatus, RouteStatus, ServiceUpstream};
use crate::errors::{Error, Result};
use crate::observability::MetricsRecorder;
use crate::plugins::{build_tag, Plugin, PluginConfig, PluginRequest, PluginScope};

pub const REQUEST_TRANSFORMER_KEY: &str = "request-transformer";
pub const ACL_KEY: &str = "acl";
pub const JWT_KEY: &str = "jwt";
pub const RATE_LIMIT_KEY: &str = "rate-limiting";
pub const IP_RESTRICTION_KEY: &str = "ip-restriction";

/// Status key of the route+consumer rate limit of `consumer`.
pub fn consumer_rate_limit_key(consumer: &str) -> String {
    format!("{}-consumer--{}", RATE_LIMIT_KEY, consumer)
}

/// Result of a route build.
#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    /// Status to persist on the route
    pub status: RouteStatus,
    pub upstream: ServiceUpstream,
    pub plugins: Vec<PluginRequest>,
    /// `name:value` entry attached for the sidecar, if any
    pub handoff_header: Option<String>,
    /// Stale plugins deleted by the cleanup pass
    pub removed: usize,
}

/// Result of a consumer build.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerOutcome {
    pub status: ConsumerStatus,
    pub plugins: Vec<PluginRequest>,
    pub removed: usize,
}

/// Turns build contexts into admin API calls.
pub struct Builder {
    route_features: Vec<Box<dyn Feature>>,
    consumer_features: Vec<Box<dyn Feature>>,
    metrics: MetricsRecorder,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            route_features: route_features(),
            consumer_features: consumer_features(),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    /// Compile the route in `ctx`.
    pub async fn build(&self, ctx: &mut BuildContext) -> Result<RouteOutcome> {
        let name = ctx.inputs.route()?.name.clone();
        let started = Instant::now();
        let span = compile_span!("route", name, environment = %ctx.environment());

        let result = self.build_route(ctx).instrument(span).await;
        self.metrics.record_build("route", result.is_ok(), started.elapsed().as_secs_f64());
        result
    }

    /// Compile the consumer in `ctx`.
    pub async fn build_for_consumer(&self, ctx: &mut BuildContext) -> Result<ConsumerOutcome> {
        let name = ctx.inputs.consumer()?.name.clone();
        let started = Instant::now();
        let span = compile_span!("consumer", name, environment = %ctx.environment());

        let result = self.build_consumer(ctx).instrument(span).await;
        self.metrics.record_build("consumer", result.is_ok(), started.elapsed().as_secs_f64());
        result
    }

    async fn run_features(&self, features: &[Box<dyn Feature>], ctx: &mut BuildContext) -> Result<()> {
        for feature in features {
            let name = feature.name();
            if !ctx.inputs.gateway.supports_feature(name) {
                debug!(feature = %name, "Feature not supported by gateway");
                continue;
            }
            if !feature.is_used(ctx) {
                debug!(feature = %name, "Feature is not used");
                continue;
            }
            debug!(feature = %name, priority = feature.priority(), "Applying feature");
            feature.apply(ctx).await?;
            self.metrics.record_feature_applied(name.as_str());
        }
        Ok(())
    }

    async fn build_route(&self, ctx: &mut BuildContext) -> Result<RouteOutcome> {
        self.run_features(&self.route_features, ctx).await?;

        let route = ctx.inputs.route()?;
        let environment = ctx.inputs.environment();
        let upstream = ctx.state.upstream.clone().ok_or_else(|| {
            Error::internal(format!("No feature selected an upstream for route '{}'", route.name))
        })?;

        let handoff_header = match ctx.state.handoff() {
            Some(handoff) => {
                let value = handoff.encode()?;
                ctx.state.plugins.request_transformer().append.set(handoff.header_name(), &value);
                Some(format!("{}:{}", handoff.header_name(), value))
            }
            None => None,
        };

        let request = RouteRequest::new(&route.name, upstream.clone(), &route.spec.downstreams)
            .with_tags(vec![build_tag("env", environment), build_tag("route", &route.name)]);
        let ids = ctx.admin.upsert_route(&request).await?;
        ctx.state.route_status.service_id = Some(ids.service_id);
        ctx.state.route_status.route_id = Some(ids.route_id);

        let requests = route_plugin_requests(ctx)?;
        let applied = self.upsert_plugins(ctx, &requests).await?;
        let keep: BTreeSet<String> = applied.values().cloned().collect();

        let scope = PluginScope::Route { route: route.name.clone() };
        let removed = ctx.admin.cleanup_plugins(environment, &scope, &keep).await?;
        self.metrics.record_plugins_removed(removed);

        let status = &mut ctx.state.route_status;
        status.plugins = applied;
        status.consumers = ctx.inputs.bound_consumers().map(|c| c.consumer_name.clone()).collect();
        status.last_compiled = Some(Utc::now());

        info!(
            route = %route.name,
            upstream = %upstream.url(),
            plugins = requests.len(),
            removed,
            "Route compiled"
        );

        Ok(RouteOutcome {
            status: ctx.state.route_status.clone(),
            upstream,
            plugins: requests,
            handoff_header,
            removed,
        })
    }

    async fn build_consumer(&self, ctx: &mut BuildContext) -> Result<ConsumerOutcome> {
        self.run_features(&self.consumer_features, ctx).await?;

        let consumer = ctx.inputs.consumer()?;
        let environment = ctx.inputs.environment();

        let request = ConsumerRequest::named(
            &consumer.name,
            vec![build_tag("env", environment), build_tag("consumer", &consumer.name)],
        );
        let consumer_id = ctx.admin.upsert_consumer(&request).await?;
        ctx.state.consumer_status.consumer_id = Some(consumer_id);

        let mut requests = Vec::new();
        if let Some(config) = &ctx.state.plugins.ip_restriction {
            let scope = PluginScope::Consumer { consumer: consumer.name.clone() };
            let id = ctx.state.consumer_status.plugins.get(IP_RESTRICTION_KEY).cloned();
            requests.push(plugin_request(IP_RESTRICTION_KEY, scope, config, environment, id)?);
        }
        let applied = self.upsert_plugins(ctx, &requests).await?;
        let keep: BTreeSet<String> = applied.values().cloned().collect();

        let scope = PluginScope::Consumer { consumer: consumer.name.clone() };
        let removed = ctx.admin.cleanup_plugins(environment, &scope, &keep).await?;
        self.metrics.record_plugins_removed(removed);

        let status = &mut ctx.state.consumer_status;
        status.plugins = applied;
        status.last_compiled = Some(Utc::now());

        info!(consumer = %consumer.name, plugins = requests.len(), removed, "Consumer compiled");

        Ok(ConsumerOutcome { status: ctx.state.consumer_status.clone(), plugins: requests, removed })
    }

    async fn upsert_plugins(
        &self,
        ctx: &BuildContext,
        requests: &[PluginRequest],
    ) -> Result<BTreeMap<String, String>> {
        let mut applied = BTreeMap::new();
        for request in requests {
            let id = ctx.admin.upsert_plugin(request).await?;
            debug!(plugin = %request.name, key = %request.key, plugin_id = %id, "Plugin applied");
            applied.insert(request.key.clone(), id);
        }
        Ok(applied)
    }
}

fn plugin_request<C: PluginConfig + Clone>(
    key: &str,
    scope: PluginScope,
    config: &C,
    environment: &str,
    id: Option<String>,
) -> Result<PluginRequest> {
    Plugin::new(key, scope, config.clone()).to_request(environment, id)
}

/// Requests for every route-owned plugin the features populated.
fn route_plugin_requests(ctx: &BuildContext) -> Result<Vec<PluginRequest>> {
    let route = ctx.inputs.route()?;
    let environment = ctx.inputs.environment();
    let plugins = &ctx.state.plugins;
    let known = &ctx.state.route_status.plugins;
    let route_scope = || PluginScope::Route { route: route.name.clone() };
    let id = |key: &str| known.get(key).cloned();

    let mut requests = Vec::new();
    if let Some(config) = plugins.request_transformer.as_ref().filter(|c| !c.is_empty()) {
        requests.push(plugin_request(
            REQUEST_TRANSFORMER_KEY,
            route_scope(),
            config,
            environment,
            id(REQUEST_TRANSFORMER_KEY),
        )?);
    }
    if let Some(config) = &plugins.acl {
        requests.push(plugin_request(ACL_KEY, route_scope(), config, environment, id(ACL_KEY))?);
    }
    if let Some(config) = &plugins.jwt {
        requests.push(plugin_request(JWT_KEY, route_scope(), config, environment, id(JWT_KEY))?);
    }
    if let Some(config) = &plugins.rate_limit {
        requests.push(plugin_request(
            RATE_LIMIT_KEY,
            route_scope(),
            config,
            environment,
            id(RATE_LIMIT_KEY),
        )?);
    }
    for (consumer, config) in &plugins.consumer_rate_limits {
        let key = consumer_rate_limit_key(consumer);
        let scope =
            PluginScope::RouteConsumer { route: route.name.clone(), consumer: consumer.clone() };
        let existing = id(&key);
        requests.push(plugin_request(&key, scope, config, environment, existing)?);
    }
    Ok(requests)
}
