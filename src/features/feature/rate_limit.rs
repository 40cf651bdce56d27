//! Redis-backed rate limiting.
//!
//! The provider's limits become one route-wide plugin (never on proxy routes,
//! the remote zone enforces them there). Every directly bound consumer with
//! effective limits gets its own route+consumer plugin; provider limits ride
//! along on it as the shared service window.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::FeatureType;
use crate::errors::Result;
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitFeature;

#[async_trait]
impl Feature for RateLimitFeature {
    fn name(&self) -> FeatureType {
        FeatureType::RateLimit
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        let Some(route) = ctx.inputs.route.as_ref() else {
            return false;
        };
        !route.spec.pass_through
            && (route.provider_limits().is_some()
                || ctx
                    .inputs
                    .bound_consumers()
                    .any(|consumer| route.effective_consumer_limits(consumer).is_some()))
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let base = ctx.inputs.redis_backed_rate_limit(&ctx.secrets).await?;
        let options = route.rate_limit().map(|rl| &rl.options);
        let provider_limits = route.provider_limits();
        let proxy = route.is_proxy();

        ctx.state.plugins.rate_limit = None;
        ctx.state.plugins.consumer_rate_limits.clear();

        if let (false, Some(limits), Some(options)) = (proxy, provider_limits, options) {
            let mut config = base.clone();
            config.limits.service = Some(limits.clone());
            config.apply_options(options);
            ctx.state.plugins.rate_limit = Some(config);
        }

        for consumer in ctx.inputs.bound_consumers() {
            let Some(limits) = route.effective_consumer_limits(consumer) else {
                continue;
            };
            let mut config = base.clone();
            config.limits.consumer = Some(limits.clone());
            if let (Some(provider), Some(options)) = (provider_limits, options) {
                if !proxy {
                    config.limits.service = Some(provider.clone());
                }
                config.apply_options(options);
            }
            debug!(route = %route.name, consumer = %consumer.consumer_name, "Consumer rate limit configured");
            ctx.state
                .plugins
                .consumer_rate_limits
                .insert(consumer.consumer_name.clone(), config);
        }
        Ok(())
    }
}
