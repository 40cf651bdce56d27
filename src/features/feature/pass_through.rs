use async_trait::async_trait;

use super::LastMileSecurityFeature;
use crate::domain::{FeatureType, ServiceUpstream};
use crate::errors::Result;
use crate::features::{BuildContext, Feature};

/// Routes straight to the first upstream, bypassing the sidecar.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughFeature;

impl PassThroughFeature {
    pub const PRIORITY: i32 = LastMileSecurityFeature::PRIORITY - 1;
}

#[async_trait]
impl Feature for PassThroughFeature {
    fn name(&self) -> FeatureType {
        FeatureType::PassThrough
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs
            .route
            .as_ref()
            .is_some_and(|route| route.spec.pass_through && !route.spec.upstreams.is_empty())
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let upstream = ctx.inputs.route()?.first_upstream()?;
        ctx.state.upstream = Some(ServiceUpstream::from(upstream));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::feature::testing::*;

    #[tokio::test]
    async fn test_upstream_is_first_route_upstream() {
        let route = primary_route().with_pass_through();
        let mut ctx = route_context(route, vec![]);

        assert!(PassThroughFeature.is_used(&ctx));
        PassThroughFeature.apply(&mut ctx).await.unwrap();

        let upstream = ctx.state.upstream.as_ref().unwrap();
        assert_eq!(upstream.url(), "https://orders.internal:8443/api/v1");
        assert!(ctx.state.handoff().is_none());
    }

    #[test]
    fn test_not_used_without_flag() {
        let ctx = route_context(primary_route(), vec![]);
        assert!(!PassThroughFeature.is_used(&ctx));
    }
}
