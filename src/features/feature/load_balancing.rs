use async_trait::async_trait;

use super::{headers, LastMileSecurityFeature};
use crate::domain::{FeatureType, ServiceUpstream};
use crate::errors::Result;
use crate::features::{BuildContext, Feature};
use crate::handoff::LoadBalancing;

/// Weighted spread over several upstreams, done by the sidecar.
///
/// Runs after last-mile security and strips its `remote_api_url` header: a
/// balanced route has no single remote URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadBalancingFeature;

impl LoadBalancingFeature {
    pub const PRIORITY: i32 = LastMileSecurityFeature::PRIORITY + 2;
}

#[async_trait]
impl Feature for LoadBalancingFeature {
    fn name(&self) -> FeatureType {
        FeatureType::LoadBalancing
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.as_ref().is_some_and(|route| {
            !route.spec.pass_through
                && route.spec.upstreams.len() > 1
                && route.failover().is_none()
        })
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        ctx.state.upstream = Some(ServiceUpstream::localhost_proxy());
        ctx.state.jumper().load_balancing = Some(LoadBalancing::from_upstreams(&route.spec.upstreams));
        if let Some(transformer) = ctx.state.plugins.request_transformer.as_mut() {
            transformer.append.remove(headers::REMOTE_API_URL);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LOCALHOST_PROXY_URL;
    use crate::features::feature::testing::*;

    #[tokio::test]
    async fn test_server_list_and_no_remote_url() {
        let mut route = primary_route()
            .with_upstream(upstream("https://orders-2.internal:8443/api/v1").with_weight(30));
        route.spec.upstreams[0].weight = 70;
        let mut ctx = route_context(route, vec![]);
        assert!(LoadBalancingFeature.is_used(&ctx));

        LastMileSecurityFeature.apply(&mut ctx).await.unwrap();
        LoadBalancingFeature.apply(&mut ctx).await.unwrap();

        let servers = &ctx.state.jumper_config().unwrap().load_balancing.as_ref().unwrap().servers;
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].upstream, "https://orders.internal:8443/api/v1");
        assert_eq!(servers[0].weight, Some(70));
        assert_eq!(servers[1].weight, Some(30));

        assert_eq!(ctx.state.upstream.as_ref().unwrap().url(), LOCALHOST_PROXY_URL);
        let rt = ctx.state.plugins.request_transformer.as_ref().unwrap();
        assert!(!rt.append.contains("remote_api_url"));
        assert!(rt.append.contains("api_base_path"));
    }

    #[test]
    fn test_single_upstream_not_balanced() {
        assert!(!LoadBalancingFeature.is_used(&route_context(primary_route(), vec![])));
    }

    #[test]
    fn test_pass_through_not_balanced() {
        let route = primary_route()
            .with_upstream(upstream("https://orders-2.internal:8443/api/v1"))
            .with_pass_through();
        assert!(!LoadBalancingFeature.is_used(&route_context(route, vec![])));
    }
}
