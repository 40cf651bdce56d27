//! Zone failover through the sidecar.
//!
//! Produces the routing list: entry 0 is the normal path through the route's
//! own upstream and names the zone the sidecar health-checks; entry 1 is the
//! failover path and carries the credentials gathered by earlier features.
//! On a failover-secondary route the failover upstreams are the real backend,
//! so entry 1 targets them directly (balanced when there are several).

use async_trait::async_trait;
use tracing::debug;

use super::{headers, CircuitBreakerFeature};
use crate::domain::{FeatureType, ServiceUpstream};
use crate::errors::{Error, Result};
use crate::features::{BuildContext, Feature};
use crate::handoff::{LoadBalancing, RoutingConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct FailoverFeature;

impl FailoverFeature {
    pub const PRIORITY: i32 = CircuitBreakerFeature::PRIORITY - 1;
}

#[async_trait]
impl Feature for FailoverFeature {
    fn name(&self) -> FeatureType {
        FeatureType::Failover
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs
            .route
            .as_ref()
            .and_then(|route| route.failover())
            .is_some_and(|failover| !failover.upstreams.is_empty())
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let Some(failover) = route.failover().filter(|f| !f.upstreams.is_empty()) else {
            return Ok(());
        };
        let environment = ctx.inputs.realm.environment.clone();
        let upstream = route.first_upstream()?;

        ctx.state.upstream = Some(ServiceUpstream::localhost_proxy());

        let normal = RoutingConfig {
            remote_api_url: upstream.url(),
            api_base_path: upstream.path.clone(),
            realm: route.spec.realm.clone(),
            environment: environment.clone(),
            issuer: upstream.issuer_url.clone(),
            client_id: upstream.client_id.clone(),
            client_secret: upstream.client_secret.clone(),
            target_zone_name: failover.target_zone_name.clone(),
            ..Default::default()
        };

        let mut alternate = RoutingConfig {
            jumper: ctx.state.jumper().clone(),
            realm: route.spec.realm.clone(),
            environment,
            ..Default::default()
        };

        let balanced = failover.upstreams.len() > 1;
        if route.is_failover_secondary() {
            if balanced {
                alternate.jumper.load_balancing = Some(LoadBalancing::from_upstreams(&failover.upstreams));
            } else {
                let target = &failover.upstreams[0];
                alternate.remote_api_url = target.url();
                alternate.api_base_path = target.path.clone();
            }
            if let Some(provider) = route.failover_security().and_then(|s| s.external_idp_provider()) {
                alternate.token_endpoint = provider.token_endpoint.clone();
                if let Some(transformer) = ctx.state.plugins.request_transformer.as_mut() {
                    transformer.append.remove(headers::TOKEN_ENDPOINT);
                }
            }
        } else {
            if balanced {
                return Err(Error::validation(
                    "load balancing is not supported for proxy routes that are not failover secondary routes",
                ));
            }
            let target = &failover.upstreams[0];
            alternate.remote_api_url = target.url();
            alternate.api_base_path = target.path.clone();
            alternate.issuer = target.issuer_url.clone();
            alternate.client_id = target.client_id.clone();
            alternate.client_secret = target.client_secret.clone();
        }

        debug!(
            route = %route.name,
            target_zone = %failover.target_zone_name,
            secondary = route.is_failover_secondary(),
            "Routing configs built"
        );
        ctx.state.routing = vec![normal, alternate];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExternalIdentityProvider, Failover, Route, Security, LOCALHOST_PROXY_URL};
    use crate::features::feature::testing::*;
    use crate::features::feature::ExternalIdpFeature;
    use crate::handoff::Handoff;

    fn proxy_route(failover_upstreams: Vec<crate::domain::Upstream>) -> Route {
        Route::new("orders-v1", "zone-a")
            .with_realm("default")
            .with_upstream(proxy_upstream("https://gateway.zone-b:443/orders-v1"))
            .with_failover(Failover {
                target_zone_name: "eu-west".to_string(),
                upstreams: failover_upstreams,
                security: None,
            })
    }

    #[tokio::test]
    async fn test_single_failover_upstream() {
        let route = proxy_route(vec![proxy_upstream("https://gateway.eu-west:443/orders-v1")]);
        let mut ctx = route_context(route, vec![]);
        assert!(FailoverFeature.is_used(&ctx));

        FailoverFeature.apply(&mut ctx).await.unwrap();
        assert_eq!(ctx.state.upstream.as_ref().unwrap().url(), LOCALHOST_PROXY_URL);

        let routing = &ctx.state.routing;
        assert_eq!(routing.len(), 2);
        assert_eq!(routing[0].target_zone_name, "eu-west");
        assert_eq!(routing[0].remote_api_url, "https://gateway.zone-b:443/orders-v1");
        assert!(routing[0].jumper.is_empty());
        assert_eq!(routing[1].target_zone_name, "");
        assert_eq!(routing[1].remote_api_url, "https://gateway.eu-west:443/orders-v1");
        assert_eq!(routing[1].client_id, "gateway");
        assert_eq!(routing[1].environment, "prod");
        assert!(matches!(ctx.state.handoff(), Some(Handoff::Routing(_))));
    }

    #[tokio::test]
    async fn test_two_failover_upstreams_balanced() {
        let route = proxy_route(vec![
            upstream("https://orders-1.eu-west:8443/api").with_weight(50),
            upstream("https://orders-2.eu-west:8443/api").with_weight(50),
        ]);
        let mut ctx = route_context(route, vec![]);

        FailoverFeature.apply(&mut ctx).await.unwrap();
        let entry = &ctx.state.routing[1];
        assert_eq!(entry.remote_api_url, "");
        let servers = &entry.jumper.load_balancing.as_ref().unwrap().servers;
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].upstream, "https://orders-1.eu-west:8443/api");
        assert_eq!(servers[0].weight, Some(50));
        assert_eq!(servers[1].upstream, "https://orders-2.eu-west:8443/api");
        assert_eq!(servers[1].weight, Some(50));
    }

    #[tokio::test]
    async fn test_balanced_failover_requires_secondary() {
        let route = proxy_route(vec![
            proxy_upstream("https://gateway.eu-west:443/a"),
            proxy_upstream("https://gateway.eu-north:443/a"),
        ]);
        let mut ctx = route_context(route, vec![]);
        let err = FailoverFeature.apply(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("load balancing is not supported"));
    }

    #[tokio::test]
    async fn test_failover_token_endpoint_moves_to_entry() {
        let mut route = proxy_route(vec![upstream("https://orders.eu-west:8443/api")]);
        if let Some(failover) = route.spec.traffic.failover.as_mut() {
            failover.security = Some(Security::external_idp(ExternalIdentityProvider {
                token_endpoint: "https://idp.eu-west/token".to_string(),
                ..Default::default()
            }));
        }
        let mut ctx = route_context(route, vec![]);

        ExternalIdpFeature.apply(&mut ctx).await.unwrap();
        FailoverFeature.apply(&mut ctx).await.unwrap();

        assert_eq!(ctx.state.routing[1].token_endpoint, "https://idp.eu-west/token");
        assert!(ctx.state.routing[1].jumper.oauth.contains_key("default"));
        let rt = ctx.state.plugins.request_transformer.as_ref().unwrap();
        assert!(!rt.append.contains("token_endpoint"));
    }
}
