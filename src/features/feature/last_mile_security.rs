//! Last-mile security: every non-pass-through route without failover goes
//! through the local sidecar, which needs to know where to forward and with
//! which identity.
//!
//! A proxy route hands the sidecar the remote zone's issuer and gateway
//! client so it can mint a token for the next hop. A primary route forwards
//! the consumer's own token and tells the sidecar the backend base path plus
//! the environment and realm it is serving.

use async_trait::async_trait;
use tracing::debug;

use super::headers;
use crate::domain::{FeatureType, ServiceUpstream};
use crate::errors::Result;
use crate::features::{BuildContext, Feature};

/// Header expression resolved by the gateway engine at request time.
const FORWARDED_TOKEN: &str = "$(headers['consumer-token'] or headers['Authorization'])";

#[derive(Debug, Clone, Copy, Default)]
pub struct LastMileSecurityFeature;

impl LastMileSecurityFeature {
    pub const PRIORITY: i32 = 100;
}

#[async_trait]
impl Feature for LastMileSecurityFeature {
    fn name(&self) -> FeatureType {
        FeatureType::LastMileSecurity
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs
            .route
            .as_ref()
            .is_some_and(|route| !route.spec.pass_through && route.failover().is_none())
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let upstream = route.first_upstream()?;
        let environment = ctx.inputs.realm.environment.clone();
        let realm = ctx.inputs.realm.name.clone();

        ctx.state.upstream = Some(ServiceUpstream::localhost_proxy());
        let transformer = ctx.state.plugins.request_transformer();

        if route.is_proxy() {
            debug!(route = %route.name, "Configuring proxy last-mile headers");
            transformer.append.set(headers::ISSUER, &upstream.issuer_url);
            transformer.append.set(headers::CLIENT_ID, &upstream.client_id);
            transformer.append.set(headers::CLIENT_SECRET, &upstream.client_secret);
            transformer.append.set(headers::REMOTE_API_URL, &upstream.remote_api_url());
            return Ok(());
        }

        debug!(route = %route.name, "Configuring primary last-mile headers");
        transformer.remove.add(headers::CONSUMER_TOKEN);
        transformer.replace.set(headers::AUTHORIZATION, FORWARDED_TOKEN);
        transformer.append.set(headers::REMOTE_API_URL, &upstream.remote_api_url());
        transformer.append.set(headers::API_BASE_PATH, &upstream.path);
        transformer.append.set(headers::ACCESS_TOKEN_FORWARDING, "false");
        for (name, value) in [(headers::ENVIRONMENT, &environment), (headers::REALM, &realm)] {
            transformer.add.set(name, value);
            transformer.replace.set(name, value);
        }
        Ok(())
    }
}
