use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::Result;
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};
use crate::plugins::{AclConfig, JwtConfig};

/// Restricts a route to its subscribers and the realm's default consumers,
/// and to tokens minted by the issuers its downstreams declare.
///
/// Applies to pass-through routes as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControlFeature;

#[async_trait]
impl Feature for AccessControlFeature {
    fn name(&self) -> FeatureType {
        FeatureType::AccessControl
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.is_some()
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let groups: Vec<String> = ctx
            .inputs
            .bound_consumers()
            .map(|c| c.consumer_name.clone())
            .chain(ctx.inputs.realm.default_consumers.iter().cloned())
            .collect();

        let issuers: Vec<&str> = route
            .spec
            .downstreams
            .iter()
            .map(|d| d.issuer_url.as_str())
            .filter(|issuer| !issuer.is_empty())
            .collect();

        ctx.state.plugins.acl = (!groups.is_empty()).then(|| AclConfig::allow(groups));
        ctx.state.plugins.jwt = (!issuers.is_empty()).then(|| JwtConfig::allowed_issuers(issuers));
        Ok(())
    }
}
