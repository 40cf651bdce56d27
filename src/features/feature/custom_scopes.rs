use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::Result;
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};
use crate::handoff::{OauthCredentials, DEFAULT_PROVIDER_KEY};

/// Scopes requested on the upstream token, per provider and per consumer.
///
/// Only fills OAuth entries that are still absent; an entry written by the
/// external IDP feature already carries its scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomScopesFeature;

impl CustomScopesFeature {
    pub const PRIORITY: i32 = DEFAULT_PRIORITY;
}

#[async_trait]
impl Feature for CustomScopesFeature {
    fn name(&self) -> FeatureType {
        FeatureType::CustomScopes
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.as_ref().is_some_and(|route| {
            !route.spec.pass_through && (route.is_primary() || route.is_failover_secondary())
        })
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;

        let mut wanted: Vec<(&str, &[String])> = Vec::new();
        if let Some(security) = route.spec.security.as_ref() {
            wanted.push((DEFAULT_PROVIDER_KEY, security.m2m_scopes()));
        }
        for consumer in &ctx.inputs.allowed_consumers {
            if let Some(security) = consumer.security.as_ref() {
                wanted.push((consumer.consumer_name.as_str(), security.m2m_scopes()));
            }
        }

        for (key, scopes) in wanted {
            if scopes.is_empty() {
                continue;
            }
            let present = ctx.state.jumper_config().is_some_and(|j| j.oauth.contains_key(key));
            if present {
                continue;
            }
            ctx.state.jumper().oauth.insert(
                key.to_string(),
                OauthCredentials { scopes: scopes.join(" "), ..Default::default() },
            );
        }
        Ok(())
    }
}
