use async_trait::async_trait;

use crate::domain::{BasicAuthCredentials, FeatureType};
use crate::errors::{Error, Result};
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};
use crate::handoff::{self, DEFAULT_PROVIDER_KEY};
use crate::secrets::SecretResolver;

/// Basic credentials the sidecar presents upstream, provider and per consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthFeature;

async fn resolved(
    credentials: &BasicAuthCredentials,
    secrets: &SecretResolver,
) -> crate::secrets::Result<handoff::BasicAuthCredentials> {
    Ok(handoff::BasicAuthCredentials {
        username: credentials.username.clone(),
        password: secrets.resolve(&credentials.password).await?,
    })
}

#[async_trait]
impl Feature for BasicAuthFeature {
    fn name(&self) -> FeatureType {
        FeatureType::BasicAuth
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        let Some(route) = ctx.inputs.route.as_ref() else {
            return false;
        };
        if route.spec.pass_through {
            return false;
        }
        if route.failover_security().and_then(|s| s.basic_credentials()).is_some() {
            return true;
        }
        route.is_primary()
            && (route.spec.security.as_ref().and_then(|s| s.basic_credentials()).is_some()
                || ctx
                    .inputs
                    .allowed_consumers
                    .iter()
                    .any(|c| c.security.as_ref().and_then(|s| s.basic_credentials()).is_some()))
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;

        if let Some(basic) = route.active_security().and_then(|s| s.basic_credentials()) {
            let entry = resolved(basic, &ctx.secrets)
                .await
                .map_err(|e| Error::secret(&route.name, "provider", e))?;
            ctx.state.jumper().basic_auth.insert(DEFAULT_PROVIDER_KEY.to_string(), entry);
        }

        for consumer in &ctx.inputs.allowed_consumers {
            let Some(basic) = consumer.security.as_ref().and_then(|s| s.basic_credentials())
            else {
                continue;
            };
            let entry = resolved(basic, &ctx.secrets)
                .await
                .map_err(|e| Error::secret(&route.name, &consumer.consumer_name, e))?;
            ctx.state.jumper().basic_auth.insert(consumer.consumer_name.clone(), entry);
        }
        Ok(())
    }
}
