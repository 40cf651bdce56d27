//! OAuth credentials minted by an identity provider outside the platform.
//!
//! Runs one step before custom scopes: entries written here carry the real
//! client and must survive, so the scopes feature only fills keys that are
//! still absent.

use async_trait::async_trait;
use tracing::debug;

use super::{headers, CustomScopesFeature};
use crate::domain::{ExternalIdentityProvider, FeatureType, OAuth2ClientCredentials};
use crate::errors::{Error, Result};
use crate::features::{BuildContext, Feature};
use crate::handoff::{OauthCredentials, DEFAULT_PROVIDER_KEY};
use crate::secrets::SecretResolver;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalIdpFeature;

impl ExternalIdpFeature {
    pub const PRIORITY: i32 = CustomScopesFeature::PRIORITY - 1;
}

async fn extend(
    mut entry: OauthCredentials,
    provider: &ExternalIdentityProvider,
    client: Option<&OAuth2ClientCredentials>,
    secrets: &SecretResolver,
) -> crate::secrets::Result<OauthCredentials> {
    if let Some(client) = client {
        entry.client_id = client.client_id.clone();
        if !client.client_secret.is_empty() {
            entry.client_secret = secrets.resolve(&client.client_secret).await?;
        }
        if entry.scopes.is_empty() && !client.scopes.is_empty() {
            entry.scopes = client.scopes.join(" ");
        }
    }
    entry.token_request = provider.token_request.clone();
    entry.grant_type = provider.grant_type.clone();
    Ok(entry)
}

#[async_trait]
impl Feature for ExternalIdpFeature {
    fn name(&self) -> FeatureType {
        FeatureType::ExternalIdp
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.as_ref().is_some_and(|route| {
            !route.spec.pass_through
                && (route.is_primary() || route.is_failover_secondary())
                && route.active_security().and_then(|s| s.external_idp_provider()).is_some()
        })
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let route = ctx.inputs.route()?;
        let Some(provider) = route.active_security().and_then(|s| s.external_idp_provider())
        else {
            return Ok(());
        };

        ctx.state
            .plugins
            .request_transformer()
            .append
            .set(headers::TOKEN_ENDPOINT, &provider.token_endpoint);

        let existing = |key: &str, state: &crate::features::BuildState| {
            state.jumper_config().and_then(|j| j.oauth.get(key)).cloned().unwrap_or_default()
        };

        let default_entry = extend(
            existing(DEFAULT_PROVIDER_KEY, &ctx.state),
            provider,
            provider.client.as_ref(),
            &ctx.secrets,
        )
        .await
        .map_err(|e| Error::secret(&route.name, "provider", e))?;
        ctx.state.jumper().oauth.insert(DEFAULT_PROVIDER_KEY.to_string(), default_entry);

        for consumer in &ctx.inputs.allowed_consumers {
            let Some(client) = consumer.security.as_ref().and_then(|s| s.client_credentials())
            else {
                continue;
            };
            let entry = extend(
                existing(&consumer.consumer_name, &ctx.state),
                provider,
                Some(client),
                &ctx.secrets,
            )
            .await
            .map_err(|e| Error::secret(&route.name, &consumer.consumer_name, e))?;
            debug!(route = %route.name, consumer = %consumer.consumer_name, "External IDP client configured");
            ctx.state.jumper().oauth.insert(consumer.consumer_name.clone(), entry);
        }
        Ok(())
    }
}
