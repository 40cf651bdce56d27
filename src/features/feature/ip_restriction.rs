use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::Result;
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};
use crate::plugins::IpRestrictionConfig;

/// Consumer-scoped IP allow and deny lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpRestrictionFeature;

#[async_trait]
impl Feature for IpRestrictionFeature {
    fn name(&self) -> FeatureType {
        FeatureType::IpRestriction
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.consumer.as_ref().is_some_and(|c| c.has_ip_restrictions())
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let Some(restrictions) = ctx.inputs.consumer()?.ip_restrictions.as_ref() else {
            return Ok(());
        };
        let mut config = IpRestrictionConfig::default();
        config.extend_allow(restrictions.allow.iter().cloned());
        config.extend_deny(restrictions.deny.iter().cloned());
        ctx.state.plugins.ip_restriction = Some(config);
        Ok(())
    }
}
