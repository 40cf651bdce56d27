use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::Result;
use crate::features::{BuildContext, Feature, DEFAULT_PRIORITY};

/// Provider-declared request header rewrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderTransformationFeature;

#[async_trait]
impl Feature for HeaderTransformationFeature {
    fn name(&self) -> FeatureType {
        FeatureType::HeaderTransformation
    }

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn is_used(&self, ctx: &BuildContext) -> bool {
        ctx.inputs.route.as_ref().is_some_and(|route| {
            !route.spec.pass_through
                && route.is_primary()
                && route.spec.transformation.as_ref().is_some_and(|t| !t.request.is_empty())
        })
    }

    async fn apply(&self, ctx: &mut BuildContext) -> Result<()> {
        let Some(transformation) = ctx.inputs.route()?.spec.transformation.as_ref() else {
            return Ok(());
        };
        let request = &transformation.request;
        let transformer = ctx.state.plugins.request_transformer();

        for name in &request.remove {
            transformer.remove.add(name);
        }
        for (target, entries) in
            [(&mut transformer.add, &request.add), (&mut transformer.replace, &request.replace)]
        {
            for entry in entries {
                let (name, value) = entry.split_once(':').unwrap_or((entry.as_str(), ""));
                target.set(name.trim(), value.trim());
            }
        }
        Ok(())
    }
}
