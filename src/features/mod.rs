//! # Features
//!
//! A feature is one optional capability of a compiled route or consumer:
//! rate limiting, OAuth injection, failover and so on. Each feature decides
//! whether it applies to the current [`BuildContext`] and, if so, writes its
//! share of the build state. The builder runs them in ascending priority
//! order; ties are broken by feature name.
//!
//! Priorities are declared relative to one another, e.g. external IDP runs
//! one step before custom scopes so that the scopes feature finds the OAuth
//! entries it must not overwrite.
//!
//! ## Module Organization
//!
//! - `context`: inputs and mutable state of one build
//! - `builder`: orchestration and admin API side effects
//! - `feature`: the concrete features

pub mod builder;
pub mod context;
pub mod feature;

use std::cmp::Ordering;

use async_trait::async_trait;

use crate::errors::Result;

pub use crate::domain::FeatureType;
pub use builder::{Builder, ConsumerOutcome, RouteOutcome};
pub use context::{BuildContext, BuildInputs, BuildState, PluginSet};

/// Priority shared by the plugin-producing features.
pub const DEFAULT_PRIORITY: i32 = 10;

/// One capability of the compiler.
#[async_trait]
pub trait Feature: Send + Sync {
    fn name(&self) -> FeatureType;

    /// Lower runs earlier.
    fn priority(&self) -> i32;

    /// Pure predicate over the context; must not mutate it.
    fn is_used(&self, ctx: &BuildContext) -> bool;

    /// Write this feature's share of the build. Safe to call repeatedly with the same inputs.
    async fn apply(&self, ctx: &mut BuildContext) -> Result<()>;
}

fn compare(a: &dyn Feature, b: &dyn Feature) -> Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| a.name().as_str().cmp(b.name().as_str()))
}

/// Sort features into execution order.
pub fn sort_features(features: &mut [Box<dyn Feature>]) {
    features.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}

/// Features considered for a route build, in execution order.
pub fn route_features() -> Vec<Box<dyn Feature>> {
    let mut features: Vec<Box<dyn Feature>> = vec![
        Box::new(feature::PassThroughFeature),
        Box::new(feature::LastMileSecurityFeature),
        Box::new(feature::HeaderTransformationFeature),
        Box::new(feature::CustomScopesFeature),
        Box::new(feature::ExternalIdpFeature),
        Box::new(feature::BasicAuthFeature),
        Box::new(feature::RateLimitFeature),
        Box::new(feature::AccessControlFeature),
        Box::new(feature::LoadBalancingFeature),
        Box::new(feature::FailoverFeature),
        Box::new(feature::CircuitBreakerFeature),
    ];
    sort_features(&mut features);
    features
}

/// Features considered for a consumer build, in execution order.
pub fn consumer_features() -> Vec<Box<dyn Feature>> {
    let mut features: Vec<Box<dyn Feature>> = vec![Box::new(feature::IpRestrictionFeature)];
    sort_features(&mut features);
    features
}
