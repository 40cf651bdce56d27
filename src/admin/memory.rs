//! In-memory [`GatewayAdmin`] that records every call.
//!
//! Used by `routeplane compile --dry-run` and throughout the tests. Objects are
//! keyed the way the real admin API keys them (by name, by id, targets by
//! target string) so repeated builds behave like they would against a gateway.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{
    ConsumerRequest, PluginRecord, RouteIds, RouteRequest, TargetRequest, UpstreamRequest,
};
use super::GatewayAdmin;
use crate::errors::{Error, Result};
use crate::plugins::PluginRequest;

/// One recorded admin call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCall {
    UpsertRoute(RouteRequest),
    DeleteRoute(String),
    UpsertConsumer(ConsumerRequest),
    DeleteConsumer(String),
    UpsertPlugin(PluginRequest),
    ListPlugins(Vec<String>),
    DeletePlugin(String),
    UpsertUpstream(UpstreamRequest),
    CreateTarget { upstream: String, request: TargetRequest },
    DeleteUpstream(String),
}

/// A plugin held by the in-memory gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlugin {
    pub id: String,
    pub request: PluginRequest,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<AdminCall>,
    routes: BTreeMap<String, (RouteIds, RouteRequest)>,
    consumers: BTreeMap<String, (String, ConsumerRequest)>,
    plugins: BTreeMap<String, PluginRequest>,
    upstreams: BTreeMap<String, (String, UpstreamRequest)>,
    /// upstream name -> (target string -> target id)
    targets: BTreeMap<String, BTreeMap<String, String>>,
    fail_on: Option<(String, u16)>,
}

#[derive(Debug, Default)]
pub struct InMemoryGatewayAdmin {
    state: Mutex<State>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl InMemoryGatewayAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::internal("in-memory admin state poisoned"))
    }

    /// Answer every call of `operation` with `status`.
    pub fn fail_on(&self, operation: &str, status: u16) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_on = Some((operation.to_string(), status));
        }
    }

    /// Record a call, failing it if a failure was injected for its operation.
    fn record(&self, operation: &str, call: AdminCall) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock()?;
        state.calls.push(call);
        if let Some((failing, status)) = &state.fail_on {
            if failing == operation {
                return Err(Error::admin_api(operation, *status, "injected failure"));
            }
        }
        Ok(state)
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Forget the recorded calls, keeping the gateway objects.
    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.clear();
        }
    }

    /// Deletes of any kind recorded so far.
    pub fn deletions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    AdminCall::DeletePlugin(_)
                        | AdminCall::DeleteUpstream(_)
                        | AdminCall::DeleteRoute(_)
                        | AdminCall::DeleteConsumer(_)
                )
            })
            .count()
    }

    pub fn route(&self, name: &str) -> Option<RouteRequest> {
        self.state.lock().ok()?.routes.get(name).map(|(_, request)| request.clone())
    }

    pub fn consumer(&self, name: &str) -> Option<ConsumerRequest> {
        self.state.lock().ok()?.consumers.get(name).map(|(_, request)| request.clone())
    }

    pub fn plugins(&self) -> Vec<StoredPlugin> {
        self.state
            .lock()
            .map(|s| {
                s.plugins
                    .iter()
                    .map(|(id, request)| StoredPlugin { id: id.clone(), request: request.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The stored plugin recorded under `key`, if any.
    pub fn plugin(&self, key: &str) -> Option<StoredPlugin> {
        self.plugins().into_iter().find(|p| p.request.key == key)
    }

    pub fn upstreams(&self) -> Vec<UpstreamRequest> {
        self.state
            .lock()
            .map(|s| s.upstreams.values().map(|(_, request)| request.clone()).collect())
            .unwrap_or_default()
    }

    /// Target strings registered on an upstream.
    pub fn targets(&self, upstream: &str) -> Vec<String> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.targets.get(upstream).map(|t| t.keys().cloned().collect()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl GatewayAdmin for InMemoryGatewayAdmin {
    async fn upsert_route(&self, request: &RouteRequest) -> Result<RouteIds> {
        let mut state = self.record("upsert_route", AdminCall::UpsertRoute(request.clone()))?;
        let ids = match state.routes.get(&request.name) {
            Some((ids, _)) => ids.clone(),
            None => RouteIds { service_id: new_id(), route_id: new_id() },
        };
        state.routes.insert(request.name.clone(), (ids.clone(), request.clone()));
        Ok(ids)
    }

    async fn delete_route(&self, name: &str) -> Result<()> {
        let mut state = self.record("delete_route", AdminCall::DeleteRoute(name.to_string()))?;
        state.routes.remove(name);
        state.plugins.retain(|_, p| p.scope.route() != Some(name));
        Ok(())
    }

    async fn upsert_consumer(&self, request: &ConsumerRequest) -> Result<String> {
        let mut state =
            self.record("upsert_consumer", AdminCall::UpsertConsumer(request.clone()))?;
        let id = match state.consumers.get(&request.username) {
            Some((id, _)) => id.clone(),
            None => new_id(),
        };
        state.consumers.insert(request.username.clone(), (id.clone(), request.clone()));
        Ok(id)
    }

    async fn delete_consumer(&self, name: &str) -> Result<()> {
        let mut state =
            self.record("delete_consumer", AdminCall::DeleteConsumer(name.to_string()))?;
        state.consumers.remove(name);
        state.plugins.retain(|_, p| p.scope.consumer() != Some(name));
        Ok(())
    }

    async fn upsert_plugin(&self, request: &PluginRequest) -> Result<String> {
        let mut state = self.record("upsert_plugin", AdminCall::UpsertPlugin(request.clone()))?;
        let id = request
            .id
            .clone()
            .or_else(|| {
                state
                    .plugins
                    .iter()
                    .find(|(_, p)| p.name == request.name && p.tags == request.tags)
                    .map(|(id, _)| id.clone())
            })
            .unwrap_or_else(new_id);
        let mut stored = request.clone();
        stored.id = Some(id.clone());
        state.plugins.insert(id.clone(), stored);
        Ok(id)
    }

    async fn list_plugins(&self, tags: &[String]) -> Result<Vec<PluginRecord>> {
        let state = self.record("list_plugins", AdminCall::ListPlugins(tags.to_vec()))?;
        Ok(state
            .plugins
            .iter()
            .filter(|(_, p)| tags.iter().all(|tag| p.tags.contains(tag)))
            .map(|(id, p)| PluginRecord { id: id.clone(), name: p.name.clone(), tags: p.tags.clone() })
            .collect())
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        let mut state = self.record("delete_plugin", AdminCall::DeletePlugin(id.to_string()))?;
        state.plugins.remove(id);
        Ok(())
    }

    async fn upsert_upstream(&self, request: &UpstreamRequest) -> Result<String> {
        let mut state =
            self.record("upsert_upstream", AdminCall::UpsertUpstream(request.clone()))?;
        let id = match state.upstreams.get(&request.name) {
            Some((id, _)) => id.clone(),
            None => new_id(),
        };
        state.upstreams.insert(request.name.clone(), (id.clone(), request.clone()));
        Ok(id)
    }

    async fn create_target(&self, upstream: &str, request: &TargetRequest) -> Result<String> {
        let call = AdminCall::CreateTarget { upstream: upstream.to_string(), request: request.clone() };
        let mut state = self.record("create_target", call)?;
        if !state.upstreams.contains_key(upstream) {
            return Err(Error::admin_api("create_target", 404, format!("no upstream '{}'", upstream)));
        }
        let targets = state.targets.entry(upstream.to_string()).or_default();
        let id = targets.entry(request.target.clone()).or_insert_with(new_id).clone();
        Ok(id)
    }

    async fn delete_upstream(&self, id: &str) -> Result<()> {
        let mut state = self.record("delete_upstream", AdminCall::DeleteUpstream(id.to_string()))?;
        let name = state.upstreams.iter().find(|(_, (uid, _))| uid == id).map(|(n, _)| n.clone());
        if let Some(name) = name {
            state.upstreams.remove(&name);
            state.targets.remove(&name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceUpstream;
    use crate::plugins::{AclConfig, Plugin, PluginScope};
    use std::collections::BTreeSet;

    fn acl_plugin(route: &str) -> PluginRequest {
        Plugin::new("acl", PluginScope::Route { route: route.to_string() }, AclConfig::allow(["a"]))
            .to_request("prod", None)
            .unwrap()
    }

    #[tokio::test]
    async fn test_route_upsert_is_keyed_by_name() {
        let admin = InMemoryGatewayAdmin::new();
        let request = RouteRequest::new("orders", ServiceUpstream::localhost_proxy(), &[]);
        let first = admin.upsert_route(&request).await.unwrap();
        let second = admin.upsert_route(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(admin.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_plugin_upsert_reuses_tagged_plugin() {
        let admin = InMemoryGatewayAdmin::new();
        let first = admin.upsert_plugin(&acl_plugin("orders")).await.unwrap();
        let second = admin.upsert_plugin(&acl_plugin("orders")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(admin.plugins().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_only_touches_owned_plugins() {
        let admin = InMemoryGatewayAdmin::new();
        let keep = admin.upsert_plugin(&acl_plugin("orders")).await.unwrap();
        admin.upsert_plugin(&acl_plugin("payments")).await.unwrap();

        let removed = admin
            .cleanup_plugins(
                "prod",
                &PluginScope::Route { route: "orders".to_string() },
                &BTreeSet::from([keep.clone()]),
            )
            .await
            .unwrap();
        assert_eq!(removed, 0);

        let removed = admin
            .cleanup_plugins(
                "prod",
                &PluginScope::Route { route: "orders".to_string() },
                &BTreeSet::new(),
            )
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(admin.plugins().len(), 1);
    }

    #[tokio::test]
    async fn test_targets_are_deduplicated() {
        let admin = InMemoryGatewayAdmin::new();
        let upstream = UpstreamRequest {
            name: "orders".to_string(),
            algorithm: "round-robin".to_string(),
            healthchecks: (&crate::domain::CircuitBreakerPolicy::default()).into(),
            tags: vec![],
        };
        admin.upsert_upstream(&upstream).await.unwrap();
        let target =
            TargetRequest { target: "localhost:8080".to_string(), weight: 100, tags: vec![] };
        let a = admin.create_target("orders", &target).await.unwrap();
        let b = admin.create_target("orders", &target).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(admin.targets("orders"), vec!["localhost:8080"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let admin = InMemoryGatewayAdmin::new();
        admin.fail_on("upsert_plugin", 503);
        let error = admin.upsert_plugin(&acl_plugin("orders")).await.unwrap_err();
        assert!(error.is_retryable());
    }
}
