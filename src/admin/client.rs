//! HTTP client for a Kong-style gateway admin API
//!
//! Every non-2xx answer becomes [`Error::AdminApi`] carrying the operation name,
//! the status and the response body; deletes additionally accept 404.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{debug, trace, Instrument};
use uuid::Uuid;

use super::types::{
    ConsumerRequest, PluginRecord, RouteIds, RouteRequest, TargetRequest, UpstreamRequest,
};
use super::GatewayAdmin;
use crate::admin_span;
use crate::errors::{Error, Result};
use crate::observability::MetricsRecorder;
use crate::plugins::PluginRequest;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct AdminClientConfig {
    /// Base URL of the admin API (e.g., "http://localhost:8001")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Log request and response bodies at trace level
    pub verbose: bool,
}

impl Default for AdminClientConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8001".to_string(), timeout: 30, verbose: false }
    }
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AclRecord {
    group: String,
}

#[derive(Debug, Deserialize)]
struct TargetRecord {
    id: String,
    target: String,
}

const PROTOCOLS: [&str; 2] = ["http", "https"];

/// `reqwest` implementation of [`GatewayAdmin`]
#[derive(Debug, Clone)]
pub struct HttpGatewayAdmin {
    client: Client,
    config: AdminClientConfig,
    metrics: MetricsRecorder,
}

impl HttpGatewayAdmin {
    pub fn new(config: AdminClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config, metrics: MetricsRecorder::new() })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("GET {}", url);
        self.client.get(url)
    }

    fn post(&self, path: &str, body: &Value) -> RequestBuilder {
        let url = self.url(path);
        debug!("POST {}", url);
        self.trace_body(body);
        self.client.post(url).json(body)
    }

    fn put(&self, path: &str, body: &Value) -> RequestBuilder {
        let url = self.url(path);
        debug!("PUT {}", url);
        self.trace_body(body);
        self.client.put(url).json(body)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("DELETE {}", url);
        self.client.delete(url)
    }

    fn trace_body(&self, body: &Value) {
        if self.config.verbose {
            let body_json = serde_json::to_string_pretty(body)
                .unwrap_or_else(|_| "<unable to serialize>".to_string());
            trace!("Request body:\n{}", body_json);
        }
    }

    /// Send a request, returning status and raw body.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, String)> {
        let started = Instant::now();
        let result = async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, Error>((status, body))
        }
        .instrument(admin_span!(operation))
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok((status, body)) => {
                debug!(operation, status = status.as_u16(), "Admin API response");
                if self.config.verbose {
                    trace!("Response body:\n{}", body);
                }
                self.metrics.record_admin_call(operation, status.as_u16(), elapsed);
            }
            Err(_) => self.metrics.record_admin_call(operation, 0, elapsed),
        }
        result
    }

    async fn expect_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let (status, body) = self.execute(operation, request).await?;
        if !status.is_success() {
            return Err(Error::admin_api(operation, status.as_u16(), body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn expect_deleted(&self, operation: &'static str, request: RequestBuilder) -> Result<()> {
        let (status, body) = self.execute(operation, request).await?;
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            other => Err(Error::admin_api(operation, other.as_u16(), body)),
        }
    }

    /// Follow `next` links until the listing is exhausted.
    async fn list_all<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        first: RequestBuilder,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page: Page<T> = self.expect_json(operation, first).await?;
        loop {
            items.extend(page.data);
            match page.next.filter(|next| !next.is_empty()) {
                Some(next) => page = self.expect_json(operation, self.get(&next)).await?,
                None => break,
            }
        }
        Ok(items)
    }

    async fn ensure_acl_group(&self, consumer: &str, group: &str) -> Result<()> {
        let path = format!("/consumers/{}/acls", consumer);
        let groups: Vec<AclRecord> = self.list_all("list_consumer_acls", self.get(&path)).await?;
        if groups.iter().any(|acl| acl.group == group) {
            return Ok(());
        }
        let _: IdResponse =
            self.expect_json("create_consumer_acl", self.post(&path, &json!({ "group": group }))).await?;
        Ok(())
    }

    /// Id recorded in status, else a plugin with identical owner tags, else a fresh one.
    async fn resolve_plugin_id(&self, request: &PluginRequest) -> Result<String> {
        if let Some(id) = &request.id {
            return Ok(id.clone());
        }
        let existing = self.list_plugins(&request.tags).await?;
        Ok(existing
            .into_iter()
            .find(|plugin| plugin.name == request.name)
            .map(|plugin| plugin.id)
            .unwrap_or_else(|| Uuid::new_v4().to_string()))
    }
}

#[async_trait]
impl GatewayAdmin for HttpGatewayAdmin {
    async fn upsert_route(&self, request: &RouteRequest) -> Result<RouteIds> {
        let upstream = &request.upstream;
        let service_body = json!({
            "name": request.name,
            "protocol": upstream.scheme,
            "host": upstream.host,
            "port": upstream.port,
            "path": upstream.path,
            "tags": request.tags,
        });
        let service: IdResponse = self
            .expect_json("upsert_service", self.put(&format!("/services/{}", request.name), &service_body))
            .await?;

        let route_body = json!({
            "name": request.name,
            "protocols": PROTOCOLS,
            "hosts": request.hosts,
            "paths": request.paths,
            "service": { "id": service.id },
            "request_buffering": true,
            "response_buffering": true,
            "https_redirect_status_code": 426,
            "tags": request.tags,
        });
        let route: IdResponse = self
            .expect_json("upsert_route", self.put(&format!("/routes/{}", request.name), &route_body))
            .await?;

        Ok(RouteIds { service_id: service.id, route_id: route.id })
    }

    async fn delete_route(&self, name: &str) -> Result<()> {
        self.expect_deleted("delete_route", self.delete(&format!("/routes/{}", name))).await?;
        self.expect_deleted("delete_service", self.delete(&format!("/services/{}", name))).await
    }

    async fn upsert_consumer(&self, request: &ConsumerRequest) -> Result<String> {
        let body = json!({
            "username": request.username,
            "custom_id": request.custom_id,
            "tags": request.tags,
        });
        let consumer: IdResponse = self
            .expect_json("upsert_consumer", self.put(&format!("/consumers/{}", request.username), &body))
            .await?;
        self.ensure_acl_group(&request.username, &request.acl_group).await?;
        Ok(consumer.id)
    }

    async fn delete_consumer(&self, name: &str) -> Result<()> {
        self.expect_deleted("delete_consumer", self.delete(&format!("/consumers/{}", name))).await
    }

    async fn upsert_plugin(&self, request: &PluginRequest) -> Result<String> {
        let id = self.resolve_plugin_id(request).await?;
        let mut body = json!({
            "name": request.name,
            "enabled": true,
            "config": request.config,
            "protocols": PROTOCOLS,
            "tags": request.tags,
        });
        if let Some(route) = request.scope.route() {
            body["route"] = json!({ "name": route });
        }
        if let Some(consumer) = request.scope.consumer() {
            body["consumer"] = json!({ "username": consumer });
        }
        let plugin: IdResponse =
            self.expect_json("upsert_plugin", self.put(&format!("/plugins/{}", id), &body)).await?;
        Ok(plugin.id)
    }

    async fn list_plugins(&self, tags: &[String]) -> Result<Vec<PluginRecord>> {
        let request = self.get("/plugins").query(&[("tags", tags.join(","))]);
        self.list_all("list_plugins", request).await
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        self.expect_deleted("delete_plugin", self.delete(&format!("/plugins/{}", id))).await
    }

    async fn upsert_upstream(&self, request: &UpstreamRequest) -> Result<String> {
        let body = serde_json::to_value(request)?;
        let upstream: IdResponse = self
            .expect_json("upsert_upstream", self.put(&format!("/upstreams/{}", request.name), &body))
            .await?;
        Ok(upstream.id)
    }

    async fn create_target(&self, upstream: &str, request: &TargetRequest) -> Result<String> {
        let path = format!("/upstreams/{}/targets", upstream);
        let targets: Vec<TargetRecord> = self.list_all("list_targets", self.get(&path)).await?;
        if let Some(existing) = targets.into_iter().find(|t| t.target == request.target) {
            debug!(upstream, target = %request.target, "Target already present");
            return Ok(existing.id);
        }
        let body = serde_json::to_value(request)?;
        let target: IdResponse = self.expect_json("create_target", self.post(&path, &body)).await?;
        Ok(target.id)
    }

    async fn delete_upstream(&self, id: &str) -> Result<()> {
        self.expect_deleted("delete_upstream", self.delete(&format!("/upstreams/{}", id))).await
    }
}
