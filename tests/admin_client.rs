//! Integration tests for the HTTP admin client against a mocked admin API

use std::collections::BTreeSet;

use routeplane::admin::{
    AdminClientConfig, ConsumerRequest, GatewayAdmin, Healthchecks, HttpGatewayAdmin,
    RouteRequest, TargetRequest, UpstreamRequest, ROUND_ROBIN,
};
use routeplane::domain::{CircuitBreakerPolicy, Downstream, ServiceUpstream};
use routeplane::plugins::{Plugin, PluginScope, RequestTransformerConfig};
use routeplane::Error;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpGatewayAdmin {
    HttpGatewayAdmin::new(AdminClientConfig {
        base_url: server.uri(),
        timeout: 5,
        verbose: true,
    })
    .expect("client")
}

fn ok_id(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": id }))
}

#[tokio::test]
async fn test_upsert_route_links_service() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/services/orders-v1"))
        .and(body_partial_json(json!({ "host": "localhost", "port": 8080, "path": "/proxy" })))
        .respond_with(ok_id("svc-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/routes/orders-v1"))
        .and(body_partial_json(json!({
            "hosts": ["api.zone-a.example.com"],
            "paths": ["/orders/v1"],
            "service": { "id": "svc-1" },
        })))
        .respond_with(ok_id("rt-1"))
        .expect(1)
        .mount(&server)
        .await;

    let request = RouteRequest::new(
        "orders-v1",
        ServiceUpstream::localhost_proxy(),
        &[Downstream::new("api.zone-a.example.com", "/orders/v1")],
    )
    .with_tags(vec!["env--prod".to_string(), "route--orders-v1".to_string()]);

    let ids = client(&server).upsert_route(&request).await.unwrap();
    assert_eq!(ids.service_id, "svc-1");
    assert_eq!(ids.route_id, "rt-1");
}

#[tokio::test]
async fn test_upsert_plugin_reuses_tagged_plugin() {
    let server = MockServer::start().await;
    let plugin = Plugin::new(
        "request-transformer",
        PluginScope::Route { route: "orders-v1".to_string() },
        RequestTransformerConfig::default(),
    );
    let request = plugin.to_request("prod", None).unwrap();

    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("tags", request.tags.join(",")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "plg-7", "name": "request-transformer", "tags": request.tags }],
            "next": null,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/plugins/plg-7"))
        .and(body_partial_json(json!({
            "name": "request-transformer",
            "route": { "name": "orders-v1" },
        })))
        .respond_with(ok_id("plg-7"))
        .expect(1)
        .mount(&server)
        .await;

    let id = client(&server).upsert_plugin(&request).await.unwrap();
    assert_eq!(id, "plg-7");
}

#[tokio::test]
async fn test_recorded_plugin_id_skips_lookup() {
    let server = MockServer::start().await;
    let plugin = Plugin::new(
        "request-transformer",
        PluginScope::Route { route: "orders-v1".to_string() },
        RequestTransformerConfig::default(),
    );
    let request = plugin.to_request("prod", Some("plg-1".to_string())).unwrap();

    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/plugins/plg-1"))
        .respond_with(ok_id("plg-1"))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).upsert_plugin(&request).await.unwrap(), "plg-1");
}

#[tokio::test]
async fn test_list_plugins_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("offset", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "b", "name": "acl" }],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("tags", "env--prod,route--orders-v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "a", "name": "rate-limiting" }],
            "next": "/plugins?offset=page-2",
        })))
        .mount(&server)
        .await;

    let tags = vec!["env--prod".to_string(), "route--orders-v1".to_string()];
    let plugins = client(&server).list_plugins(&tags).await.unwrap();
    let ids: Vec<&str> = plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_cleanup_deletes_unkept_plugins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "keep-me", "name": "request-transformer" },
                { "id": "stale", "name": "acl" },
            ],
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plugins/stale"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let keep: BTreeSet<String> = ["keep-me".to_string()].into_iter().collect();
    let scope = PluginScope::Route { route: "orders-v1".to_string() };
    let removed = client(&server).cleanup_plugins("prod", &scope, &keep).await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_delete_tolerates_missing_objects() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/routes/orders-v1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/services/orders-v1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_route("orders-v1").await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_retryable_admin_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/consumers/client-a"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = client(&server).delete_consumer("client-a").await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        Error::AdminApi { operation, status, body } => {
            assert_eq!(operation, "delete_consumer");
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upstreams/orders-v1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("schema violation"))
        .mount(&server)
        .await;

    let request = UpstreamRequest {
        name: "orders-v1".to_string(),
        algorithm: ROUND_ROBIN.to_string(),
        healthchecks: Healthchecks::from(&CircuitBreakerPolicy::default()),
        tags: vec![],
    };
    let err = client(&server).upsert_upstream(&request).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_existing_target_is_not_recreated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/upstreams/orders-v1/targets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "tgt-1", "target": "localhost:8080" }],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upstreams/orders-v1/targets"))
        .respond_with(ok_id("tgt-2"))
        .expect(0)
        .mount(&server)
        .await;

    let target = TargetRequest { target: "localhost:8080".to_string(), weight: 100, tags: vec![] };
    let id = client(&server).create_target("orders-v1", &target).await.unwrap();
    assert_eq!(id, "tgt-1");
}

#[tokio::test]
async fn test_upsert_consumer_adds_missing_acl_group() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/client-a"))
        .and(body_partial_json(json!({ "username": "client-a", "custom_id": "client-a" })))
        .respond_with(ok_id("con-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers/client-a/acls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/consumers/client-a/acls"))
        .and(body_partial_json(json!({ "group": "client-a" })))
        .respond_with(ok_id("acl-1"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ConsumerRequest::named("client-a", vec!["env--prod".to_string()]);
    assert_eq!(client(&server).upsert_consumer(&request).await.unwrap(), "con-1");
}
