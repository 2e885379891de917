use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sylva_query::interface::GraphRegistry;
use sylva_query::schema::{NodeType, RelationshipType, Schema};
use sylva_query::server::router;
use tower::ServiceExt;

fn setup() -> axum::Router {
    let registry = Arc::new(GraphRegistry::new(64));
    let schema = Schema::new()
        .with_node_type(NodeType::new(1, "Person").plural("People").property("name"))
        .with_relationship_type(RelationshipType::new(1, "likes", 1, 1));
    registry.register("social", &schema).unwrap();
    router(registry)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn query_returns_the_plan() {
    let request = post_json(
        "/v1/graphs/social/query",
        json!({"query": "People that likes the Person"}),
    );
    let (status, body) = send(setup(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["plan"]["origins"].as_array().unwrap().len(), 3);
    assert_eq!(body["plan"]["patterns"][0]["relation"]["alias"], "r1_0");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn parse_errors_are_bad_requests() {
    let request = post_json("/v1/graphs/social/query", json!({"query": "Person xyz"}));
    let (status, body) = send(setup(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["column"], 8);
    assert!(body["expected"].as_array().is_some_and(|e| !e.is_empty()));
    assert!(body.get("plan").is_none());
}

#[tokio::test]
async fn long_queries_are_bad_requests() {
    let request = post_json(
        "/v1/graphs/social/query",
        json!({"query": "Person or ".repeat(10)}),
    );
    let (status, _) = send(setup(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_graph_is_not_found() {
    let request = post_json("/v1/graphs/other/query", json!({"query": "People"}));
    let (status, body) = send(setup(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("other"));
}

#[tokio::test]
async fn schema_upload_then_query() {
    let app = setup();
    let schema = json!({
        "node_types": [{"id": 5, "name": "City", "plural_name": "Cities", "properties": [{"key": "name"}]}]
    });
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/graphs/places/schema")
        .header("content-type", "application/json")
        .body(Body::from(schema.to_string()))
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_types"], 1);

    let request = post_json(
        "/v1/graphs/places/query",
        json!({"query": "Cities that start with Os"}),
    );
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["plan"]["conditions"][0],
        json!(["istartswith", ["property", "n5_0", "name"], "Os"])
    );
}

#[tokio::test]
async fn inconsistent_schema_upload_is_rejected() {
    let schema = json!({
        "relationship_types": [{"id": 1, "name": "likes", "source": 1, "target": 1}]
    });
    let request = Request::builder()
        .method("PUT")
        .uri("/v1/graphs/social/schema")
        .header("content-type", "application/json")
        .body(Body::from(schema.to_string()))
        .unwrap();
    let (status, body) = send(setup(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn grammar_dump() {
    let request = Request::builder()
        .uri("/v1/graphs/social/grammar")
        .body(Body::empty())
        .unwrap();
    let response = setup().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("r1_facet"));
}
