use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::QueryError;
use crate::interface::GraphRegistry;
use crate::plan::QueryPlan;
use crate::schema::Schema;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub status: String,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<QueryPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Vec<String>>,
}

impl QueryResponse {
    fn error(e: &QueryError, elapsed_ms: f64) -> Self {
        let (column, expected) = match e {
            QueryError::Parse {
                column, expected, ..
            } => (Some(*column), Some(expected.clone())),
            _ => (None, None),
        };
        Self {
            status: "error".into(),
            elapsed_ms,
            plan: None,
            error: Some(e.to_string()),
            column,
            expected,
        }
    }
}

/// User mistakes are 4xx, anything else means the service or its schemas are broken.
pub fn status_for(e: &QueryError) -> StatusCode {
    match e {
        QueryError::UnknownGraph(_) => StatusCode::NOT_FOUND,
        e if e.is_user_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(registry: Arc<GraphRegistry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);
    Router::new()
        .route("/v1/graphs/:slug/query", post(query))
        .route("/v1/graphs/:slug/schema", put(replace_schema))
        .route("/v1/graphs/:slug/grammar", get(grammar))
        .layer(cors)
        .with_state(registry)
}

async fn query(
    State(registry): State<Arc<GraphRegistry>>,
    Path(slug): Path<String>,
    Json(req): Json<QueryRequest>,
) -> (StatusCode, Json<QueryResponse>) {
    // parsing is synchronous, keep it off the async workers
    let started = Instant::now();
    let graph = slug.clone();
    let result = tokio::task::spawn_blocking(move || registry.parse(&graph, &req.query)).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(Ok(plan)) => {
            info!(graph = %slug, ms = elapsed_ms, origins = plan.origins.len(), "query complete");
            let body = QueryResponse {
                status: "ok".into(),
                elapsed_ms,
                plan: Some(plan),
                error: None,
                column: None,
                expected: None,
            };
            (StatusCode::OK, Json(body))
        }
        Ok(Err(e)) => {
            let status = status_for(&e);
            warn!(graph = %slug, error = %e, code = %status.as_u16(), "query error");
            (status, Json(QueryResponse::error(&e, elapsed_ms)))
        }
        Err(e) => {
            warn!(error = %e, "join error");
            let body = QueryResponse {
                status: "error".into(),
                elapsed_ms,
                plan: None,
                error: Some(format!("query task failed: {e}")),
                column: None,
                expected: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

async fn replace_schema(
    State(registry): State<Arc<GraphRegistry>>,
    Path(slug): Path<String>,
    Json(schema): Json<Schema>,
) -> (StatusCode, Json<serde_json::Value>) {
    match registry.register(&slug, &schema) {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "node_types": schema.node_types().len(),
                "relationship_types": schema.relationship_types().len(),
            })),
        ),
        Err(e) => {
            // the schema came from the caller, so an inconsistent one is their mistake
            let status = if matches!(e, QueryError::SchemaInconsistency(_)) {
                StatusCode::BAD_REQUEST
            } else {
                status_for(&e)
            };
            warn!(graph = %slug, error = %e, "schema rejected");
            (
                status,
                Json(serde_json::json!({"status": "error", "error": e.to_string()})),
            )
        }
    }
}

async fn grammar(
    State(registry): State<Arc<GraphRegistry>>,
    Path(slug): Path<String>,
) -> (StatusCode, String) {
    match registry.describe(&slug) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (status_for(&e), e.to_string()),
    }
}
