//! Adapter control plane
//!
//! The HTTP surface the scheduler drives:
//!
//! - `POST /v1/bindings` accepts a binding (idempotent)
//! - `DELETE /v1/bindings` drops a binding (no-op when absent)
//! - `GET /v1/bindings` returns an unordered snapshot
//!
//! plus `GET /health` on the health hostport reporting the binding gauge.

use std::io;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use drain_metrics::{BindingMetricsProvider, BindingMetricsSnapshot};
use drain_protocol::{CreateBindingRequest, DeleteBindingRequest, ListBindingsResponse};

use crate::binding_manager::BindingManager;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(rename = "drainCount")]
    pub drain_count: i64,
}

/// Control-plane routes
pub fn control_router(manager: Arc<BindingManager>) -> Router {
    Router::new()
        .route(
            "/v1/bindings",
            get(list_bindings).post(create_binding).delete(delete_binding),
        )
        .with_state(manager)
}

/// Health routes
pub fn health_router(metrics: Arc<dyn BindingMetricsProvider>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(metrics)
}

/// Diagnostics routes, served on the profiling hostport
pub fn debug_router(metrics: Arc<dyn BindingMetricsProvider>) -> Router {
    Router::new()
        .route("/debug/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn create_binding(
    State(manager): State<Arc<BindingManager>>,
    Json(request): Json<CreateBindingRequest>,
) -> Json<Value> {
    manager.add(request.binding).await;
    Json(json!({}))
}

async fn delete_binding(
    State(manager): State<Arc<BindingManager>>,
    Json(request): Json<DeleteBindingRequest>,
) -> Json<Value> {
    manager.delete(&request.binding).await;
    Json(json!({}))
}

async fn list_bindings(State(manager): State<Arc<BindingManager>>) -> Json<ListBindingsResponse> {
    Json(ListBindingsResponse {
        bindings: manager.list().await,
    })
}

async fn health_handler(
    State(metrics): State<Arc<dyn BindingMetricsProvider>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        drain_count: metrics.snapshot().drain_bindings,
    })
}

async fn metrics_handler(
    State(metrics): State<Arc<dyn BindingMetricsProvider>>,
) -> Json<BindingMetricsSnapshot> {
    Json(metrics.snapshot())
}

/// Bind `addr` and serve `router` until the process exits. A bare `:port`
/// binds every interface.
pub async fn serve(addr: &str, router: Router) -> io::Result<()> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "http listener started");
    axum::serve(listener, router).await
}
