//! Operations endpoints
//!
//! Health and diagnostics for monitoring. The health body reports how many
//! drains the scheduler is currently placing and how many adapters it
//! places them on.

use std::io;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use drain_metrics::{SchedulerMetricsProvider, SchedulerMetricsSnapshot};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(rename = "drainCount")]
    pub drain_count: u64,
    #[serde(rename = "adapterCount")]
    pub adapter_count: u64,
}

/// Health routes
pub fn health_router(metrics: Arc<dyn SchedulerMetricsProvider>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(metrics)
}

/// Diagnostics routes, served on the profiling hostport
pub fn debug_router(metrics: Arc<dyn SchedulerMetricsProvider>) -> Router {
    Router::new()
        .route("/debug/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn health_handler(
    State(metrics): State<Arc<dyn SchedulerMetricsProvider>>,
) -> Json<HealthResponse> {
    let snapshot = metrics.snapshot();
    Json(HealthResponse {
        drain_count: snapshot.desired_drains,
        adapter_count: snapshot.adapter_count,
    })
}

async fn metrics_handler(
    State(metrics): State<Arc<dyn SchedulerMetricsProvider>>,
) -> Json<SchedulerMetricsSnapshot> {
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

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use drain_metrics::SchedulerMetrics;

    use super::*;

    #[tokio::test]
    async fn test_health_reports_counts() {
        let metrics = Arc::new(SchedulerMetrics::new());
        metrics.set_desired_drains(3);
        metrics.set_adapter_count(2);

        let response = health_router(metrics)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["drainCount"], 3);
        assert_eq!(json["adapterCount"], 2);
    }

    #[tokio::test]
    async fn test_debug_metrics_serves_snapshot() {
        let metrics = Arc::new(SchedulerMetrics::new());
        metrics.record_tick();

        let response = debug_router(metrics)
            .oneshot(
                Request::builder()
                    .uri("/debug/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ticks"], 1);
    }
}
