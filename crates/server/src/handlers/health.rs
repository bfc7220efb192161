//! Liveness endpoints.

use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET / - Banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Sample It API is running!",
    })
}

/// GET /health - Probe the metadata store. Unauthenticated for load balancers.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.metadata.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Metadata store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}
