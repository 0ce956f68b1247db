//! Health and liveness endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Store liveness response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// `success` or `error`.
    pub status: String,
    pub message: String,
}

/// GET /health - process is up.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /test - process is up and the store answers.
pub async fn liveness(State(state): State<AppState>) -> Json<LivenessResponse> {
    let response = match state.engine.controller().ping().await {
        Ok(()) => LivenessResponse {
            status: "success".to_string(),
            message: "Database connection is working.".to_string(),
        },
        Err(e) => {
            tracing::error!(error = %e, "Liveness check failed");
            LivenessResponse {
                status: "error".to_string(),
                message: e.to_string(),
            }
        }
    };
    Json(response)
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/test", get(liveness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = Router::new().route("/health", get(health));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }
}
