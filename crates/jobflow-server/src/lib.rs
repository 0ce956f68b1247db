//! HTTP API server for jobflow.
//!
//! Exposes the workflow engine over JSON: catalog reads, job start, step
//! execution and the job step log. Request and response bodies keep the
//! field names existing clients already send (`JOB_ID`, `WorkflowID`,
//! `UserInput`, ...).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobflow_engine::{EngineConfig, EngineServices};
//! use jobflow_server::{Server, ServerConfig};
//! use jobflow_store::Store;
//!
//! let store = Arc::new(Store::open(&path)?);
//! let engine = EngineServices::from_store(store, EngineConfig::default());
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:5090".parse()?);
//!
//! Server::new(engine, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use jobflow_engine::EngineServices;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The jobflow HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server over the given engine.
    pub fn new(engine: EngineServices, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(engine, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes())
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                middleware::request_logging_middleware,
            ))
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors_layer(&self.state.config.cors_origins) {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// API routes (v1).
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            // Catalog
            .route("/workflows", get(routes::list_workflows_handler))
            .route("/workflow/start", post(routes::start_job_handler))
            // Steps
            .route(
                "/workflow/{workflow_id}/step/{step_id}",
                get(routes::get_step_handler),
            )
            .route(
                "/workflow/{workflow_id}/step/{step_id}/dropdown",
                get(routes::dropdown_handler),
            )
            .route(
                "/workflow/{workflow_id}/step/{step_id}/execute",
                post(routes::execute_step_handler),
            )
            .route(
                "/workflow/{workflow_id}/step/{step_id}/actions",
                post(routes::run_action_handler),
            )
            .route(
                "/workflow/{workflow_id}/step/{step_id}/conditions",
                post(routes::run_condition_handler),
            )
            // Job log
            .route("/workflow/step/log", post(routes::log_step_handler))
            .route("/jobs/{job_id}", get(routes::get_job_handler))
            .route("/jobs/{job_id}/log", get(routes::job_log_handler))
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

/// CORS for the configured origins; `None` when no origins are set.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::{
        body::{Body, Bytes},
        http::{Method, Request, StatusCode, header},
    };
    use jobflow_engine::{EngineConfig, EngineServices};
    use jobflow_store::fixtures::test_store;
    use tower::ServiceExt;

    use crate::{AppState, Server, ServerConfig};

    pub fn create_test_state() -> AppState {
        let engine = EngineServices::from_store(Arc::new(test_store()), EngineConfig::default());
        AppState::new(engine, ServerConfig::new().with_request_logging(false))
    }

    /// Send one request through the full router.
    pub async fn send(
        state: AppState,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Bytes) {
        let app = Server::from_state(state).router();
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }
}
