//! REST API server for GitIntel.
//!
//! Provides HTTP endpoints for:
//! - Meeting processing (POST /api/process-meeting)
//! - Projects linked to GitHub repositories
//! - Meetings and their summarized issues

pub mod error;
pub mod extractors;
pub mod routes;
pub mod validation;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::auth::SessionResolver;
use crate::db::Database;
use crate::ingestion::IngestionDispatcher;

/// Everything a request handler may touch. Built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<dyn SessionResolver>,
    pub dispatcher: IngestionDispatcher,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .nest("/api", routes::router())
        .layer(middleware::from_fn(log_timing))
        .with_state(state)
}

pub struct ApiServer {
    address: String,
    state: AppState,
}

impl ApiServer {
    pub fn new(address: impl Into<String>, state: AppState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }

    /// Serve until `shutdown` resolves, then drain open connections.
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind API server to {}", self.address))?;

        info!("API server listening on http://{}", self.address);
        info!("Endpoints:");
        info!("  GET  /                          - Service info");
        info!("  GET  /version                   - Get version info");
        info!("  POST /api/process-meeting       - Summarize a meeting recording");
        info!("  GET  /api/projects              - List projects");
        info!("  POST /api/projects              - Create a project");
        info!("  GET  /api/projects/:id          - Get a project");
        info!("  GET  /api/projects/:id/meetings - List a project's meetings");
        info!("  POST /api/projects/:id/meetings - Register a meeting");
        info!("  GET  /api/meetings/:id          - Get a meeting with its issues");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .context("API server error")?;

        info!("API server stopped");
        Ok(())
    }
}

async fn log_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    debug!("{} {} took {}ms", method, path, started.elapsed().as_millis());
    response
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "gitintel",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "gitintel"
    }))
}
