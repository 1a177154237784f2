use std::sync::Arc;

use analysis_orchestrator::Analyzer;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

pub mod routes;

/// Shared server state: the stateless analyzer plus an HTTP client for the
/// upstream search proxy.
pub struct AppState {
    pub analyzer: Analyzer,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            analyzer: Analyzer::new(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport-level error with a JSON `{ error, message }` body.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Upstream(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "Upstream error", msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// Build the full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server entry point: env config, tracing, bind, serve.
pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");

    let state = Arc::new(AppState::new());
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("stock analysis API listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
