use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::adapters::SnapshotStore;

/// Prometheus text exposition content type
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Custom error type that implements IntoResponse
#[derive(Debug)]
pub struct AppError(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0).into_response()
    }
}

impl From<prometheus::Error> for AppError {
    fn from(err: prometheus::Error) -> Self {
        AppError(err.to_string())
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
}

/// GET /metrics - encode the current snapshots on demand (pull-based)
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.store.encode()?;
    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response())
}

/// GET /healthz
pub async fn health_handler() -> &'static str {
    "ok"
}
