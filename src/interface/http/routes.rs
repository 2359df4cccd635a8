use std::sync::Arc;

use axum::{routing::get, Router};

use crate::adapters::SnapshotStore;

use super::handlers::{health_handler, metrics_handler, AppState};

pub fn create_router(store: Arc<SnapshotStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}
