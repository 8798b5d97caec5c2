pub mod download;
pub mod status;
pub mod upload;

use std::sync::Arc;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::Config;
use crate::jobs::{JobStore, Scheduler};

/// Per-request body ceiling for uploads.
pub const MAX_BODY_BYTES: usize = 1024 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub scheduler: Scheduler,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(upload::index))
        .route("/upload", post(upload::upload_media))
        .route("/jobs/:id", get(status::job_status))
        .route("/jobs/:id/files/:name", get(download::download_file))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
