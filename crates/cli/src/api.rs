//! HTTP routes over [`PrecacheService`]

use crate::error::ApiError;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use prewarm_cache::PrecacheService;
use prewarm_core::{FileInfo, ProgressReport};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Application state shared with handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PrecacheService>,
}

/// Acknowledgement of a started precache job
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Creates the router with every API endpoint
#[must_use]
pub fn create_router(service: Arc<PrecacheService>) -> Router {
    Router::new()
        .route("/api/browse", get(browse_root))
        .route("/api/browse/*path", get(browse))
        .route("/api/precache/*path", post(precache))
        .route("/api/cache-progress", get(progress_root))
        .route("/api/cache-progress/*path", get(progress))
        .with_state(AppState { service })
}

async fn browse_root(state: State<AppState>) -> ApiResult<Vec<FileInfo>> {
    browse(state, Path(String::new())).await
}

async fn browse(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<Vec<FileInfo>> {
    Ok(Json(state.service.list_directory(&path).await?))
}

async fn precache(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<MessageResponse> {
    let job = state.service.start_precache(&path).await?;
    info!(request = %path, root = %job.root.display(), "precache requested");
    Ok(Json(MessageResponse {
        message: format!("Started caching: /{}", path.trim_start_matches('/')),
    }))
}

async fn progress_root(state: State<AppState>) -> ApiResult<ProgressReport> {
    progress(state, Path(String::new())).await
}

async fn progress(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> ApiResult<ProgressReport> {
    Ok(Json(state.service.get_progress(&path).await?))
}
