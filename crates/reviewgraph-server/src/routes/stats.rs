//! Dataset statistics and reload routes.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{blocking, ApiError};
use crate::state::AppState;
use reviewgraph_core::Error;
use reviewgraph_runtime::{DatasetStats, LoadSummary};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/reload", post(reload))
}

/// GET /api/stats: record, index, triple and graph counts for the loaded dataset.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<DatasetStats> {
    Json(state.facade.stats())
}

#[derive(Deserialize, Default)]
struct ReloadRequest {
    /// Review file to load instead of the current one.
    path: Option<PathBuf>,
}

/// POST /api/reload: re-enrich the current dataset, or load a new one.
///
/// On failure the previous dataset keeps serving.
async fn reload(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LoadSummary>, ApiError> {
    let req: ReloadRequest = if body.is_empty() {
        ReloadRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| Error::InvalidInput(e.to_string()))?
    };
    let summary = blocking(&state, move |s| match req.path {
        Some(path) => s.facade.load(&path),
        None => s.facade.reload(),
    })
    .await?;
    Ok(Json(summary))
}
