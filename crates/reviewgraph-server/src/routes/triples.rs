//! Triple export and entity graph routes.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{blocking, ApiError};
use crate::state::AppState;
use reviewgraph_core::Error;
use reviewgraph_runtime::GraphView;

const DEFAULT_EXPORT_NAME: &str = "triples.csv";
const DEFAULT_TOP_ENTITIES: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/export", post(export))
        .route("/graph", get(graph))
        .route("/graph/neighbors", get(neighbors))
}

#[derive(Deserialize, Default)]
struct ExportRequest {
    /// File name inside the exports directory.
    filename: Option<String>,
}

/// POST /api/export: write the triple table and its stats file.
async fn export(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let req: ExportRequest = if body.is_empty() {
        ExportRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| Error::InvalidInput(e.to_string()))?
    };
    let name = req.filename.unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());
    if Path::new(&name).file_name().map(|f| f != name.as_str()).unwrap_or(true) {
        return Err(Error::InvalidInput(format!("invalid export file name '{}'", name)).into());
    }
    let path = state.config.data_paths.exports.join(name);
    let summary = blocking(&state, move |s| s.facade.export_triples(&path)).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

#[derive(Deserialize)]
struct GraphParams {
    view: Option<String>,
    top_n: Option<usize>,
}

fn parse_view(raw: Option<&str>) -> Result<GraphView, ApiError> {
    Ok(raw.map(str::parse::<GraphView>).transpose()?.unwrap_or_default())
}

/// GET /api/graph?view=&top_n=: node/edge counts and the best-connected entities.
async fn graph(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GraphParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = parse_view(params.view.as_deref())?;
    let graph = state.facade.graph(view);
    Ok(Json(serde_json::json!({
        "view": view,
        "stats": graph.stats(),
        "top_entities": graph.top_entities(params.top_n.unwrap_or(DEFAULT_TOP_ENTITIES)),
    })))
}

#[derive(Deserialize)]
struct NeighborParams {
    entity: String,
    view: Option<String>,
}

/// GET /api/graph/neighbors?entity=&view=
async fn neighbors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NeighborParams>,
) -> Result<impl IntoResponse, ApiError> {
    let view = parse_view(params.view.as_deref())?;
    let graph = state.facade.graph(view);
    if !graph.contains(&params.entity) {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown entity '{}'", params.entity) })),
        ));
    }
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "entity": params.entity,
            "view": view,
            "neighbors": graph.neighbors(&params.entity),
        })),
    ))
}
