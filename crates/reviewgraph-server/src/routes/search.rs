//! Search routes: enhanced free-text search, attribute filters, semantic triples.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use reviewgraph_resolve::SearchFilters;
use reviewgraph_runtime::FilteredAnswer;
use reviewgraph_store::SemanticResult;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/filter", post(filter))
        .route("/semantic", get(semantic))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    top_n: Option<usize>,
    /// Plain BM25 instead of the enhanced pipeline.
    #[serde(default)]
    plain: bool,
}

/// GET /api/search?q=&top_n=: enhanced search plus the semantic triple query.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    if params.plain {
        let outcome = state.facade.keyword_search(&params.q, params.top_n);
        return Json(serde_json::json!({
            "query": params.q,
            "status": outcome.status,
            "message": outcome.message,
            "hits": outcome.hits,
        }))
        .into_response();
    }
    Json(state.facade.search(&params.q, params.top_n)).into_response()
}

#[derive(Deserialize)]
struct FilterRequest {
    #[serde(flatten)]
    filters: SearchFilters,
    keyword: Option<String>,
    top_n: Option<usize>,
}

/// POST /api/filter: attribute filters with an optional keyword re-rank.
async fn filter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FilterRequest>,
) -> Json<FilteredAnswer> {
    let keyword = req.keyword.as_deref().filter(|k| !k.trim().is_empty());
    Json(state.facade.filtered_search(&req.filters, keyword, req.top_n))
}

#[derive(Deserialize)]
struct SemanticParams {
    #[serde(default)]
    q: String,
}

/// GET /api/semantic?q=: rule-table triple lookup.
async fn semantic(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SemanticParams>,
) -> Json<SemanticResult> {
    Json(state.facade.semantic_query(&params.q))
}
