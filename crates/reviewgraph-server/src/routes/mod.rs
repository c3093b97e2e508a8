//! HTTP route handlers, all nested under `/api`.

pub mod search;
pub mod stats;
pub mod triples;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(search::routes())
        .merge(triples::routes())
        .merge(stats::routes())
}

/// A façade error rendered as `{"error": ...}`. Bad input is the caller's
/// fault (400); everything else is ours (500).
pub struct ApiError(reviewgraph_core::Error);

impl From<reviewgraph_core::Error> for ApiError {
    fn from(err: reviewgraph_core::Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Run blocking façade work (file IO, enrichment) off the async workers.
pub(crate) async fn blocking<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> reviewgraph_core::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| reviewgraph_core::Error::Internal(format!("worker panicked: {}", e)))?
        .map_err(ApiError::from)
}
