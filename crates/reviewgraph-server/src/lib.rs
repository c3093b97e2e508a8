//! ReviewGraph HTTP surface: the query façade behind an axum router.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
