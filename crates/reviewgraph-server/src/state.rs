//! Shared application state.

use reviewgraph_core::ServerConfig;
use reviewgraph_runtime::QueryFacade;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub facade: QueryFacade,
}

impl AppState {
    pub fn new(config: ServerConfig, facade: QueryFacade) -> Self {
        Self { config, facade }
    }
}
