use std::sync::Arc;

use scrapetok_athena::QueryExecutor;

pub struct AppState {
    pub executor: Arc<QueryExecutor>,
    /// Register the `/debug/*` routes.
    pub debug_routes: bool,
    pub cors_origin: String,
}
