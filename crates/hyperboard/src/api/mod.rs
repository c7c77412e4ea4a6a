mod dashboard;
mod files;
mod plot;
mod sse;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use hyperboard_logs::{LogStore, TreeWatcher};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LogStore>,
    /// `None` when the root folder could not be watched; live updates are then unavailable.
    pub watcher: Option<Arc<TreeWatcher>>,
}

/// Query string shared by every endpoint that reads a log root.
#[derive(Debug, Default, Deserialize)]
pub struct RootParams {
    /// Candidate root name; the first candidate is used when absent or unknown.
    pub root: Option<String>,
}

pub fn create_router(store: Arc<LogStore>, watcher: Option<Arc<TreeWatcher>>) -> Router {
    let state = AppState { store, watcher };

    Router::new()
        .route("/api/health", get(dashboard::health))
        .route("/api/roots", get(dashboard::list_roots))
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/sessions", get(dashboard::get_sessions))
        .route("/api/replay/{session}", get(dashboard::get_replay))
        .route("/api/plot", get(plot::get_plot))
        .route("/api/thumbnail/{*path}", get(files::get_thumbnail))
        .route("/api/predicate/{session}", get(files::get_predicate))
        .route("/api/live", get(sse::tree_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run filesystem work off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, (StatusCode, String)>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
