use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use hyperboard_logs::{CandidateRoot, DashboardView, ReplayView, RootData};

use super::{blocking, AppState, RootParams};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub root_folder: String,
    pub root_valid: bool,
    pub live: bool,
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Health>, (StatusCode, String)> {
    let live = state.watcher.is_some();
    let store = state.store.clone();
    let (root_folder, root_valid) = blocking(move || {
        (
            store.root_folder().display().to_string(),
            store.root_is_valid(),
        )
    })
    .await?;

    Ok(Json(Health {
        status: "ok",
        root_folder,
        root_valid,
        live,
    }))
}

pub async fn list_roots(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateRoot>>, (StatusCode, String)> {
    let store = state.store.clone();
    let candidates = blocking(move || store.candidates()).await?;
    Ok(Json(candidates))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<RootParams>,
) -> Result<Json<DashboardView>, (StatusCode, String)> {
    let store = state.store.clone();
    let view = blocking(move || store.dashboard(params.root.as_deref())).await?;
    Ok(Json(view))
}

pub async fn get_sessions(
    State(state): State<AppState>,
    Query(params): Query<RootParams>,
) -> Result<Json<RootData>, (StatusCode, String)> {
    let store = state.store.clone();
    blocking(move || store.sessions(params.root.as_deref()))
        .await?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                "No valid log root to show".to_string(),
            )
        })
}

pub async fn get_replay(
    State(state): State<AppState>,
    Path(session): Path<u64>,
    Query(params): Query<RootParams>,
) -> Result<Json<ReplayView>, (StatusCode, String)> {
    let store = state.store.clone();
    blocking(move || store.replay(params.root.as_deref(), session))
        .await?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Session {} not found", session),
            )
        })
}
