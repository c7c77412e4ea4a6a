use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use super::{blocking, AppState, RootParams};

pub async fn get_thumbnail(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<RootParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.clone();
    let relative = path.clone();
    let file = blocking(move || store.thumbnail_path(params.root.as_deref(), &relative))
        .await?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No thumbnail at {}", path)))?;

    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// Download a session's predicate descriptor.
pub async fn get_predicate(
    State(state): State<AppState>,
    Path(session): Path<u64>,
    Query(params): Query<RootParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store.clone();
    let file = blocking(move || store.predicate_path(params.root.as_deref(), session))
        .await?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Session {} has no predicate file", session),
            )
        })?;

    let bytes = tokio::fs::read(&file)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"pred.hyperfindsearch\"",
            ),
        ],
        bytes,
    ))
}
