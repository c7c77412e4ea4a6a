use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use hyperboard_logs::PlotPoint;

use super::{blocking, AppState, RootParams};

/// Empty when the selected root is missing or malformed.
pub async fn get_plot(
    State(state): State<AppState>,
    Query(params): Query<RootParams>,
) -> Result<Json<Vec<PlotPoint>>, (StatusCode, String)> {
    let store = state.store.clone();
    let series = blocking(move || store.plot(params.root.as_deref())).await?;
    Ok(Json(series))
}
