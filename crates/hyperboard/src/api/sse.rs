use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::AppState;

/// Stream changes under the root folder; clients re-fetch the dashboard on each event.
pub async fn tree_events(
    State(state): State<AppState>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)>
{
    let watcher = state.watcher.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Live updates are not available for this root folder".to_string(),
        )
    })?;

    let rx = watcher.subscribe();
    let stream = BroadcastStream::new(rx).map(|result| {
        let event = match result {
            Ok(evt) => Event::default()
                .event(evt.name())
                .data(serde_json::to_string(&evt).unwrap_or_default()),
            Err(_) => Event::default().comment("missed event"),
        };
        Ok(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
