//! Server-Sent Events handler for real-time updates

use crate::state::{AppState, ServerEvent};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Event name and JSON payload for an SSE frame
pub fn event_payload(event: &ServerEvent) -> (&'static str, serde_json::Value) {
    match event {
        ServerEvent::BookAcquired { user_id, book_id } => (
            "book_acquired",
            serde_json::json!({ "user_id": user_id, "book_id": book_id }),
        ),
        ServerEvent::BookOpened { user_id, book_id } => (
            "book_opened",
            serde_json::json!({ "user_id": user_id, "book_id": book_id }),
        ),
        ServerEvent::ProgressSaved {
            user_id,
            book_id,
            progress,
        } => (
            "progress_saved",
            serde_json::json!({ "user_id": user_id, "book_id": book_id, "progress": progress }),
        ),
    }
}

/// SSE endpoint for real-time updates
pub async fn sync_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx);

    let event_stream = stream.filter_map(|result| match result {
        Ok(event) => {
            let (event_type, data) = event_payload(&event);
            Some(Ok(Event::default().event(event_type).data(data.to_string())))
        }
        Err(_) => None, // Lagged, skip
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
