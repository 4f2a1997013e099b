//! Content resolution, progress and access handlers

use super::{api_error, persist, ApiError};
use crate::state::{AppState, ServerEvent};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use papero_core::types::{
    AccessStamp, Ack, BookId, ContentResolution, EntryRef, ProgressUpdate, UserId,
};
use serde::Deserialize;

/// Query parameters for content resolution
#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub book_id: BookId,

    /// When present, the user's last-accessed stamp is bumped too
    pub user_id: Option<UserId>,
}

/// Tell the client how a book must be rendered
pub async fn resolve_content(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ContentResolution>, ApiError> {
    let resolution = {
        let library = state.library.read().await;
        library
            .resolve(query.book_id)
            .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Book not found"))?
    };

    if let Some(user_id) = query.user_id {
        let bumped = {
            let mut library = state.library.write().await;
            library.touch(user_id, query.book_id, chrono::Utc::now()).is_ok()
        };
        if bumped {
            persist(&state).await?;
            state.broadcast(ServerEvent::BookOpened {
                user_id,
                book_id: query.book_id,
            });
        }
    }

    Ok(Json(resolution))
}

/// Persist a progress value
///
/// Out-of-range values are clamped while the body is decoded.
pub async fn save_progress(
    State(state): State<AppState>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<Ack>, ApiError> {
    let progress = {
        let mut library = state.library.write().await;
        library.set_progress(update.user_id, update.book_id, update.progress)?
    };
    persist(&state).await?;

    tracing::debug!(book_id = %update.book_id, %progress, "progress saved");
    state.broadcast(ServerEvent::ProgressSaved {
        user_id: update.user_id,
        book_id: update.book_id,
        progress,
    });
    Ok(Json(Ack {
        success: true,
        progress,
    }))
}

/// Record that a user opened a book
pub async fn touch_accessed(
    State(state): State<AppState>,
    Json(body): Json<EntryRef>,
) -> Result<Json<AccessStamp>, ApiError> {
    let last_accessed_at = {
        let mut library = state.library.write().await;
        library.touch(body.user_id, body.book_id, chrono::Utc::now())?
    };
    persist(&state).await?;

    state.broadcast(ServerEvent::BookOpened {
        user_id: body.user_id,
        book_id: body.book_id,
    });
    Ok(Json(AccessStamp { last_accessed_at }))
}
