//! Catalogue and library handlers

use super::{api_error, persist, ApiError};
use crate::state::{AppState, ContentSource, ServerEvent};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use papero_core::types::{Book, EntryRef, LibraryEntry, UserId};
use serde::Deserialize;

/// List the catalogue
pub async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    let library = state.library.read().await;
    Json(library.catalogue())
}

/// Body for adding a catalogue book
#[derive(Debug, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,

    /// Decimal price string, free when absent
    pub price: Option<String>,

    pub source: Option<ContentSource>,
}

/// Add a book to the catalogue
pub async fn add_book(
    State(state): State<AppState>,
    Json(body): Json<NewBook>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    if body.title.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let mut book = Book::new(body.title.trim(), body.author.trim());
    if let Some(cover_url) = body.cover_url {
        book = book.with_cover(cover_url);
    }
    if let Some(price) = body.price {
        book = book.with_price(price);
    }

    {
        let mut library = state.library.write().await;
        library.add_book(book.clone(), body.source);
    }
    persist(&state).await?;

    tracing::info!(book_id = %book.id, title = %book.title, "book added to catalogue");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Query parameters for the library listing
#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    pub user_id: Option<UserId>,
}

/// A user's library, recency-descending
///
/// Without a `user_id` the listing is empty rather than an error.
pub async fn list_library(
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> Json<Vec<LibraryEntry>> {
    let Some(user_id) = query.user_id else {
        return Json(Vec::new());
    };
    let library = state.library.read().await;
    Json(library.entries_for(user_id))
}

/// Add a catalogue book to a user's library
pub async fn acquire_book(
    State(state): State<AppState>,
    Json(body): Json<EntryRef>,
) -> Result<(StatusCode, Json<LibraryEntry>), ApiError> {
    let entry = {
        let mut library = state.library.write().await;
        library.acquire(body.user_id, body.book_id, chrono::Utc::now())?
    };
    persist(&state).await?;

    state.broadcast(ServerEvent::BookAcquired {
        user_id: body.user_id,
        book_id: body.book_id,
    });
    Ok((StatusCode::CREATED, Json(entry)))
}
