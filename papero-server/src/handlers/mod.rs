//! Request handlers

mod library;
mod reading;
mod sync;

pub use library::*;
pub use reading::*;
pub use sync::*;

use crate::state::LibraryError;
use axum::{http::StatusCode, Json};
use papero_core::types::ErrorBody;
use serde::Serialize;

/// Error response: status plus `{ "error": ... }` body
pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        let status = match err {
            LibraryError::UnknownBook | LibraryError::NotOwned => StatusCode::NOT_FOUND,
            LibraryError::AlreadyOwned => StatusCode::CONFLICT,
        };
        api_error(status, err.message())
    }
}

/// Write the library index, reporting failure as a 500
pub(crate) async fn persist(state: &crate::state::AppState) -> Result<(), ApiError> {
    state.save_library().await.map_err(|e| {
        tracing::error!("Failed to save library: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
