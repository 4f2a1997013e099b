//! Resolves a book into a renderable content descriptor

use crate::error::ServiceError;
use crate::service::ReadingService;
use crate::types::{BookId, ContentDescriptor, UserId};
use std::sync::Arc;

/// Asks the remote content service how a book must be rendered
///
/// Holds no state of its own. Every failure is folded into
/// [`ContentDescriptor::Unavailable`] and nothing is retried; re-opening the
/// book issues a fresh call.
#[derive(Clone)]
pub struct ContentSourceResolver {
    service: Arc<dyn ReadingService>,
}

impl ContentSourceResolver {
    pub fn new(service: Arc<dyn ReadingService>) -> Self {
        Self { service }
    }

    /// Resolve `book_id` into exactly one descriptor variant
    ///
    /// Passing `user_id` makes the service bump that user's last-accessed
    /// timestamp as part of the same call.
    pub async fn resolve(&self, book_id: BookId, user_id: Option<UserId>) -> ContentDescriptor {
        let descriptor = match self.service.resolve_content(book_id, user_id).await {
            Ok(resolution) => ContentDescriptor::from(resolution),
            Err(ServiceError::Rejected { status, message }) => {
                ContentDescriptor::transport_error(format!("status {}: {}", status, message))
            }
            Err(err) => ContentDescriptor::transport_error(err),
        };

        match descriptor.unavailable_reason() {
            Some(reason) => tracing::debug!(%book_id, reason, "content unavailable"),
            None => tracing::debug!(%book_id, "content resolved"),
        }
        descriptor
    }
}
