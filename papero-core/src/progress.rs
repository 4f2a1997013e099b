//! Normalized reading progress: local edits, explicit remote flushes

use crate::error::SaveError;
use crate::service::{ReadingService, ServiceResult};
use crate::types::{Ack, BookId, EntryRef, Progress, ProgressUpdate, UserId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-(user, book) progress with optimistic local state
///
/// [`set`](Self::set) never touches the network. [`save`](Self::save) is the
/// only progress write and is always caller-triggered, so a slider can call
/// `set` on every movement without generating remote traffic. A failed save
/// keeps the local value.
pub struct ProgressStore {
    service: Arc<dyn ReadingService>,
    values: Mutex<HashMap<(UserId, BookId), Progress>>,
}

impl ProgressStore {
    pub fn new(service: Arc<dyn ReadingService>) -> Self {
        Self {
            service,
            values: Mutex::new(HashMap::new()),
        }
    }

    fn values(&self) -> MutexGuard<'_, HashMap<(UserId, BookId), Progress>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last known value, 0 when nothing is known
    pub fn get(&self, user_id: UserId, book_id: BookId) -> Progress {
        self.values()
            .get(&(user_id, book_id))
            .copied()
            .unwrap_or_default()
    }

    /// Store a local value, clamped to `0..=100`
    pub fn set(&self, user_id: UserId, book_id: BookId, value: i64) -> Progress {
        let progress = Progress::clamped(value);
        self.values().insert((user_id, book_id), progress);
        progress
    }

    /// Adopt a server-known value unless a local one already exists
    pub fn seed(&self, user_id: UserId, book_id: BookId, progress: Progress) -> Progress {
        *self.values().entry((user_id, book_id)).or_insert(progress)
    }

    /// Clamp, store locally, then persist remotely
    pub async fn save(
        &self,
        user_id: UserId,
        book_id: BookId,
        value: i64,
    ) -> Result<Ack, SaveError> {
        let progress = self.set(user_id, book_id, value);
        let update = ProgressUpdate {
            user_id,
            book_id,
            progress,
        };

        let ack = self.service.save_progress(update).await.map_err(|e| {
            let err = SaveError::from(e);
            tracing::warn!(%book_id, %progress, "progress save failed: {}", err);
            err
        })?;

        if !ack.success {
            return Err(SaveError::Rejected("service did not confirm the write".to_string()));
        }
        tracing::debug!(%book_id, %progress, "progress saved");
        Ok(ack)
    }

    /// Record that the user opened the book now
    ///
    /// Returns the raw service error so callers can tell a refusal from an
    /// unreachable service.
    pub async fn touch_accessed(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> ServiceResult<DateTime<Utc>> {
        let stamp = self
            .service
            .touch_accessed(EntryRef { user_id, book_id })
            .await?;
        Ok(stamp.last_accessed_at)
    }
}
