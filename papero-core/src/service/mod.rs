//! Seam between the engine and the remote library/content service

mod http;

pub use http::HttpReadingService;

use crate::error::ServiceError;
use crate::ranker::sort_by_recency;
use crate::types::{
    AccessStamp, Ack, Book, BookId, ContentResolution, EntryRef, LibraryEntry, Progress,
    ProgressUpdate, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Result type for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Abstract remote library/content service
///
/// Every call takes the user identity explicitly; implementations never
/// consult an ambient "current user".
#[async_trait]
pub trait ReadingService: Send + Sync {
    /// Ask how a book must be rendered
    ///
    /// When `user_id` is given the service also bumps that user's
    /// last-accessed timestamp for the book, so this call is not idempotent.
    async fn resolve_content(
        &self,
        book_id: BookId,
        user_id: Option<UserId>,
    ) -> ServiceResult<ContentResolution>;

    /// The user's library, recency-descending
    async fn fetch_library(&self, user_id: UserId) -> ServiceResult<Vec<LibraryEntry>>;

    /// Persist a progress value
    async fn save_progress(&self, update: ProgressUpdate) -> ServiceResult<Ack>;

    /// Record that the user opened the book now
    async fn touch_accessed(&self, entry: EntryRef) -> ServiceResult<AccessStamp>;
}

#[derive(Default)]
struct MemoryState {
    catalogue: HashMap<BookId, (Book, ContentResolution)>,
    entries: HashMap<(UserId, BookId), LibraryEntry>,
}

/// In-memory reading service (for testing and demos)
///
/// Behaves like the HTTP service: unknown books resolve to an error body,
/// access stamps never move backwards, and library listings come back
/// recency-descending. Failures can be switched on to exercise error paths.
#[derive(Default)]
pub struct MemoryReadingService {
    state: RwLock<MemoryState>,
    offline: AtomicBool,
    reject_saves: AtomicBool,
}

impl MemoryReadingService {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> ServiceResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ServiceError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    /// Add a book to the catalogue together with how it resolves
    pub fn add_book(&self, book: Book, content: ContentResolution) {
        self.write().catalogue.insert(book.id, (book, content));
    }

    /// Put an entry into a user's library, replacing any previous one
    pub fn add_entry(&self, user_id: UserId, entry: LibraryEntry) {
        self.write().entries.insert((user_id, entry.book.id), entry);
    }

    /// The stored entry, if the user owns the book
    pub fn entry(&self, user_id: UserId, book_id: BookId) -> Option<LibraryEntry> {
        self.read().entries.get(&(user_id, book_id)).cloned()
    }

    /// Make every call fail with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make progress writes fail with a rejection
    pub fn set_reject_saves(&self, reject: bool) {
        self.reject_saves.store(reject, Ordering::SeqCst);
    }

    fn bump(&self, user_id: UserId, book_id: BookId) -> Option<AccessStamp> {
        let mut state = self.write();
        let entry = state.entries.get_mut(&(user_id, book_id))?;
        Some(AccessStamp {
            last_accessed_at: entry.record_access(Utc::now()),
        })
    }
}

#[async_trait]
impl ReadingService for MemoryReadingService {
    async fn resolve_content(
        &self,
        book_id: BookId,
        user_id: Option<UserId>,
    ) -> ServiceResult<ContentResolution> {
        self.check_online()?;

        let content = match self.read().catalogue.get(&book_id) {
            Some((_, content)) => content.clone(),
            None => return Ok(ContentResolution::error("Book not found")),
        };
        if let Some(user_id) = user_id {
            self.bump(user_id, book_id);
        }
        Ok(content)
    }

    async fn fetch_library(&self, user_id: UserId) -> ServiceResult<Vec<LibraryEntry>> {
        self.check_online()?;

        let mut entries: Vec<LibraryEntry> = self
            .read()
            .entries
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|(_, entry)| entry.clone())
            .collect();
        sort_by_recency(&mut entries);
        Ok(entries)
    }

    async fn save_progress(&self, update: ProgressUpdate) -> ServiceResult<Ack> {
        self.check_online()?;
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(ServiceError::Rejected {
                status: 503,
                message: "progress writes disabled".to_string(),
            });
        }

        let mut state = self.write();
        let entry = state
            .entries
            .get_mut(&(update.user_id, update.book_id))
            .ok_or_else(|| ServiceError::Rejected {
                status: 404,
                message: "Book not in library".to_string(),
            })?;
        entry.progress = Progress::clamped(update.progress.value().into());
        Ok(Ack {
            success: true,
            progress: entry.progress,
        })
    }

    async fn touch_accessed(&self, entry: EntryRef) -> ServiceResult<AccessStamp> {
        self.check_online()?;
        self.bump(entry.user_id, entry.book_id)
            .ok_or_else(|| ServiceError::Rejected {
                status: 404,
                message: "Book not in library".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seeded() -> (MemoryReadingService, UserId, Book) {
        let service = MemoryReadingService::new();
        let user = UserId::new();
        let book = Book::new("Frankenstein", "Mary Shelley");
        service.add_book(book.clone(), ContentResolution::content("You will rejoice..."));
        service.add_entry(user, LibraryEntry::new(book.clone()));
        (service, user, book)
    }

    #[tokio::test]
    async fn test_memory_service_resolves_and_bumps() {
        let (service, user, book) = seeded();

        let anonymous = service.resolve_content(book.id, None).await.unwrap();
        assert_eq!(anonymous.content.as_deref(), Some("You will rejoice..."));
        assert!(service.entry(user, book.id).unwrap().last_accessed_at.is_none());

        service.resolve_content(book.id, Some(user)).await.unwrap();
        assert!(service.entry(user, book.id).unwrap().last_accessed_at.is_some());

        let unknown = service.resolve_content(BookId::new(), None).await.unwrap();
        assert_eq!(unknown.error.as_deref(), Some("Book not found"));
    }

    #[tokio::test]
    async fn test_memory_service_touch_is_monotonic() {
        let (service, user, book) = seeded();
        let future = Utc::now() + Duration::days(1);
        service.add_entry(user, LibraryEntry::new(book.clone()).with_last_accessed(future));

        let stamp = service
            .touch_accessed(EntryRef {
                user_id: user,
                book_id: book.id,
            })
            .await
            .unwrap();
        assert_eq!(stamp.last_accessed_at, future);
    }

    #[tokio::test]
    async fn test_memory_service_failures() {
        let (service, user, book) = seeded();
        let update = ProgressUpdate {
            user_id: user,
            book_id: book.id,
            progress: Progress::clamped(40),
        };

        service.set_reject_saves(true);
        let err = service.save_progress(update).await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { status: 503, .. }));

        service.set_offline(true);
        let err = service.fetch_library(user).await.unwrap_err();
        assert!(err.is_transport());

        service.set_offline(false);
        service.set_reject_saves(false);
        let ack = service.save_progress(update).await.unwrap();
        assert_eq!(ack.progress.value(), 40);
        assert_eq!(service.entry(user, book.id).unwrap().progress.value(), 40);
    }
}
