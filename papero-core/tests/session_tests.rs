//! Session controller tests for papero-core
//!
//! These tests drive [`ReadingSessionController`] through its state machine
//! against an in-memory service that can hold individual calls open, which
//! lets a test decide exactly when a slow resolution or save completes.
//!
//! ## Test Strategy
//!
//! 1. **Supersession**: a late result from an older open never lands
//! 2. **Failure states**: unavailable content ends in `Failed`, re-open retries
//! 3. **Saving**: failed saves keep `Ready` and the local value
//! 4. **Continue reading**: ranking over a fetched library listing

use async_trait::async_trait;
use papero_core::service::{ReadingService, ServiceResult};
use papero_core::types::{
    AccessStamp, Ack, Book, BookId, ContentDescriptor, ContentResolution, EntryRef, LibraryEntry,
    Progress, ProgressUpdate, UserId,
};
use papero_core::{
    fetch_continue_reading, MemoryReadingService, OpenOutcome, ReadingSessionController,
    SaveError, SessionError, SessionState,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// =============================================================================
// Test Service
// =============================================================================

/// Memory service whose content resolution and saves can be held open
#[derive(Default)]
struct GatedService {
    inner: MemoryReadingService,
    gated_book: Mutex<Option<BookId>>,
    resolve_gate: Notify,
    hold_saves: AtomicBool,
    save_gate: Notify,
}

impl GatedService {
    fn gate_book(&self, book_id: BookId) {
        *self.gated_book.lock().unwrap() = Some(book_id);
    }

    fn is_gated(&self, book_id: BookId) -> bool {
        *self.gated_book.lock().unwrap() == Some(book_id)
    }
}

#[async_trait]
impl ReadingService for GatedService {
    async fn resolve_content(
        &self,
        book_id: BookId,
        user_id: Option<UserId>,
    ) -> ServiceResult<ContentResolution> {
        if self.is_gated(book_id) {
            self.resolve_gate.notified().await;
        }
        self.inner.resolve_content(book_id, user_id).await
    }

    async fn fetch_library(&self, user_id: UserId) -> ServiceResult<Vec<LibraryEntry>> {
        self.inner.fetch_library(user_id).await
    }

    async fn save_progress(&self, update: ProgressUpdate) -> ServiceResult<Ack> {
        if self.hold_saves.load(Ordering::SeqCst) {
            self.save_gate.notified().await;
        }
        self.inner.save_progress(update).await
    }

    async fn touch_accessed(&self, entry: EntryRef) -> ServiceResult<AccessStamp> {
        self.inner.touch_accessed(entry).await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

struct Fixture {
    service: Arc<GatedService>,
    user: UserId,
    controller: Arc<ReadingSessionController>,
}

impl Fixture {
    fn new() -> Self {
        let service = Arc::new(GatedService::default());
        let user = UserId::new();
        let controller = Arc::new(ReadingSessionController::new(service.clone(), user));
        Self {
            service,
            user,
            controller,
        }
    }

    fn add(&self, title: &str, content: ContentResolution) -> LibraryEntry {
        let book = Book::new(title, "Test Author");
        self.service.inner.add_book(book.clone(), content);
        let entry = LibraryEntry::new(book);
        self.service.inner.add_entry(self.user, entry.clone());
        entry
    }

    fn spawn_open(&self, entry: &LibraryEntry) -> tokio::task::JoinHandle<OpenOutcome> {
        let controller = self.controller.clone();
        let entry = entry.clone();
        tokio::spawn(async move { controller.open_session(&entry).await })
    }
}

async fn wait_for_state(
    controller: &ReadingSessionController,
    predicate: impl FnMut(&SessionState) -> bool,
) {
    let mut rx = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state never reached")
        .expect("controller dropped");
}

// =============================================================================
// Supersession
// =============================================================================

#[tokio::test]
async fn test_late_result_of_superseded_open_is_discarded() {
    let fx = Fixture::new();
    let slow = fx.add("Slow Book", ContentResolution::url("https://slow"));
    let fast = fx.add("Fast Book", ContentResolution::content("fast text"));
    fx.service.gate_book(slow.book.id);

    let first = fx.spawn_open(&slow);
    let slow_id = slow.book.id;
    wait_for_state(&fx.controller, |s| {
        matches!(s, SessionState::Opening { book } if book.id == slow_id)
    })
    .await;

    assert_eq!(fx.controller.open_session(&fast).await, OpenOutcome::Ready);

    fx.service.resolve_gate.notify_one();
    assert_eq!(first.await.unwrap(), OpenOutcome::Superseded);

    let state = fx.controller.state();
    let active = state.active().expect("fast book should be ready");
    assert_eq!(active.book.id, fast.book.id);
    assert_eq!(
        active.content,
        ContentDescriptor::InlineText {
            content: "fast text".to_string()
        }
    );
}

#[tokio::test]
async fn test_hung_open_stays_opening_until_closed() {
    let fx = Fixture::new();
    let entry = fx.add("Hanging Book", ContentResolution::url("https://hang"));
    fx.service.gate_book(entry.book.id);

    let pending = fx.spawn_open(&entry);
    wait_for_state(&fx.controller, |s| matches!(s, SessionState::Opening { .. })).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fx.controller.state().name(), "opening");

    fx.controller.close_session();
    fx.service.resolve_gate.notify_one();

    assert_eq!(pending.await.unwrap(), OpenOutcome::Superseded);
    assert_eq!(fx.controller.state(), SessionState::Idle);
}

// =============================================================================
// Failure States
// =============================================================================

#[tokio::test]
async fn test_unsupported_content_fails_open() {
    let fx = Fixture::new();
    let entry = fx.add("No Content", ContentResolution::error("no readable content"));

    let outcome = fx.controller.open_session(&entry).await;
    assert_eq!(outcome, OpenOutcome::Failed("unsupported format".to_string()));
    assert!(matches!(
        fx.controller.state(),
        SessionState::Failed { ref reason, .. } if reason == "unsupported format"
    ));
}

#[tokio::test]
async fn test_transport_failure_then_retry() {
    let fx = Fixture::new();
    let entry = fx.add("Flaky", ContentResolution::url("https://archive.org/embed/flaky"));

    fx.service.inner.set_offline(true);
    match fx.controller.open_session(&entry).await {
        OpenOutcome::Failed(reason) => assert!(reason.starts_with("transport error: ")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(fx.controller.state().name(), "failed");

    fx.service.inner.set_offline(false);
    assert_eq!(fx.controller.open_session(&entry).await, OpenOutcome::Ready);
}

// =============================================================================
// Saving
// =============================================================================

#[tokio::test]
async fn test_failed_save_stays_ready_with_local_value() {
    let fx = Fixture::new();
    let entry = fx.add("Save Me", ContentResolution::url("https://save"));
    fx.controller.open_session(&entry).await;
    fx.controller.update_progress(60).unwrap();

    fx.service.inner.set_reject_saves(true);
    let err = fx.controller.save_progress().await.unwrap_err();
    assert!(matches!(err, SessionError::Save(SaveError::Rejected(_))));
    assert_eq!(fx.controller.state().name(), "ready");
    assert_eq!(fx.controller.progress(), Some(Progress::clamped(60)));

    // A retry layered by the caller succeeds with the same value
    fx.service.inner.set_reject_saves(false);
    let ack = fx.controller.save_progress().await.unwrap();
    assert_eq!(ack.progress.value(), 60);
    assert_eq!(
        fx.service.inner.entry(fx.user, entry.book.id).unwrap().progress,
        Progress::clamped(60)
    );
}

#[tokio::test]
async fn test_saving_state_blocks_updates() {
    let fx = Fixture::new();
    let entry = fx.add("Slow Save", ContentResolution::url("https://slow-save"));
    fx.controller.open_session(&entry).await;
    fx.controller.update_progress(10).unwrap();
    fx.service.hold_saves.store(true, Ordering::SeqCst);

    let controller = fx.controller.clone();
    let save = tokio::spawn(async move { controller.save_progress().await });
    wait_for_state(&fx.controller, |s| matches!(s, SessionState::Saving(_))).await;

    let err = fx.controller.update_progress(90).unwrap_err();
    assert_eq!(
        err,
        SessionError::InvalidState {
            operation: "update progress",
            state: "saving"
        }
    );

    fx.service.save_gate.notify_one();
    assert!(save.await.unwrap().is_ok());
    assert_eq!(fx.controller.state().name(), "ready");
    assert_eq!(fx.controller.progress(), Some(Progress::clamped(10)));
}

// =============================================================================
// Continue Reading
// =============================================================================

#[tokio::test]
async fn test_opened_book_becomes_continue_reading() {
    let fx = Fixture::new();
    let first = fx.add("First", ContentResolution::url("https://first"));
    let second = fx.add("Second", ContentResolution::url("https://second"));

    fx.controller.open_session(&first).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    fx.controller.open_session(&second).await;

    let pick = fetch_continue_reading(fx.service.as_ref(), fx.user)
        .await
        .unwrap()
        .expect("library is not empty");
    assert_eq!(pick.book.id, second.book.id);

    assert!(fetch_continue_reading(fx.service.as_ref(), UserId::new())
        .await
        .unwrap()
        .is_none());
}
