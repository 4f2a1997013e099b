//! Reading session controller: the state machine a reader view binds to
//!
//! ```text
//! Idle ──open──▶ Opening ──▶ Ready ──save──▶ Saving ──▶ Ready
//!   ▲               │
//!   └──close──      └──────▶ Failed
//! ```
//!
//! Every `open_session` bumps a generation counter. A completion is applied
//! only if the counter still holds the value captured when that open started,
//! so a superseded open can never overwrite a newer one.

use crate::error::SessionError;
use crate::progress::ProgressStore;
use crate::resolver::ContentSourceResolver;
use crate::service::ReadingService;
use crate::types::{Ack, Book, BookId, ContentDescriptor, LibraryEntry, Progress, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A successfully opened book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub book: Book,
    pub content: ContentDescriptor,
    pub progress: Progress,
}

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,

    /// Waiting on the content service; persists while a call hangs
    Opening { book: Book },

    Ready(ActiveSession),

    /// A save is in flight; returns to `Ready` whatever the outcome
    Saving(ActiveSession),

    /// The open failed; re-open to retry
    Failed { book: Book, reason: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Opening { .. } => "opening",
            Self::Ready(_) => "ready",
            Self::Saving(_) => "saving",
            Self::Failed { .. } => "failed",
        }
    }

    /// The open book, if any
    pub fn book(&self) -> Option<&Book> {
        match self {
            Self::Idle => None,
            Self::Opening { book } | Self::Failed { book, .. } => Some(book),
            Self::Ready(active) | Self::Saving(active) => Some(&active.book),
        }
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            Self::Ready(active) | Self::Saving(active) => Some(active),
            _ => None,
        }
    }
}

/// How a particular `open_session` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Ready,
    Failed(String),

    /// A later open or a close overtook this one; its result was dropped
    Superseded,
}

/// Orchestrates one book-reading session for one user
///
/// Each open book gets its own controller; controllers share nothing. All
/// methods take `&self` so a view can issue a new open while an older one is
/// still awaiting the service.
pub struct ReadingSessionController {
    user_id: UserId,
    resolver: ContentSourceResolver,
    progress: ProgressStore,
    generation: AtomicU64,
    state: watch::Sender<SessionState>,
}

impl ReadingSessionController {
    pub fn new(service: Arc<dyn ReadingService>, user_id: UserId) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            user_id,
            resolver: ContentSourceResolver::new(service.clone()),
            progress: ProgressStore::new(service),
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Stream of state changes for a view to render
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current progress of the open book
    pub fn progress(&self) -> Option<Progress> {
        self.state.borrow().active().map(|active| active.progress)
    }

    /// Apply `next` only if no open or close has happened since `generation`
    fn apply(&self, generation: u64, next: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Open a library entry, superseding any open still in flight
    ///
    /// Bumps last-accessed explicitly, then resolves content without a user
    /// id so the bump happens exactly once. If the service refuses the bump
    /// (the user does not own the book) the open fails; an unreachable service
    /// is only logged.
    pub async fn open_session(&self, entry: &LibraryEntry) -> OpenOutcome {
        let book = entry.book.clone();
        let book_id = book.id;

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = SessionState::Opening { book: book.clone() };
        });
        tracing::debug!(%book_id, generation, "opening session");

        self.progress.seed(self.user_id, book_id, entry.progress);
        if let Err(err) = self.progress.touch_accessed(self.user_id, book_id).await {
            match err.refusal() {
                Some(reason) => {
                    let reason = reason.to_string();
                    let next = SessionState::Failed {
                        book,
                        reason: reason.clone(),
                    };
                    let outcome = OpenOutcome::Failed(reason);
                    return self.finish_open(generation, book_id, next, outcome);
                }
                None => tracing::warn!(%book_id, "failed to record access: {}", err),
            }
        }

        let content = self.resolver.resolve(book_id, None).await;

        let (next, outcome) = match content {
            ContentDescriptor::Unavailable { reason } => (
                SessionState::Failed {
                    book,
                    reason: reason.clone(),
                },
                OpenOutcome::Failed(reason),
            ),
            content => (
                SessionState::Ready(ActiveSession {
                    book,
                    content,
                    progress: self.progress.get(self.user_id, book_id),
                }),
                OpenOutcome::Ready,
            ),
        };

        self.finish_open(generation, book_id, next, outcome)
    }

    fn finish_open(
        &self,
        generation: u64,
        book_id: BookId,
        next: SessionState,
        outcome: OpenOutcome,
    ) -> OpenOutcome {
        if self.apply(generation, next) {
            tracing::debug!(%book_id, generation, ?outcome, "session opened");
            outcome
        } else {
            tracing::debug!(%book_id, generation, "discarding superseded open");
            OpenOutcome::Superseded
        }
    }

    /// Change progress locally; only valid in `Ready`
    pub fn update_progress(&self, value: i64) -> Result<Progress, SessionError> {
        let mut result = Err(SessionError::InvalidState {
            operation: "update progress",
            state: "idle",
        });

        self.state.send_if_modified(|state| match state {
            SessionState::Ready(active) => {
                let progress = self.progress.set(self.user_id, active.book.id, value);
                let changed = active.progress != progress;
                active.progress = progress;
                result = Ok(progress);
                changed
            }
            other => {
                result = Err(SessionError::InvalidState {
                    operation: "update progress",
                    state: other.name(),
                });
                false
            }
        });

        result
    }

    /// Flush the current progress; only valid in `Ready`
    ///
    /// The controller is back in `Ready` when this returns, with the local
    /// value intact even if the save failed. Callers wanting retries can
    /// simply call this again.
    pub async fn save_progress(&self) -> Result<Ack, SessionError> {
        let mut target: Result<(u64, BookId, Progress), &'static str> = Err("idle");

        self.state.send_if_modified(|state| match state {
            SessionState::Ready(active) => {
                let active = active.clone();
                target = Ok((
                    self.generation.load(Ordering::SeqCst),
                    active.book.id,
                    active.progress,
                ));
                *state = SessionState::Saving(active);
                true
            }
            other => {
                target = Err(other.name());
                false
            }
        });

        let (generation, book_id, progress) =
            target.map_err(|state| SessionError::InvalidState {
                operation: "save progress",
                state,
            })?;

        let outcome = self
            .progress
            .save(self.user_id, book_id, progress.value().into())
            .await;

        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match state {
                SessionState::Saving(active) => {
                    *state = SessionState::Ready(active.clone());
                    true
                }
                _ => false,
            }
        });

        Ok(outcome?)
    }

    /// Return to `Idle` without saving; in-flight opens are discarded
    pub fn close_session(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = SessionState::Idle;
        });
        tracing::debug!("session closed");
    }
}
