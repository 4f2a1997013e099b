//! Papero Core Library
//!
//! The reading session engine behind the Papero e-reading client: it resolves
//! a library entry into renderable content, tracks and persists normalized
//! reading progress, and picks the book to offer as "continue reading".
//! All remote traffic goes through the [`service::ReadingService`] trait.

pub mod config;
pub mod error;
pub mod progress;
pub mod ranker;
pub mod resolver;
pub mod service;
pub mod session;
pub mod types;

pub use config::ClientConfig;
pub use error::{PaperoError, Result, SaveError, ServiceError, SessionError};
pub use progress::ProgressStore;
pub use ranker::{fetch_continue_reading, pick_continue_reading, sort_by_recency};
pub use resolver::ContentSourceResolver;
pub use service::{HttpReadingService, MemoryReadingService, ReadingService};
pub use session::{ActiveSession, OpenOutcome, ReadingSessionController, SessionState};
pub use types::{
    AccessStamp, Ack, Book, BookId, ContentDescriptor, ContentResolution, EntryRef, LibraryEntry,
    Progress, ProgressUpdate, UserId,
};
