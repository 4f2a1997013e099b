//! Core types for the reading session engine

mod book;
mod content;
mod entry;
mod protocol;

pub use book::{Book, BookId, UserId};
pub use content::{ContentDescriptor, ContentResolution, UNSUPPORTED_FORMAT};
pub use entry::{LibraryEntry, Progress};
pub use protocol::{AccessStamp, Ack, EntryRef, ErrorBody, ProgressUpdate};
