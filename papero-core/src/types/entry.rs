//! Per-user library state: normalized progress and access tracking

use super::Book;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reading progress as a whole percentage
///
/// The only way to build one is through [`Progress::clamped`], so a value
/// outside `0..=100` cannot exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const MIN: Progress = Progress(0);
    pub const MAX: Progress = Progress(100);

    /// Clamp an arbitrary input into `0..=100`
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_finished(self) -> bool {
        self == Self::MAX
    }
}

impl From<Option<i64>> for Progress {
    fn from(value: Option<i64>) -> Self {
        value.map(Self::clamped).unwrap_or_default()
    }
}

impl From<Progress> for u8 {
    fn from(progress: Progress) -> Self {
        progress.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A book the user owns, plus their personal reading state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryEntry {
    /// The acquired book
    pub book: Book,

    /// Normalized progress, 0 until the reader saves a position
    #[serde(default)]
    pub progress: Progress,

    /// Last time the book was opened, `None` until first open
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,

    /// When the book entered the library
    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl LibraryEntry {
    /// A freshly acquired entry: no progress, never opened
    pub fn new(book: Book) -> Self {
        Self {
            book,
            progress: Progress::MIN,
            last_accessed_at: None,
            acquired_at: None,
        }
    }

    pub fn with_progress(mut self, progress: i64) -> Self {
        self.progress = Progress::clamped(progress);
        self
    }

    pub fn with_last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed_at = Some(at);
        self
    }

    pub fn with_acquired(mut self, at: DateTime<Utc>) -> Self {
        self.acquired_at = Some(at);
        self
    }

    /// Record an access, never moving the timestamp backwards
    pub fn record_access(&mut self, at: DateTime<Utc>) -> DateTime<Utc> {
        let stamp = match self.last_accessed_at {
            Some(previous) if previous >= at => previous,
            _ => at,
        };
        self.last_accessed_at = Some(stamp);
        stamp
    }
}
