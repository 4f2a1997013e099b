//! Request and acknowledgement bodies exchanged with the library service

use super::{BookId, Progress, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /progress`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub user_id: UserId,
    pub book_id: BookId,
    pub progress: Progress,
}

/// Acknowledgement of a persisted progress value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,

    /// The value the service stored
    pub progress: Progress,
}

/// Body of `POST /accessed` and `POST /library`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryRef {
    pub user_id: UserId,
    pub book_id: BookId,
}

/// Response of `POST /accessed`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessStamp {
    pub last_accessed_at: DateTime<Utc>,
}

/// Error body returned by the service on non-success statuses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
