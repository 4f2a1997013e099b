//! "Continue reading" selection

use crate::error::ServiceError;
use crate::service::ReadingService;
use crate::types::{LibraryEntry, UserId};
use std::cmp::Ordering;

/// Pick the single entry to offer as "Continue Reading"
///
/// The latest `last_accessed_at` wins; equal timestamps go to the entry that
/// appears first. If nothing has ever been opened the first entry of the
/// listing wins, since the service already orders it by recency. Progress is
/// never consulted. Returns `None` only for an empty listing.
pub fn pick_continue_reading(entries: &[LibraryEntry]) -> Option<&LibraryEntry> {
    let mut best: Option<&LibraryEntry> = None;

    for entry in entries {
        let Some(accessed) = entry.last_accessed_at else {
            continue;
        };
        match best.and_then(|b| b.last_accessed_at) {
            Some(current) if current >= accessed => {}
            _ => best = Some(entry),
        }
    }

    best.or_else(|| entries.first())
}

/// Order a listing the way the library service returns it
///
/// Opened entries come first, newest access first; never-opened entries
/// follow, newest acquisition first. The sort is stable.
pub fn sort_by_recency(entries: &mut [LibraryEntry]) {
    entries.sort_by(|a, b| match (a.last_accessed_at, b.last_accessed_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.acquired_at.cmp(&a.acquired_at),
    });
}

/// Fetch the user's library and pick the entry to continue
pub async fn fetch_continue_reading(
    service: &dyn ReadingService,
    user_id: UserId,
) -> Result<Option<LibraryEntry>, ServiceError> {
    let entries = service.fetch_library(user_id).await?;
    Ok(pick_continue_reading(&entries).cloned())
}
