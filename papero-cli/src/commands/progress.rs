//! Progress command implementation

use anyhow::{Context, Result};
use papero_core::{BookId, ProgressStore, ReadingService, UserId};
use std::sync::Arc;

/// Clamp and persist a progress value
pub async fn progress(
    service: Arc<dyn ReadingService>,
    user: UserId,
    book: BookId,
    value: i64,
) -> Result<()> {
    let store = ProgressStore::new(service);
    let ack = store
        .save(user, book, value)
        .await
        .with_context(|| format!("Failed to save progress for {}", book))?;

    println!("Saved progress {} for {}", ack.progress, book);
    Ok(())
}
