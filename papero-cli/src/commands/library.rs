//! Library command implementation

use anyhow::{Context, Result};
use papero_core::{ReadingService, UserId};
use std::sync::Arc;

/// List the books in a user's library, most recent first
pub async fn library(service: Arc<dyn ReadingService>, user: UserId, json: bool) -> Result<()> {
    let entries = service
        .fetch_library(user)
        .await
        .context("Failed to fetch library")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Your library is empty.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", super::summary(entry));
    }
    Ok(())
}
