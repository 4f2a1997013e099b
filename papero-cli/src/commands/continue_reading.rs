//! Continue command implementation

use anyhow::{Context, Result};
use papero_core::{fetch_continue_reading, ReadingService, UserId};
use std::sync::Arc;

/// Show the book the reader should resume
pub async fn continue_reading(
    service: Arc<dyn ReadingService>,
    user: UserId,
    json: bool,
) -> Result<()> {
    let pick = fetch_continue_reading(service.as_ref(), user)
        .await
        .context("Failed to fetch library")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pick)?);
        return Ok(());
    }

    match pick {
        Some(entry) => {
            println!("Continue reading: {}", entry.book.title);
            println!("Author:           {}", entry.book.author);
            println!("Progress:         {}", entry.progress);
            println!("Book ID:          {}", entry.book.id);
        }
        None => println!("No books in progress. Visit the store!"),
    }
    Ok(())
}
