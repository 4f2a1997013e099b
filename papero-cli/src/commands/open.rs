//! Open command implementation

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use papero_core::{
    BookId, ContentDescriptor, OpenOutcome, ReadingService, ReadingSessionController, UserId,
};
use std::sync::Arc;
use std::time::Duration;

/// Longest inline text excerpt printed to the terminal
const EXCERPT_CHARS: usize = 500;

/// Open a library book and print how it must be rendered
pub async fn open(
    service: Arc<dyn ReadingService>,
    user: UserId,
    book: BookId,
    json: bool,
) -> Result<()> {
    let entries = service
        .fetch_library(user)
        .await
        .context("Failed to fetch library")?;
    let entry = entries
        .into_iter()
        .find(|e| e.book.id == book)
        .with_context(|| format!("Book {} is not in your library", book))?;

    let controller = ReadingSessionController::new(service, user);

    // The spinner stays up for as long as the session is opening
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Opening {}...", entry.book.title));

    let mut states = controller.subscribe();
    let watcher = {
        let spinner = spinner.clone();
        tokio::spawn(async move {
            while states.changed().await.is_ok() {
                let message = {
                    let state = states.borrow_and_update();
                    match state.book() {
                        Some(book) => format!("{} ({})", book.title, state.name()),
                        None => state.name().to_string(),
                    }
                };
                spinner.set_message(message);
            }
        })
    };

    let outcome = controller.open_session(&entry).await;
    watcher.abort();
    spinner.finish_and_clear();

    if let OpenOutcome::Failed(reason) = outcome {
        bail!("Could not open {}: {}", entry.book.title, reason);
    }

    let state = controller.state();
    let active = state
        .active()
        .context("Session closed before it finished opening")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&active.content)?);
        return Ok(());
    }

    println!("Title:    {}", active.book.title);
    println!("Author:   {}", active.book.author);
    println!("Progress: {}", active.progress);
    match &active.content {
        ContentDescriptor::EmbeddableViewer { url } => println!("Viewer:   {}", url),
        ContentDescriptor::InlineText { content } => {
            let excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
            println!();
            println!("{}", excerpt);
            if content.chars().count() > EXCERPT_CHARS {
                println!("...");
            }
        }
        ContentDescriptor::Unavailable { reason } => println!("Unavailable: {}", reason),
    }

    Ok(())
}
