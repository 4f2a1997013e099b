//! CLI command implementations

mod continue_reading;
mod library;
mod open;
mod progress;

pub use continue_reading::continue_reading;
pub use library::library;
pub use open::open;
pub use progress::progress;

use anyhow::{Context, Result};
use papero_core::{ClientConfig, HttpReadingService, LibraryEntry};
use std::sync::Arc;

/// Build the HTTP service from the environment, honoring `--api-url`
pub fn connect(api_url: Option<&str>) -> Result<Arc<HttpReadingService>> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    tracing::debug!(base_url = %config.base_url, "connecting to library service");

    let service = HttpReadingService::new(&config).context("Failed to build HTTP client")?;
    Ok(Arc::new(service))
}

/// One-line summary of an entry
pub(crate) fn summary(entry: &LibraryEntry) -> String {
    let opened = entry
        .last_accessed_at
        .map(|at| format!("opened {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_else(|| "never opened".to_string());
    format!(
        "{}  {} by {}  [{}, {}]",
        entry.book.id, entry.book.title, entry.book.author, entry.progress, opened
    )
}
