//! Application state

use anyhow::Result;
use chrono::{DateTime, Utc};
use papero_core::sort_by_recency;
use papero_core::types::{Book, BookId, ContentResolution, LibraryEntry, Progress, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Base path for storage
    pub storage_path: PathBuf,

    /// In-memory catalogue and ownership index (would be a database in production)
    pub library: Arc<RwLock<Library>>,

    /// Channel for SSE events
    pub event_tx: broadcast::Sender<ServerEvent>,

    /// Serializes index writes so each snapshot lands whole and in order
    persist_lock: Arc<Mutex<()>>,
}

/// How a catalogue book can be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentSource {
    /// Internet Archive item, read through the archive's embeddable viewer
    Archive { ia_id: String },

    /// Plain extracted text
    Text { content: String },
}

impl ContentSource {
    pub fn resolution(&self) -> ContentResolution {
        match self {
            Self::Archive { ia_id } => ContentResolution::url(format!(
                "https://archive.org/embed/{}?ui=embed&wrapper=false",
                ia_id
            )),
            Self::Text { content } => ContentResolution::content(content.clone()),
        }
    }
}

/// A catalogue book and its content source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogBook {
    #[serde(flatten)]
    pub book: Book,

    #[serde(default)]
    pub source: Option<ContentSource>,
}

/// A user's ownership of a book plus their reading state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub user_id: UserId,
    pub book_id: BookId,

    #[serde(default)]
    pub progress: Progress,

    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,

    pub acquired_at: DateTime<Utc>,
}

/// Why a library operation could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryError {
    UnknownBook,
    NotOwned,
    AlreadyOwned,
}

impl LibraryError {
    pub fn message(self) -> &'static str {
        match self {
            Self::UnknownBook => "Book not found",
            Self::NotOwned => "Book not in library",
            Self::AlreadyOwned => "Book already owned",
        }
    }
}

/// Catalogue and ownership index
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Library {
    pub books: HashMap<BookId, CatalogBook>,

    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

impl Library {
    /// Load library from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        // Read file directly, handle NotFound as empty library
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Save library to a JSON file atomically
    pub async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomic(path.to_path_buf(), data).await
    }

    pub fn add_book(&mut self, book: Book, source: Option<ContentSource>) {
        self.books.insert(book.id, CatalogBook { book, source });
    }

    fn purchase_mut(&mut self, user_id: UserId, book_id: BookId) -> Result<&mut Purchase, LibraryError> {
        self.purchases
            .iter_mut()
            .find(|p| p.user_id == user_id && p.book_id == book_id)
            .ok_or(LibraryError::NotOwned)
    }

    fn entry(&self, purchase: &Purchase) -> Option<LibraryEntry> {
        let catalog = self.books.get(&purchase.book_id)?;
        Some(LibraryEntry {
            book: catalog.book.clone(),
            progress: purchase.progress,
            last_accessed_at: purchase.last_accessed_at,
            acquired_at: Some(purchase.acquired_at),
        })
    }

    /// The user's library, recency-descending
    pub fn entries_for(&self, user_id: UserId) -> Vec<LibraryEntry> {
        let mut entries: Vec<LibraryEntry> = self
            .purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| self.entry(p))
            .collect();
        sort_by_recency(&mut entries);
        entries
    }

    /// Add a catalogue book to a user's library
    pub fn acquire(
        &mut self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> Result<LibraryEntry, LibraryError> {
        if !self.books.contains_key(&book_id) {
            return Err(LibraryError::UnknownBook);
        }
        if self.purchase_mut(user_id, book_id).is_ok() {
            return Err(LibraryError::AlreadyOwned);
        }

        let purchase = Purchase {
            user_id,
            book_id,
            progress: Progress::MIN,
            last_accessed_at: None,
            acquired_at: now,
        };
        let entry = self.entry(&purchase).ok_or(LibraryError::UnknownBook)?;
        self.purchases.push(purchase);
        Ok(entry)
    }

    pub fn set_progress(
        &mut self,
        user_id: UserId,
        book_id: BookId,
        progress: Progress,
    ) -> Result<Progress, LibraryError> {
        let purchase = self.purchase_mut(user_id, book_id)?;
        purchase.progress = progress;
        Ok(progress)
    }

    /// Bump last-accessed; the stored stamp never moves backwards
    pub fn touch(
        &mut self,
        user_id: UserId,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, LibraryError> {
        let purchase = self.purchase_mut(user_id, book_id)?;
        let stamp = match purchase.last_accessed_at {
            Some(previous) if previous >= now => previous,
            _ => now,
        };
        purchase.last_accessed_at = Some(stamp);
        Ok(stamp)
    }

    /// How a book resolves, `None` for an unknown book
    pub fn resolve(&self, book_id: BookId) -> Option<ContentResolution> {
        let catalog = self.books.get(&book_id)?;
        Some(match &catalog.source {
            Some(source) => source.resolution(),
            None => ContentResolution::error("no readable content"),
        })
    }

    /// Catalogue listing sorted by title
    pub fn catalogue(&self) -> Vec<Book> {
        let mut books: Vec<Book> = self.books.values().map(|c| c.book.clone()).collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        books
    }
}

/// Write through a uniquely named temp file in the target directory, then rename
async fn write_atomic(path: PathBuf, data: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;
        file.persist(&path)?;
        Ok(())
    })
    .await??;
    Ok(())
}

/// Server-sent events
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A book entered a user's library
    BookAcquired { user_id: UserId, book_id: BookId },

    /// A user opened a book
    BookOpened { user_id: UserId, book_id: BookId },

    /// A progress value was persisted
    ProgressSaved {
        user_id: UserId,
        book_id: BookId,
        progress: Progress,
    },
}

impl AppState {
    /// Create new application state
    pub async fn new() -> Result<Self> {
        let storage_path =
            std::env::var("PAPERO_STORAGE_PATH").unwrap_or_else(|_| "./papero_data".to_string());
        let storage_path = PathBuf::from(storage_path);

        tokio::fs::create_dir_all(&storage_path).await?;

        let library_path = storage_path.join("library.json");
        let library = match Library::load(&library_path).await {
            Ok(lib) => lib,
            Err(e) => {
                tracing::warn!("Failed to load library index, starting fresh: {}", e);
                Library::default()
            }
        };

        Ok(Self::with_library(storage_path, library))
    }

    /// State over an already loaded library
    pub fn with_library(storage_path: PathBuf, library: Library) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            storage_path,
            library: Arc::new(RwLock::new(library)),
            event_tx,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get path to library index file
    pub fn library_path(&self) -> PathBuf {
        self.storage_path.join("library.json")
    }

    /// Save the library index
    ///
    /// The snapshot is taken after the persist lock is held, so the last
    /// writer always stores the newest state.
    pub async fn save_library(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        let data = {
            let library = self.library.read().await;
            serde_json::to_vec_pretty(&*library)?
        };
        write_atomic(self.library_path(), data).await
    }

    /// Subscribe to server events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast an event
    pub fn broadcast(&self, event: ServerEvent) {
        // Ignore errors (no subscribers)
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn library_with_book(source: Option<ContentSource>) -> (Library, BookId) {
        let mut library = Library::default();
        let book = Book::new("The Time Machine", "H. G. Wells");
        let id = book.id;
        library.add_book(book, source);
        (library, id)
    }

    #[test]
    fn test_archive_source_resolves_to_embed_url() {
        let (library, id) = library_with_book(Some(ContentSource::Archive {
            ia_id: "timemachine00well".to_string(),
        }));
        let resolution = library.resolve(id).unwrap();
        assert_eq!(
            resolution.url.as_deref(),
            Some("https://archive.org/embed/timemachine00well?ui=embed&wrapper=false")
        );
        assert!(library.resolve(BookId::new()).is_none());
    }

    #[test]
    fn test_missing_source_resolves_to_error() {
        let (library, id) = library_with_book(None);
        assert_eq!(
            library.resolve(id).unwrap().error.as_deref(),
            Some("no readable content")
        );
    }

    #[test]
    fn test_acquire_rules() {
        let (mut library, id) = library_with_book(None);
        let user = UserId::new();
        let now = Utc::now();

        let entry = library.acquire(user, id, now).unwrap();
        assert_eq!(entry.acquired_at, Some(now));
        assert_eq!(library.acquire(user, id, now), Err(LibraryError::AlreadyOwned));
        assert_eq!(
            library.acquire(user, BookId::new(), now),
            Err(LibraryError::UnknownBook)
        );
    }

    #[test]
    fn test_touch_is_monotonic() {
        let (mut library, id) = library_with_book(None);
        let user = UserId::new();
        let now = Utc::now();
        library.acquire(user, id, now).unwrap();

        assert_eq!(library.touch(user, id, now).unwrap(), now);
        assert_eq!(library.touch(user, id, now - Duration::hours(2)).unwrap(), now);
        assert_eq!(
            library.touch(UserId::new(), id, now),
            Err(LibraryError::NotOwned)
        );
    }

    #[tokio::test]
    async fn test_library_persistence_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        let (mut library, id) = library_with_book(Some(ContentSource::Text {
            content: "The Time Traveller...".to_string(),
        }));
        let user = UserId::new();
        library.acquire(user, id, Utc::now()).unwrap();
        library.set_progress(user, id, Progress::clamped(12)).unwrap();
        library.save(&path).await.unwrap();

        let loaded = Library::load(&path).await.unwrap();
        let entries = loaded.entries_for(user);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].progress.value(), 12);
        assert!(loaded.resolve(id).unwrap().content.is_some());

        let missing = Library::load(&dir.path().join("absent.json")).await.unwrap();
        assert!(missing.books.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_index_saves_all_succeed() {
        let dir = tempfile::TempDir::new().unwrap();
        let (library, id) = library_with_book(None);
        let state = AppState::with_library(dir.path().to_path_buf(), library);
        let user = UserId::new();
        state.library.write().await.acquire(user, id, Utc::now()).unwrap();

        let saves = (0..32).map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .library
                    .write()
                    .await
                    .set_progress(user, id, Progress::clamped(i))
                    .unwrap();
                state.save_library().await
            })
        });
        for result in futures::future::join_all(saves).await {
            result.unwrap().unwrap();
        }

        let on_disk = Library::load(&state.library_path()).await.unwrap();
        assert_eq!(
            on_disk.entries_for(user)[0].progress,
            state.library.read().await.entries_for(user)[0].progress
        );
        // Only the index itself remains; no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
