//! Catalogue book and the identifier newtypes shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a catalogue book
    BookId
);

uuid_newtype!(
    /// Identifier of a reader, supplied by the caller's auth context
    UserId
);

/// A catalogue book
///
/// Owned by the catalogue/library service and only referenced here, so the
/// engine never mutates one after it has been fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Unique identifier for this book
    pub id: BookId,

    /// Book title
    pub title: String,

    /// Primary author
    pub author: String,

    /// Cover image reference
    #[serde(default)]
    pub cover_url: Option<String>,

    /// Price as a decimal string ("4.99")
    #[serde(default)]
    pub price: String,
}

impl Book {
    /// Create a book with a fresh identifier
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            author: author.into(),
            cover_url: None,
            price: "0.00".to_string(),
        }
    }

    /// Set the cover image reference
    pub fn with_cover(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    /// Set the price
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }
}
