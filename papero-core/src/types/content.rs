//! How a book's content must be rendered

use serde::{Deserialize, Serialize};

/// Reason reported when the remote service affirmatively has no renderable form
pub const UNSUPPORTED_FORMAT: &str = "unsupported format";

/// Tagged description of a book's renderable content
///
/// Produced fresh for every session open and never persisted. Renderers
/// dispatch on the variant, never on which fields happen to be present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDescriptor {
    /// An external viewer embedded by URL (iframe-style)
    EmbeddableViewer { url: String },

    /// Raw text rendered in place
    InlineText { content: String },

    /// Nothing can be rendered
    Unavailable { reason: String },
}

impl ContentDescriptor {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Transport failure, e.g. `transport error: connection refused`
    pub fn transport_error(detail: impl std::fmt::Display) -> Self {
        Self::unavailable(format!("transport error: {}", detail))
    }

    pub fn unsupported() -> Self {
        Self::unavailable(UNSUPPORTED_FORMAT)
    }

    /// The failure reason, if any
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Unavailable { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Wire body of `GET /content-resolution`
///
/// Exactly one of the fields is expected to be set. Empty strings count as
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentResolution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResolution {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

impl From<ContentResolution> for ContentDescriptor {
    fn from(resolution: ContentResolution) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

        if let Some(url) = non_empty(resolution.url) {
            return Self::EmbeddableViewer { url };
        }
        if let Some(content) = non_empty(resolution.content) {
            return Self::InlineText { content };
        }
        Self::unsupported()
    }
}
