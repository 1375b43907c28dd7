//! Short link entity mapping an alias to its original URL.

use serde::Serialize;

/// A committed alias → URL mapping.
///
/// Immutable once stored; the alias is the primary key in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortLink {
    pub alias: String,
    pub original: String,
}

impl ShortLink {
    pub fn new(alias: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            original: original.into(),
        }
    }
}

/// Input data for allocating a new short link.
///
/// When `alias` is `None` (or an empty string) the allocator synthesizes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortLink {
    pub alias: Option<String>,
    pub original: String,
}

impl NewShortLink {
    /// Request with an alias chosen by the allocator.
    pub fn generated(original: impl Into<String>) -> Self {
        Self {
            alias: None,
            original: original.into(),
        }
    }

    /// Request for a caller-chosen alias.
    pub fn with_alias(alias: impl Into<String>, original: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            original: original.into(),
        }
    }

    /// The caller-supplied alias, treating an empty string as absent.
    pub fn requested_alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|a| !a.is_empty())
    }
}
