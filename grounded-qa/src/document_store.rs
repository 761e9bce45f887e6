//! In-memory holder of the single reference document.
//!
//! One store is shared by every request that holds a clone of its `Arc`.
//! Writes replace the whole text; the last writer wins and nothing is kept
//! from previous versions.

use std::sync::{PoisonError, RwLock};

use tracing::debug;

/// Returns true when `text` counts as a loaded document.
///
/// Whitespace-only text is indistinguishable from "no document".
pub fn is_present(text: &str) -> bool {
    !text.trim().is_empty()
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    content: RwLock<String>,
}

impl DocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored document and returns its length in characters.
    ///
    /// Any string is accepted, including `""`, which clears the store.
    pub fn set_document(&self, text: impl Into<String>) -> usize {
        let text = text.into();
        let len = text.chars().count();
        *self.content.write().unwrap_or_else(PoisonError::into_inner) = text;
        debug!(text_len = len, "document replaced");
        len
    }

    /// Returns a copy of the current document, `""` when none was set.
    pub fn get_document(&self) -> String {
        self.content
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Same as `set_document("")`.
    pub fn clear_document(&self) {
        self.set_document(String::new());
    }

    pub fn has_document(&self) -> bool {
        is_present(&self.content.read().unwrap_or_else(PoisonError::into_inner))
    }
}
