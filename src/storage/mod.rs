//! Storage abstractions for persisted thumbnail records.
//!
//! The resolver only reads from the store. Writes arrive out of band
//! (the attach-thumbnail path) and must be visible to later reads.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! └── thumbnails.json       # id -> { url, attached_at }
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalThumbnailStore;
pub use memory::MemoryThumbnailStore;

/// A thumbnail attached to a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRecord {
    /// Cover image URL
    pub url: String,
    /// When the thumbnail was attached
    pub attached_at: DateTime<Utc>,
}

impl ThumbnailRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attached_at: Utc::now(),
        }
    }
}

/// Trait for thumbnail storage backends.
#[async_trait]
pub trait ThumbnailStore: Send + Sync {
    /// Look up the thumbnail recorded for a book.
    ///
    /// Returns `Ok(None)` when nothing is recorded.
    async fn get_thumbnail(&self, book_id: &str) -> Result<Option<String>>;

    /// Record (or replace) the thumbnail for a book.
    async fn attach_thumbnail(&self, book_id: &str, url: &str) -> Result<()>;
}
