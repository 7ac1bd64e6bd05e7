// src/services/thumbnails.rs

//! Cover image resolution.
//!
//! Tiers, first success wins:
//! 1. a thumbnail recorded in the store for the book ID
//! 2. a cover URL derived from the volume ID, when upstream declared an image
//! 3. no cover
//!
//! Resolution never fails a request. Store errors and timeouts are tier misses.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::models::{Book, ThumbnailConfig};
use crate::services::normalize::Draft;
use crate::storage::ThumbnailStore;

/// Resolves cover URLs for normalized drafts.
pub struct ThumbnailResolver {
    store: Arc<dyn ThumbnailStore>,
    lookup_timeout: Duration,
    max_concurrent: usize,
    cover_template: String,
}

impl ThumbnailResolver {
    pub fn new(store: Arc<dyn ThumbnailStore>, config: &ThumbnailConfig) -> Self {
        Self {
            store,
            lookup_timeout: config.lookup_timeout(),
            max_concurrent: config.max_concurrent.max(1),
            cover_template: config.cover_template.clone(),
        }
    }

    /// Resolve the cover for one draft.
    pub async fn resolve(&self, draft: &Draft) -> Option<String> {
        if let Some(url) = self.stored(&draft.book.id).await {
            return Some(url);
        }
        if draft.has_image {
            return Some(self.derived(&draft.volume_id));
        }
        log::debug!("No thumbnail available for book {}", draft.book.id);
        None
    }

    /// Resolve covers for a batch, preserving order.
    pub async fn resolve_all(&self, drafts: Vec<Draft>) -> Vec<Book> {
        stream::iter(drafts)
            .map(|draft| async move {
                let cover = self.resolve(&draft).await;
                Book {
                    cover,
                    ..draft.book
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    /// Cover URL templated from a volume ID.
    pub fn derived(&self, volume_id: &str) -> String {
        self.cover_template.replace("{id}", volume_id)
    }

    async fn stored(&self, book_id: &str) -> Option<String> {
        match tokio::time::timeout(self.lookup_timeout, self.store.get_thumbnail(book_id)).await {
            Ok(Ok(Some(url))) if !url.trim().is_empty() => Some(url),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                log::warn!("Thumbnail lookup failed for {}: {}", book_id, e);
                None
            }
            Err(_) => {
                log::warn!(
                    "Thumbnail lookup for {} timed out after {:?}",
                    book_id,
                    self.lookup_timeout
                );
                None
            }
        }
    }
}
