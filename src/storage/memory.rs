//! In-memory thumbnail store for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::storage::ThumbnailStore;

/// Thumbnail store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryThumbnailStore {
    records: RwLock<HashMap<String, String>>,
    lookups: AtomicUsize,
    fail_reads: bool,
}

impl MemoryThumbnailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(id, url)` pairs.
    pub fn with_records<I, K, V>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// Create a store whose reads always fail.
    pub fn failing() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Number of `get_thumbnail` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailStore for MemoryThumbnailStore {
    async fn get_thumbnail(&self, book_id: &str) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(AppError::store("memory store configured to fail"));
        }
        let records = self
            .records
            .read()
            .map_err(|_| AppError::store("thumbnail map poisoned"))?;
        Ok(records.get(book_id).cloned())
    }

    async fn attach_thumbnail(&self, book_id: &str, url: &str) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| AppError::store("thumbnail map poisoned"))?;
        records.insert(book_id.to_string(), url.to_string());
        Ok(())
    }
}
