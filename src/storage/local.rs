//! Local filesystem thumbnail store.
//!
//! Records live in a single `thumbnails.json` under the root directory.
//! Every lookup re-reads the file, so thumbnails attached by another
//! process are picked up on the next read.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::{ThumbnailRecord, ThumbnailStore};

const THUMBNAILS_FILE: &str = "thumbnails.json";

type Records = BTreeMap<String, ThumbnailRecord>;

/// Local filesystem storage backend.
pub struct LocalThumbnailStore {
    root_dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl LocalThumbnailStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path(&self) -> PathBuf {
        self.root_dir.join(THUMBNAILS_FILE)
    }

    /// Read all records, returning an empty map if the file doesn't exist.
    async fn read_records(&self) -> Result<Records> {
        match tokio::fs::read(self.path()).await {
            Ok(bytes) if bytes.is_empty() => Ok(Records::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write all records atomically (write to temp, then rename).
    async fn write_records(&self, records: &Records) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let path = self.path();
        let tmp = path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(records)?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Load the full record for a book, including its attach time.
    pub async fn record(&self, book_id: &str) -> Result<Option<ThumbnailRecord>> {
        Ok(self.read_records().await?.remove(book_id))
    }

    /// Number of stored thumbnails.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.read_records().await?.len())
    }
}

#[async_trait]
impl ThumbnailStore for LocalThumbnailStore {
    async fn get_thumbnail(&self, book_id: &str) -> Result<Option<String>> {
        Ok(self
            .record(book_id)
            .await?
            .map(|r| r.url)
            .filter(|url| !url.is_empty()))
    }

    async fn attach_thumbnail(&self, book_id: &str, url: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_records().await?;
        records.insert(book_id.to_string(), ThumbnailRecord::new(url));
        self.write_records(&records).await?;

        log::info!("Thumbnail attached for book {}", book_id);
        Ok(())
    }
}
