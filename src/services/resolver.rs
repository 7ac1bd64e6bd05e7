// src/services/resolver.rs

//! Search resolution orchestrator.
//!
//! Per request:
//!
//! ```text
//! CheckCache ─ hit ──────────────────────────────────────────────▶ return
//!     │
//!    miss ─▶ BuildQuery ─▶ CallUpstream ─▶ Normalize ─▶ ResolveThumbnails
//!                                                         │
//!                                          PopulateCache ◀┘ ─▶ return
//! ```
//!
//! Empty pages and confirmed "no results" answers are cached until the TTL
//! runs out. Upstream and parse failures are never cached. A page is not
//! cached if a thumbnail was attached while it was being resolved.

use std::sync::Arc;

use crate::cache::{CacheKey, CachedResult, ResultCache};
use crate::error::{AppError, Result};
use crate::models::{Book, Config, SearchRequest};
use crate::services::normalize::normalize;
use crate::services::query::QueryBuilder;
use crate::services::thumbnails::ThumbnailResolver;
use crate::services::upstream::BookSource;
use crate::storage::ThumbnailStore;
use crate::utils::parse_image_url;

/// Entry point for book searches.
pub struct BookResolver {
    source: Arc<dyn BookSource>,
    store: Arc<dyn ThumbnailStore>,
    cache: Arc<ResultCache>,
    queries: QueryBuilder,
    thumbnails: ThumbnailResolver,
}

impl BookResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(
        source: Arc<dyn BookSource>,
        store: Arc<dyn ThumbnailStore>,
        cache: Arc<ResultCache>,
        config: &Config,
    ) -> Self {
        Self {
            source,
            thumbnails: ThumbnailResolver::new(Arc::clone(&store), &config.thumbnails),
            store,
            cache,
            queries: QueryBuilder::new(&config.upstream),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Resolve a search into books, serving from cache when possible.
    pub async fn resolve(&self, request: &SearchRequest) -> Result<Arc<Vec<Book>>> {
        if request.canonical_term().is_empty() {
            return Err(AppError::validation("Search term is empty"));
        }

        let key = CacheKey::for_request(request);
        if let Some(cached) = self.cache.get(&key) {
            log::debug!("Cache hit for {}:{}:{}", request.mode, key.term(), request.offset);
            return match cached {
                CachedResult::Books(books) => Ok(books),
                CachedResult::NoResults => Err(AppError::no_results(&request.term)),
            };
        }
        let generation = self.cache.generation();

        let target = self
            .queries
            .build(&request.term, request.mode, request.effective_offset());
        log::info!("Resolving {} '{}' via {}", request.mode, request.term, target);

        let payload = self.source.fetch(&target).await.map_err(|e| {
            log::error!("Upstream call failed: {}", e);
            e
        })?;

        let drafts = match normalize(&payload, request, &target) {
            Ok(drafts) => drafts,
            Err(AppError::NoResultsFound { term }) => {
                log::info!("No results for {} '{}'", request.mode, term);
                self.cache.put(key, CachedResult::NoResults);
                return Err(AppError::NoResultsFound { term });
            }
            Err(e) => {
                log::error!("{}", e);
                return Err(e);
            }
        };

        let books = Arc::new(self.thumbnails.resolve_all(drafts).await);
        log::info!(
            "Resolved {} books for {} '{}'",
            books.len(),
            request.mode,
            request.term
        );

        // A thumbnail attached while this page was being built makes it stale.
        self.cache
            .put_if_current(key, CachedResult::Books(Arc::clone(&books)), generation);
        Ok(books)
    }

    /// Drop the cached page for a request. Returns whether one was cached.
    pub fn invalidate(&self, request: &SearchRequest) -> bool {
        self.cache.invalidate(&CacheKey::for_request(request))
    }

    /// Drop every cached page holding a book. Returns the number dropped.
    pub fn invalidate_book(&self, book_id: &str) -> usize {
        self.cache.invalidate_book(book_id)
    }

    /// Record a thumbnail for a book and drop stale cached covers.
    pub async fn attach_thumbnail(&self, book_id: &str, url: &str) -> Result<()> {
        let book_id = book_id.trim();
        if book_id.is_empty() {
            return Err(AppError::validation("Book ID is empty"));
        }
        let url = parse_image_url(url)?;

        self.store.attach_thumbnail(book_id, url.as_str()).await?;

        let dropped = self.invalidate_book(book_id);
        if dropped > 0 {
            log::info!("Invalidated {} cached pages holding {}", dropped, book_id);
        }
        Ok(())
    }

    /// Look up the thumbnail recorded for a book.
    pub async fn stored_thumbnail(&self, book_id: &str) -> Result<Option<String>> {
        self.store.get_thumbnail(book_id.trim()).await
    }
}
