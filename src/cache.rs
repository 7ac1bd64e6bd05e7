// src/cache.rs

//! In-memory cache for resolved search pages.
//!
//! Entries expire lazily: a read that finds an entry older than the TTL
//! evicts it and reports a miss. The cache is also bounded by an LRU
//! capacity, since arbitrary free-text keys written once and never read
//! again would otherwise never be reclaimed.
//!
//! Keys are namespaced by search mode, so an ID lookup for `"dune"` and a
//! title search for `"dune"` never share an entry.
//!
//! Book invalidation bumps a generation counter. A writer that captured the
//! generation before its miss only lands its page if no invalidation ran in
//! between, so a resolve in flight cannot re-insert a stale page.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::models::{Book, SearchMode, SearchRequest};

/// Composite cache key for one resolved page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: SearchMode,
    term: String,
    offset: u32,
    detailed: bool,
}

impl CacheKey {
    /// Build the key a request is cached under.
    ///
    /// Starts from the same canonical term the upstream query uses. Text
    /// modes are also case-folded; volume IDs are case sensitive and ISBNs
    /// are already canonical.
    pub fn for_request(request: &SearchRequest) -> Self {
        let term = request.canonical_term();
        let term = match request.mode {
            SearchMode::ById | SearchMode::ByIsbn => term,
            _ => term.to_lowercase(),
        };
        Self {
            namespace: request.mode,
            term,
            offset: request.effective_offset(),
            detailed: request.detailed,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

/// What a cache entry holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedResult {
    /// A resolved page, possibly empty
    Books(Arc<Vec<Book>>),
    /// Upstream confirmed the query has no matches at all
    NoResults,
}

impl CachedResult {
    /// Whether this entry holds a book with the given identifier.
    pub fn contains_book(&self, id: &str) -> bool {
        match self {
            CachedResult::Books(books) => books.iter().any(|b| b.id == id),
            CachedResult::NoResults => false,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: CachedResult,
    created_at: Instant,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub entries: usize,
}

/// Thread-safe TTL + LRU cache for resolved pages.
///
/// Callers never lock: every operation takes the internal mutex for the
/// duration of a map operation only.
pub struct ResultCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    generation: AtomicU64,
}

impl ResultCache {
    /// Create a cache with the given TTL and entry capacity.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a live entry. Expired entries are evicted and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResult> {
        let mut entries = self.lock();
        let found = entries
            .get(key)
            .map(|entry| (entry.created_at.elapsed() < self.ttl, entry.value.clone()));

        match found {
            Some((true, value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Some((false, _)) => {
                entries.pop(key);
                self.expired.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Current invalidation generation. Capture it before a miss is filled.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Insert or replace an entry with a fresh timestamp.
    pub fn put(&self, key: CacheKey, value: CachedResult) {
        let mut entries = self.lock();
        Self::insert(&mut entries, key, value);
    }

    /// Insert only if no book invalidation ran since `generation` was read.
    /// Returns whether the entry was stored.
    pub fn put_if_current(&self, key: CacheKey, value: CachedResult, generation: u64) -> bool {
        let mut entries = self.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            log::debug!(
                "Discarding stale page for {}:{}:{}",
                key.namespace,
                key.term,
                key.offset
            );
            return false;
        }
        Self::insert(&mut entries, key, value);
        true
    }

    fn insert(entries: &mut LruCache<CacheKey, CacheEntry>, key: CacheKey, value: CachedResult) {
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                log::debug!(
                    "Cache full, evicted {}:{}:{}",
                    evicted.namespace,
                    evicted.term,
                    evicted.offset
                );
            }
        }
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().pop(key).is_some()
    }

    /// Remove every entry holding the given book. Returns the number removed.
    pub fn invalidate_book(&self, id: &str) -> usize {
        let mut entries = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.value.contains_book(id))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    /// Number of stored entries, including ones not yet found expired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(600), 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str) -> Book {
        Book {
            id: id.to_string(),
            title: format!("Title {id}"),
            authors: vec!["Author Unknown".to_string()],
            published_date: None,
            cover: None,
            description: None,
        }
    }

    fn page(ids: &[&str]) -> CachedResult {
        CachedResult::Books(Arc::new(ids.iter().map(|id| book(id)).collect()))
    }

    fn key(mode: SearchMode, term: &str, offset: u32) -> CacheKey {
        CacheKey::for_request(&SearchRequest::new(mode, term, offset))
    }

    #[test]
    fn test_get_missing_is_miss() {
        let cache = ResultCache::default();
        assert!(cache.get(&key(SearchMode::FreeText, "dune", 0)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_then_get_is_stable() {
        let cache = ResultCache::default();
        let k = key(SearchMode::BySubject, "fantasy", 0);
        cache.put(k.clone(), page(&["a", "b"]));

        let first = cache.get(&k).unwrap();
        let second = cache.get(&k).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_put_replaces_existing_entry() {
        let cache = ResultCache::default();
        let k = key(SearchMode::ByTitle, "dune", 0);
        cache.put(k.clone(), page(&["a"]));
        cache.put(k.clone(), page(&["b", "c"]));

        match cache.get(&k).unwrap() {
            CachedResult::Books(books) => {
                let ids: Vec<_> = books.iter().map(|b| b.id.as_str()).collect();
                assert_eq!(ids, vec!["b", "c"]);
            }
            CachedResult::NoResults => panic!("expected books"),
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_read() {
        let cache = ResultCache::new(Duration::from_millis(20), 16);
        let k = key(SearchMode::FreeText, "dune", 0);
        cache.put(k.clone(), page(&["a"]));
        std::thread::sleep(Duration::from_millis(40));

        assert!(cache.get(&k).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expired, 1);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = ResultCache::new(Duration::from_secs(60), 2);
        let a = key(SearchMode::FreeText, "a", 0);
        let b = key(SearchMode::FreeText, "b", 0);
        let c = key(SearchMode::FreeText, "c", 0);

        cache.put(a.clone(), page(&["1"]));
        cache.put(b.clone(), page(&["2"]));
        // Touch `a` so `b` becomes least recently used.
        assert!(cache.get(&a).is_some());
        cache.put(c.clone(), page(&["3"]));

        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(
            key(SearchMode::FreeText, "  The   Dune ", 0),
            key(SearchMode::FreeText, "the dune", 0)
        );
        assert_ne!(
            key(SearchMode::FreeText, "dune", 0),
            key(SearchMode::FreeText, "dune", 20)
        );
        assert_ne!(
            CacheKey::for_request(&SearchRequest::by_id("AbC")),
            CacheKey::for_request(&SearchRequest::by_id("abc"))
        );
    }

    #[test]
    fn test_key_matches_canonical_query_term() {
        assert_eq!(
            key(SearchMode::ByIsbn, "978-0-441-17271-9", 0),
            key(SearchMode::ByIsbn, "9780441172719", 0)
        );
        assert_eq!(
            key(SearchMode::ByIsbn, "0-441-17271-x", 0),
            key(SearchMode::ByIsbn, "044117271X", 0)
        );
        assert_eq!(
            CacheKey::for_request(&SearchRequest::by_id(" abc123 ")).term(),
            "abc123"
        );
    }

    #[test]
    fn test_id_namespace_never_collides_with_text() {
        let by_id = CacheKey::for_request(&SearchRequest::by_id("dune").detailed(false));
        let by_text = key(SearchMode::FreeText, "dune", 0);
        let by_title = key(SearchMode::ByTitle, "dune", 0);
        assert_ne!(by_id, by_text);
        assert_ne!(by_title, by_text);
    }

    #[test]
    fn test_invalidate_book_drops_every_page_holding_it() {
        let cache = ResultCache::default();
        cache.put(key(SearchMode::FreeText, "dune", 0), page(&["x1", "x2"]));
        cache.put(key(SearchMode::ByTitle, "dune", 0), page(&["x1"]));
        cache.put(key(SearchMode::BySubject, "scifi", 0), page(&["y1"]));
        cache.put(key(SearchMode::FreeText, "nothing", 0), CachedResult::NoResults);

        assert_eq!(cache.invalidate_book("x1"), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.invalidate(&key(SearchMode::BySubject, "scifi", 0)));
        assert!(!cache.invalidate(&key(SearchMode::BySubject, "scifi", 0)));
    }

    #[test]
    fn test_invalidation_discards_pages_filled_from_older_generation() {
        let cache = ResultCache::default();
        let k = key(SearchMode::FreeText, "dune", 0);

        let before = cache.generation();
        cache.invalidate_book("x1");
        assert!(!cache.put_if_current(k.clone(), page(&["x1"]), before));
        assert!(cache.get(&k).is_none());

        assert!(cache.put_if_current(k.clone(), page(&["x1"]), cache.generation()));
        assert!(cache.get(&k).is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ResultCache::new(Duration::from_secs(60), 64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        let k = key(SearchMode::FreeText, &format!("q{}", i % 16), 0);
                        if t % 2 == 0 {
                            cache.put(k, page(&["a"]));
                        } else {
                            let _ = cache.get(&k);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 16);
    }
}
