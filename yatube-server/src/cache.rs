//! Whole-page cache for the index feed
//!
//! Entries are keyed by request URI and viewer and expire after a fixed TTL.
//! Nothing invalidates them early: a post published inside the window shows
//! up on the index once the cached copy expires.

use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Upper bound on cached pages
const DEFAULT_CAPACITY: usize = 256;

/// A rendered page as served
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: String,
    pub template: &'static str,
    pub context: serde_json::Value,
}

struct Entry {
    page: CachedPage,
    expires_at: Instant,
}

/// TTL-bounded LRU of rendered pages
pub struct PageCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// A zero TTL turns the cache off.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cache key for a URI as seen by a viewer (`None` = anonymous).
    pub fn key(uri: &str, viewer: Option<i64>) -> String {
        match viewer {
            Some(id) => format!("{uri}#user={id}"),
            None => format!("{uri}#anon"),
        }
    }

    pub fn get(&self, key: &str) -> Option<CachedPage> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.page.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, page: CachedPage) {
        if !self.is_enabled() {
            return;
        }

        let entry = Entry {
            page,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().put(key, entry);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
