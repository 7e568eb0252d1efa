//! Short-lived response cache for record-store reads.
//!
//! Entries are keyed by the request URL plus its serialized options and are
//! served for `ttl_ms` after they were fetched. Once stale, an entry is simply
//! not served any more; the next miss overwrites it. Expired entries are also
//! dropped whenever a new entry is inserted, and the map never grows past
//! `max_entries` (the oldest fetch is evicted first).
//!
//! The cache owns no timers and reads time through an injected [`Clock`], so
//! it can be driven deterministically in tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use log::debug;
use serde::Serialize;

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Browser `Date.now()` on wasm, `SystemTime` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<std::cell::Cell<u64>>);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(Rc::new(std::cell::Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

/// Build the cache key for a request: URL followed by its JSON-serialized options.
pub fn request_key<O: Serialize>(url: &str, options: &O) -> String {
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("{url}{options}")
}

struct CacheEntry<V> {
    value: V,
    fetched_at: u64,
}

pub struct ResponseCache<V> {
    entries: RefCell<HashMap<String, CacheEntry<V>>>,
    ttl_ms: u64,
    max_entries: usize,
    clock: Box<dyn Clock>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl_ms: u64, max_entries: usize, clock: impl Clock + 'static) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            ttl_ms,
            max_entries: max_entries.max(1),
            clock: Box::new(clock),
        }
    }

    /// Return a fresh cached value for `key`, or run `fetch` and remember its result.
    ///
    /// Errors from `fetch` are returned as-is and not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get_fresh(key) {
            debug!("cache hit: {}", key);
            return Ok(hit);
        }
        debug!("cache miss: {}", key);
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Number of entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_fresh(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let entries = self.entries.borrow();
        entries
            .get(key)
            .filter(|e| now.saturating_sub(e.fetched_at) < self.ttl_ms)
            .map(|e| e.value.clone())
    }

    fn insert(&self, key: &str, value: V) {
        let now = self.clock.now_ms();
        let ttl = self.ttl_ms;
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, e| now.saturating_sub(e.fetched_at) < ttl);
        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: now,
            },
        );
    }
}
