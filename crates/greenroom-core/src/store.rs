//! Cache store: explicitly constructed, shared key/value storage.
//!
//! Provides:
//! - Unconditional `write` (insert or overwrite, never fails)
//! - Presence-only `read`
//! - `is_valid` freshness check against the store's validity policy
//! - Invalidation, clearing, and hit/miss statistics

use crate::key::CacheKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Validity policy applied by [`Store::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Any present entry is valid. The default.
    Presence,
    /// Entries stop being valid once older than the given duration.
    Ttl(Duration),
}

/// A cached value and the instant it was written.
#[derive(Debug, Clone)]
struct StoreEntry<T> {
    value: T,
    cached_at: Instant,
}

/// Occupancy and hit/miss statistics for a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of entries currently held (valid or not).
    pub entries: usize,
    /// Reads that found a present entry.
    pub hits: u64,
    /// Reads that found nothing.
    pub misses: u64,
}

/// Shared key/value store for resolved fetch results.
///
/// A `Store` is created explicitly and handed, as a cheap-clone handle, to
/// every coordinator that should share it; all clones operate on the same
/// underlying map, and dropping the last handle drops the store.
///
/// `read` reports presence only; pair it with [`Store::is_valid`], which
/// applies the validity policy chosen at construction, to decide usability.
///
/// # Example
///
/// ```
/// use greenroom::Store;
///
/// let store: Store<u32> = Store::new();
/// store.write("answer", 42);
/// assert_eq!(store.read(&"answer".into()), Some(42));
/// assert!(store.is_valid(&"answer".into()));
/// ```
pub struct Store<T> {
    inner: Arc<StoreInner<T>>,
}

struct StoreInner<T> {
    entries: RwLock<HashMap<CacheKey, StoreEntry<T>>>,
    validity: Validity,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    /// Create a store where any present entry is valid.
    pub fn new() -> Self {
        Self::with_validity(Validity::Presence)
    }

    /// Create a store whose entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_validity(Validity::Ttl(ttl))
    }

    /// Create a store with an explicit validity policy.
    pub fn with_validity(validity: Validity) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                entries: RwLock::new(HashMap::new()),
                validity,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// The validity policy this store applies.
    pub fn validity(&self) -> Validity {
        self.inner.validity
    }

    /// Insert or overwrite the entry for `key`. Never fails.
    pub fn write(&self, key: impl Into<CacheKey>, value: T) {
        let entry = StoreEntry {
            value,
            cached_at: Instant::now(),
        };
        self.inner.entries.write().unwrap().insert(key.into(), entry);
    }

    /// Whether the entry for `key` (if any) may be used without refetching.
    pub fn is_valid(&self, key: &CacheKey) -> bool {
        let entries = self.inner.entries.read().unwrap();
        match entries.get(key) {
            Some(entry) => match self.inner.validity {
                Validity::Presence => true,
                Validity::Ttl(ttl) => entry.cached_at.elapsed() < ttl,
            },
            None => false,
        }
    }

    /// Remove the entry for `key`. Returns whether an entry was removed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.inner.entries.write().unwrap().remove(key).is_some()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.inner.entries.write().unwrap().clear();
    }

    /// Number of entries currently held, whether valid or not.
    pub fn len(&self) -> usize {
        self.inner.entries.read().unwrap().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of current statistics.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }
}

impl<T: Clone> Store<T> {
    /// The stored value for `key`, if present.
    ///
    /// Does not consult freshness: a stale entry still reads back until it
    /// is overwritten or invalidated.
    pub fn read(&self, key: &CacheKey) -> Option<T> {
        let entries = self.inner.entries.read().unwrap();
        match entries.get(key) {
            Some(entry) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}
