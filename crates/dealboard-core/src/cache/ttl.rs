//! In-memory TTL cache with lazy expiry
//!
//! One `parking_lot::Mutex` per instance guards the map and the hit/miss
//! counters. The lock is only held for map access: callers build the value
//! before calling `set`, and nothing awaits while the guard is alive.
//!
//! Expiry is checked against `Instant` (monotonic) at access time. `get`
//! treats an expired entry as absent but leaves it in place; it is dropped
//! by the next `set` on the same key or by an explicit `purge_expired()`.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A stored value with its absolute expiry
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL runs past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries physically stored, including expired ones not yet purged
    pub size: usize,
    /// Entries still readable
    pub alive: usize,
    /// Lifetime count of `get` calls that returned a value
    pub hits: u64,
    /// Lifetime count of `get` calls that returned nothing
    pub misses: u64,
}

/// Thread-safe key/value store with per-entry TTL
///
/// Values are handed out by clone, so a caller that mutates what it got
/// back cannot affect the stored entry. Wrap large payloads in `Arc` to
/// keep the clone cheap.
pub struct TtlCache<V> {
    name: &'static str,
    default_ttl: Duration,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache; `name` only appears in logs
    pub fn new(name: &'static str, default_ttl: Duration) -> Self {
        Self {
            name,
            default_ttl,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// TTL applied by [`TtlCache::set`]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return a copy of the live value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let value = state
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        if value.is_some() {
            state.hits += 1;
            debug!(cache = self.name, key = %short_key(key), "Cache hit");
        } else {
            state.misses += 1;
            debug!(cache = self.name, key = %short_key(key), "Cache miss");
        }

        value
    }

    /// Store `value` under `key` with the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, overwriting any previous entry and its expiry
    ///
    /// A TTL too large to add to the current instant never expires.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let expires_at = Instant::now().checked_add(ttl);

        {
            let mut state = self.state.lock();
            state
                .entries
                .insert(key.clone(), CacheEntry { value, expires_at });
        }

        debug!(
            cache = self.name,
            key = %short_key(&key),
            ttl_secs = ttl.as_secs_f64(),
            "Cache set"
        );
    }

    /// Drop one key; returns whether it was stored (live or not)
    pub fn remove(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Whether `key` holds a live entry; does not touch the hit/miss counters
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Remove every expired entry and return how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut state = self.state.lock();
            let before = state.entries.len();
            state.entries.retain(|_, entry| entry.is_live(now));
            before - state.entries.len()
        };

        if removed > 0 {
            debug!(cache = self.name, removed, "Purged expired cache entries");
        }

        removed
    }

    /// Drop all entries; returns how many were stored. Counters are kept.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut state = self.state.lock();
            let count = state.entries.len();
            state.entries.clear();
            count
        };

        info!(cache = self.name, removed, "Cache cleared");
        removed
    }

    /// Current size and lifetime hit/miss counters
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            alive: state.entries.values().filter(|e| e.is_live(now)).count(),
            hits: state.hits,
            misses: state.misses,
        }
    }

    /// Number of stored entries (live or expired)
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("name", &self.name)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

fn short_key(key: &str) -> &str {
    let end = key
        .char_indices()
        .nth(16)
        .map(|(idx, _)| idx)
        .unwrap_or(key.len());
    &key[..end]
}
