//! Fast in-process cache tier for raw provider responses.
//!
//! Entries live for a few minutes and the whole tier is bounded to a fixed
//! entry count with least-recently-used eviction. Expired entries stay
//! readable through [`MemoryCache::get_stale`] until evicted, so a failed
//! re-fetch can still serve the last known body.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Default lifetime for raw responses: five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default entry bound for the memory tier.
pub const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    expires_at: Instant,
    last_used: u64,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, StoredEntry>,
    default_ttl: Duration,
    capacity: usize,
    clock: u64,
}

impl CacheInner {
    fn new(default_ttl: Duration, capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, key: &str, allow_stale: bool) -> Option<Value> {
        let now = Instant::now();
        let tick = self.tick();
        let entry = self.map.get_mut(key)?;

        if !allow_stale && entry.expires_at <= now {
            return None;
        }

        entry.last_used = tick;
        Some(entry.value.clone())
    }

    fn put(&mut self, key: String, value: Value, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let tick = self.tick();

        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.evict_one();
        }

        self.map.insert(
            key,
            StoredEntry {
                value,
                expires_at: Instant::now() + ttl,
                last_used: tick,
            },
        );
    }

    /// Drop one entry to make room: an expired entry when one exists,
    /// otherwise the least recently used.
    fn evict_one(&mut self) {
        let now = Instant::now();
        let victim = self
            .map
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at > now, entry.last_used))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            self.map.remove(&key);
        }
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Thread-safe, capacity-bounded TTL cache.
///
/// A single coarse lock guards the index; every operation is short and
/// allocation-light, so contention stays negligible at the request rates the
/// gateway is bounded to.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl MemoryCache {
    pub fn new(default_ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::new(default_ttl, capacity))),
        }
    }

    /// Cache with the default TTL and capacity bound.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    /// Get a fresh (non-expired) value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key, false)
    }

    /// Get a value regardless of expiry. Used to serve stale data when a
    /// re-fetch has failed.
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.lock().get(key, true)
    }

    /// Insert a value, evicting if the tier is full.
    pub fn put(&self, key: impl Into<String>, value: Value, ttl_override: Option<Duration>) {
        self.lock().put(key.into(), value, ttl_override);
    }

    /// Remove expired entries.
    pub fn clear_expired(&self) {
        self.lock().clear_expired();
    }

    /// Number of entries currently held, including expired ones.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().expect("memory cache lock is not poisoned")
    }
}
