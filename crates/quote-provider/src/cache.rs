use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_CAPACITY: usize = 1024;

struct CacheEntry<T> {
    data: T,
    cached_at: Instant,
}

/// Bounded time-to-live cache keyed by composite strings such as
/// `quote_AAPL` or `historical_AAPL_1M`.
///
/// A read hits iff the entry is younger than the TTL. Inserting a new key
/// into a full cache first drops every expired entry, then the oldest one
/// if that was not enough.
pub struct TtlCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    capacity: usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.cached_at.elapsed() < self.ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: impl Into<String>, data: T) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.make_room();
        }
        self.entries.insert(
            key,
            CacheEntry {
                data,
                cached_at: Instant::now(),
            },
        );
    }

    fn make_room(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.cached_at.elapsed() < ttl);

        if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().cached_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                tracing::debug!("Cache full, evicting {}", key);
                self.entries.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}
