//! Bounded in-process cache with time-to-live expiry.
//!
//! Used for search state and for generated explanations. Capacity is enforced
//! by a [`moka`] cache with least-recently-used eviction. Expiry is judged
//! against the injected [`Clock`] rather than moka's own timer, so tests can
//! drive it with [`crate::ManualClock`].

use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use crate::clock::{Clock, SystemClock};

#[derive(Debug)]
struct Stamped<V> {
    value: V,
    inserted_at: SystemTime,
}

type Slot<V> = Arc<Mutex<Stamped<V>>>;

fn lock<V>(slot: &Slot<V>) -> MutexGuard<'_, Stamped<V>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe map with a capacity bound and per-entry expiry.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use kindred_core::{ManualClock, TtlCache};
///
/// let clock = Arc::new(ManualClock::default());
/// let cache = TtlCache::with_clock(4, Duration::from_secs(60), clock.clone());
/// cache.insert("k", 1);
/// assert_eq!(cache.get(&"k"), Some(1));
/// clock.advance(Duration::from_secs(61));
/// assert_eq!(cache.get(&"k"), None);
/// ```
pub struct TtlCache<K, V> {
    entries: Cache<K, Slot<V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    /// Create a cache that reads the system clock.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    /// Create a cache driven by `clock`.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = capacity.max(1);
        let entries = Cache::builder()
            .max_capacity(u64::try_from(capacity).unwrap_or(u64::MAX))
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            entries,
            capacity,
            ttl,
            clock,
        }
    }

    fn is_live(&self, inserted_at: SystemTime) -> bool {
        !matches!(
            self.clock.now().duration_since(inserted_at),
            Ok(age) if age > self.ttl
        )
    }

    /// Return a clone of the live value for `key`, dropping it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.entries.get(key)?;
        let stamped = lock(&slot);
        if self.is_live(stamped.inserted_at) {
            return Some(stamped.value.clone());
        }
        drop(stamped);
        self.entries.invalidate(key);
        None
    }

    /// Insert or replace `key`.
    pub fn insert(&self, key: K, value: V) {
        let stamped = Stamped {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.insert(key, Arc::new(Mutex::new(stamped)));
    }

    /// Apply `update` to the live value for `key`, keeping its original
    /// insertion time. Returns `false` when the key is absent or expired.
    pub fn update(&self, key: &K, update: impl FnOnce(&mut V)) -> bool {
        let Some(slot) = self.entries.get(key) else {
            return false;
        };
        let mut stamped = lock(&slot);
        if !self.is_live(stamped.inserted_at) {
            drop(stamped);
            self.entries.invalidate(key);
            return false;
        }
        update(&mut stamped.value);
        true
    }

    /// Remove `key`, returning its value if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries
            .remove(key)
            .map(|slot| lock(&slot).value.clone())
    }

    /// Number of stored entries after pending evictions are applied,
    /// including any expired entries not yet read.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
