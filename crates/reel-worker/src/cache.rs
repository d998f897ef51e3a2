//! Explicit TTL cache.
//!
//! Entries carry their insertion time; staleness is decided at read time
//! against the caller-supplied TTL, and writes invalidate explicitly rather
//! than relying on background expiry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Pull-based cache of values with per-read TTL checks.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, (V, Instant)>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a value if it was inserted within `ttl`.
    pub fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        let (value, inserted_at) = self.entries.get(key)?;
        if inserted_at.elapsed() <= ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Remove one entry.
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop everything; used when the underlying data changes wholesale.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entries_hit() {
        let mut cache = TtlCache::new();
        cache.insert("templates", vec![1, 2, 3]);
        assert_eq!(
            cache.get(&"templates", Duration::from_secs(60)),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_stale_entries_miss_but_stay_until_overwritten() {
        let mut cache = TtlCache::new();
        cache.insert("templates", 7);
        assert_eq!(cache.get(&"templates", Duration::ZERO), None);
        assert_eq!(cache.len(), 1);

        cache.insert("templates", 8);
        assert_eq!(cache.get(&"templates", Duration::from_secs(60)), Some(8));
    }

    #[test]
    fn test_explicit_invalidation() {
        let mut cache = TtlCache::new();
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a", Duration::from_secs(60)), None);
        assert_eq!(cache.get(&"b", Duration::from_secs(60)), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }
}
