// Bounded TTL cache for resolved content
//
// In-memory only, constructed once per process. Expiry is lazy (checked
// and deleted on lookup) and capacity overflow evicts the single
// oldest-inserted entry - FIFO by insertion time, deliberately not LRU,
// so eviction behavior stays reproducible.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// Key-value store with lazy TTL expiry and FIFO capacity eviction.
/// A zero TTL disables the cache entirely: nothing is stored or read.
pub struct TtlCache<V> {
    state: Mutex<CacheState<V>>,
    ttl: Duration,
    max_items: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_items: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            ttl,
            max_items,
        }
    }

    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Look up a live entry. An expired entry is deleted as a side
    /// effect of the lookup.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Insert a value, evicting the oldest-inserted entry first when at
    /// capacity. No-op when the cache is disabled.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_at(key.into(), value, Instant::now())
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        if !self.enabled() {
            return None;
        }
        let mut state = self.state.lock().ok()?;
        let expired = match state.entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.inserted_at) > self.ttl,
            None => return None,
        };
        if expired {
            state.entries.remove(key);
            return None;
        }
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    fn set_at(&self, key: String, value: V, now: Instant) {
        if !self.enabled() {
            return;
        }
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return,
        };
        if self.max_items > 0 && state.entries.len() >= self.max_items {
            evict_oldest(&mut state.entries);
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );
    }
}

/// Remove exactly the entry with the smallest insertion time, with the
/// insertion sequence as tie-breaker on coarse clocks.
fn evict_oldest<V>(entries: &mut HashMap<String, CacheEntry<V>>) {
    if let Some(oldest_key) = entries
        .iter()
        .min_by_key(|(_, entry)| (entry.inserted_at, entry.seq))
        .map(|(key, _)| key.clone())
    {
        entries.remove(&oldest_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60), 16);
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_gone_after_lookup() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        let start = Instant::now();
        cache.set_at("k".to_string(), "v".to_string(), start);

        let later = start + Duration::from_secs(61);
        assert_eq!(cache.get_at("k", later), None);
        // Lazy expiry deleted the entry, freeing capacity.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_entry_survives_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        let start = Instant::now();
        cache.set_at("k".to_string(), "v".to_string(), start);
        assert_eq!(
            cache.get_at("k", start + Duration::from_secs(59)),
            Some("v".to_string())
        );
    }

    #[test]
    fn test_capacity_evicts_exactly_the_oldest() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        let start = Instant::now();
        cache.set_at("a".to_string(), 1, start);
        cache.set_at("b".to_string(), 2, start + Duration::from_secs(1));
        cache.set_at("c".to_string(), 3, start + Duration::from_secs(2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("a", start + Duration::from_secs(3)), None);
        assert_eq!(cache.get_at("b", start + Duration::from_secs(3)), Some(2));
        assert_eq!(cache.get_at("c", start + Duration::from_secs(3)), Some(3));
    }

    #[test]
    fn test_fifo_tie_break_on_equal_timestamps() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        let start = Instant::now();
        cache.set_at("a".to_string(), 1, start);
        cache.set_at("b".to_string(), 2, start);
        cache.set_at("c".to_string(), 3, start);

        assert_eq!(cache.get_at("a", start), None);
        assert_eq!(cache.get_at("b", start), Some(2));
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = TtlCache::new(Duration::ZERO, 16);
        assert!(!cache.enabled());
        cache.set("k", "v".to_string());
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);
    }
}
