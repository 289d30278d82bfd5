use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use crate::metrics::{CACHE_EVICTIONS, CACHE_SIZE};

// Where entry timestamps come from
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// Cache key: model name + sha256 of the prompt (prompt itself is never kept)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    prompt_digest: [u8; 32],
}

impl CacheKey {
    pub fn new(model: &str, prompt: &str) -> Self {
        let mut prompt_digest = [0u8; 32];
        prompt_digest.copy_from_slice(&Sha256::digest(prompt.as_bytes()));
        Self {
            model: model.to_string(),
            prompt_digest,
        }
    }

    // First 8 hex chars, enough to correlate log lines
    pub fn short_hex(&self) -> String {
        hex::encode(&self.prompt_digest[..4])
    }
}

// Cache entry with timestamp
#[derive(Clone)]
pub struct CacheEntry {
    pub response: String,
    pub created_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    // (created_at, seq) -> key, oldest first
    by_age: BTreeMap<(Instant, u64), CacheKey>,
    next_seq: u64,
}

impl CacheState {
    fn insert(&mut self, key: CacheKey, response: String, now: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = CacheEntry {
            response,
            created_at: now,
            seq,
        };
        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.by_age.remove(&(old.created_at, old.seq));
        }
        self.by_age.insert((now, seq), key);
    }

    fn remove(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.by_age.remove(&(entry.created_at, entry.seq));
        Some(entry)
    }

    fn evict_oldest(&mut self) -> Option<CacheKey> {
        let (_, key) = self.by_age.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// In-process cache for generated text, bounded by age and by entry count.
///
/// A `ttl_seconds` of zero or less turns the cache off: `get` always misses
/// and `put` stores nothing. When full, inserting a new key evicts the entry
/// with the oldest insertion time. Every read-modify-write runs under a single
/// lock that is never held across an await.
pub struct GenerationCache {
    ttl: Option<Duration>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl GenerationCache {
    pub fn new(ttl_seconds: i64, max_entries: usize) -> Self {
        Self::with_clock(ttl_seconds, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_seconds: i64, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let ttl = (ttl_seconds > 0).then(|| Duration::from_secs(ttl_seconds as u64));
        Self {
            ttl,
            max_entries,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some() && self.max_entries > 0
    }

    pub fn get(&self, model: &str, prompt: &str) -> Option<String> {
        let ttl = self.ttl?;
        let key = CacheKey::new(model, prompt);
        let now = self.clock.now();

        let mut state = self.state.lock();
        let entry = state.entries.get(&key)?;
        if now.saturating_duration_since(entry.created_at) <= ttl {
            return Some(entry.response.clone());
        }

        // expired
        state.remove(&key);
        CACHE_SIZE.set(state.entries.len() as f64);
        debug!(model, key = %key.short_hex(), "Cache entry expired, removed");
        None
    }

    pub fn put(&self, model: &str, prompt: &str, response: String) {
        if !self.is_enabled() {
            return;
        }
        let key = CacheKey::new(model, prompt);

        let mut state = self.state.lock();
        let now = self.clock.now();

        // overwriting an existing key never needs room
        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            if let Some(evicted) = state.evict_oldest() {
                CACHE_EVICTIONS.inc();
                debug!(model = %evicted.model, key = %evicted.short_hex(), "Evicted oldest cache entry");
            }
        }
        state.insert(key, response, now);
        CACHE_SIZE.set(state.entries.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Clock that only moves when told to
#[cfg(test)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_clock(ttl: i64, max: usize) -> (GenerationCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = GenerationCache::with_clock(ttl, max, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_then_get_returns_stored_text() {
        let (cache, _) = cache_with_clock(300, 8);
        cache.put("m", "what is rust?", "a language".to_string());
        assert_eq!(cache.get("m", "what is rust?").as_deref(), Some("a language"));
    }

    #[test]
    fn test_get_unknown_key_misses() {
        let (cache, _) = cache_with_clock(300, 8);
        assert!(cache.get("m", "nothing here").is_none());
    }

    #[test]
    fn test_model_is_part_of_the_key() {
        let (cache, _) = cache_with_clock(300, 8);
        cache.put("model-a", "same prompt", "A".to_string());
        assert!(cache.get("model-b", "same prompt").is_none());
        assert_eq!(cache.get("model-a", "same prompt").as_deref(), Some("A"));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock(1, 8);
        cache.put("m", "x", "X".to_string());
        clock.advance(Duration::from_millis(1100));
        assert!(cache.get("m", "x").is_none());
        // lazily removed
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_entry_alive_exactly_at_ttl() {
        let (cache, clock) = cache_with_clock(1, 8);
        cache.put("m", "x", "X".to_string());
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("m", "x").as_deref(), Some("X"));
    }

    #[test]
    fn test_zero_or_negative_ttl_disables_cache() {
        for ttl in [0, -5] {
            let (cache, _) = cache_with_clock(ttl, 8);
            cache.put("m", "x", "X".to_string());
            assert!(cache.get("m", "x").is_none());
            assert!(cache.is_empty());
            assert!(!cache.is_enabled());
        }
    }

    #[test]
    fn test_zero_max_entries_stores_nothing() {
        let (cache, _) = cache_with_clock(300, 0);
        cache.put("m", "x", "X".to_string());
        assert!(cache.get("m", "x").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_entry_evicted_when_full() {
        let (cache, clock) = cache_with_clock(300, 2);
        cache.put("m", "a", "A".to_string());
        clock.advance(Duration::from_millis(10));
        cache.put("m", "b", "B".to_string());
        clock.advance(Duration::from_millis(10));
        cache.put("m", "c", "C".to_string());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("m", "a").is_none());
        assert_eq!(cache.get("m", "b").as_deref(), Some("B"));
        assert_eq!(cache.get("m", "c").as_deref(), Some("C"));
    }

    #[test]
    fn test_same_timestamp_evicts_first_inserted() {
        // clock never advances, so ties are broken by insertion order
        let (cache, _) = cache_with_clock(300, 2);
        cache.put("m", "a", "A".to_string());
        cache.put("m", "b", "B".to_string());
        cache.put("m", "c", "C".to_string());

        assert!(cache.get("m", "a").is_none());
        assert!(cache.get("m", "b").is_some());
        assert!(cache.get("m", "c").is_some());
    }

    #[test]
    fn test_many_inserts_never_exceed_bound() {
        let (cache, clock) = cache_with_clock(300, 5);
        for i in 0..50 {
            cache.put("m", &format!("prompt {i}"), format!("out {i}"));
            clock.advance(Duration::from_millis(1));
            assert!(cache.len() <= 5);
        }
        // the five newest survive
        for i in 45..50 {
            assert_eq!(cache.get("m", &format!("prompt {i}")), Some(format!("out {i}")));
        }
        assert!(cache.get("m", "prompt 44").is_none());
    }

    #[test]
    fn test_reput_replaces_value_without_growing() {
        let (cache, _) = cache_with_clock(300, 2);
        cache.put("m", "a", "first".to_string());
        cache.put("m", "b", "B".to_string());
        cache.put("m", "a", "second".to_string());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("m", "a").as_deref(), Some("second"));
        assert_eq!(cache.get("m", "b").as_deref(), Some("B"));
    }

    #[test]
    fn test_reput_resets_expiry() {
        let (cache, clock) = cache_with_clock(10, 4);
        cache.put("m", "a", "A".to_string());
        clock.advance(Duration::from_secs(8));
        cache.put("m", "a", "A2".to_string());
        clock.advance(Duration::from_secs(8));
        // 16s after the first put, 8s after the second
        assert_eq!(cache.get("m", "a").as_deref(), Some("A2"));
    }

    #[test]
    fn test_reput_moves_entry_to_back_of_eviction_order() {
        let (cache, clock) = cache_with_clock(300, 2);
        cache.put("m", "a", "A".to_string());
        clock.advance(Duration::from_millis(10));
        cache.put("m", "b", "B".to_string());
        clock.advance(Duration::from_millis(10));
        cache.put("m", "a", "A".to_string());
        clock.advance(Duration::from_millis(10));
        cache.put("m", "c", "C".to_string());

        assert!(cache.get("m", "b").is_none());
        assert!(cache.get("m", "a").is_some());
        assert!(cache.get("m", "c").is_some());
    }

    #[test]
    fn test_expired_entry_is_first_to_go() {
        let (cache, clock) = cache_with_clock(5, 2);
        cache.put("m", "old", "O".to_string());
        clock.advance(Duration::from_secs(6));
        cache.put("m", "new", "N".to_string());
        cache.put("m", "newer", "NN".to_string());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("m", "old").is_none());
        assert_eq!(cache.get("m", "new").as_deref(), Some("N"));
    }

    #[test]
    fn test_concurrent_puts_respect_bound_and_lose_nothing() {
        const N: usize = 32;
        let cache = Arc::new(GenerationCache::new(300, N));

        std::thread::scope(|s| {
            for i in 0..N {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    cache.put("m", &format!("key {i}"), format!("value {i}"));
                });
            }
        });

        assert_eq!(cache.len(), N);
        for i in 0..N {
            assert_eq!(cache.get("m", &format!("key {i}")), Some(format!("value {i}")));
        }
    }

    #[test]
    fn test_concurrent_puts_over_capacity_stay_bounded() {
        let cache = Arc::new(GenerationCache::new(300, 8));

        std::thread::scope(|s| {
            for t in 0..4 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for i in 0..100 {
                        cache.put("m", &format!("{t}-{i}"), "v".to_string());
                        assert!(cache.len() <= 8);
                    }
                });
            }
        });

        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn test_key_hashes_prompt() {
        let a = CacheKey::new("m", "hello");
        let b = CacheKey::new("m", "hello");
        let c = CacheKey::new("m", "hello!");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short_hex().len(), 8);
    }
}
