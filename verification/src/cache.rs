//! Cache of completed verification results.
//!
//! Entries are keyed by subject and by whether a viewer was present, never
//! by which viewer: two different viewers share an entry. Each entry holds
//! the shared result, its insertion time and a generation number that
//! increases on every insert, so a caller can tell a re-verified result from
//! the one it saw before.
//!
//! Concurrent identifies of the same key are serialised through
//! [`IdentifyCache::flight`]; the first caller runs the pass, later callers
//! find its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use keyproof_types::{Clock, SystemClock, Timestamp, UserId};
use keyproof_utils::StatsCounter;
use tracing::trace;

use crate::IdentifyRes;

const HITS: &str = "hits";
const MISSES: &str = "misses";
const EXPIRED: &str = "expired";
const INVALIDATIONS: &str = "invalidations";

/// Cache key: the subject and whether a viewer was set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub subject: UserId,
    pub me_set: bool,
}

impl CacheKey {
    pub fn new(subject: UserId, me_set: bool) -> Self {
        Self { subject, me_set }
    }
}

#[derive(Debug)]
struct CacheEntry {
    result: Arc<IdentifyRes>,
    inserted_at: Timestamp,
    generation: u64,
}

/// Verification result cache with optional TTL.
pub struct IdentifyCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    flights: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    /// `None`: entries live as long as the cache.
    ttl_secs: Option<u64>,
    clock: Arc<dyn Clock>,
    next_generation: AtomicU64,
    stats: StatsCounter,
}

impl Default for IdentifyCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), None)
    }
}

impl IdentifyCache {
    pub fn new(clock: Arc<dyn Clock>, ttl_secs: Option<u64>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            ttl_secs,
            clock,
            next_generation: AtomicU64::new(1),
            stats: StatsCounter::new(&[HITS, MISSES, EXPIRED, INVALIDATIONS]),
        }
    }

    /// A fresh cached result for `key`, if any. An expired entry is
    /// removed.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<IdentifyRes>> {
        let expired_generation = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if self.is_fresh(entry) => {
                    self.stats.increment(HITS);
                    trace!(subject = %key.subject, me_set = key.me_set, generation = entry.generation, "identify cache hit");
                    return Some(Arc::clone(&entry.result));
                }
                Some(entry) => {
                    trace!(
                        subject = %key.subject,
                        me_set = key.me_set,
                        age_secs = entry.inserted_at.elapsed_since(self.clock.now()),
                        "identify cache entry expired"
                    );
                    entry.generation
                }
                None => {
                    self.stats.increment(MISSES);
                    return None;
                }
            }
        };

        self.stats.increment(EXPIRED);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Re-inserted between the two locks: leave the newer entry alone.
        if entries.get(key).is_some_and(|e| e.generation == expired_generation) {
            entries.remove(key);
        }
        None
    }

    /// Store `result` under `key`, replacing any previous entry.
    /// Returns the new entry's generation.
    pub fn insert(&self, key: CacheKey, result: Arc<IdentifyRes>) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entry = CacheEntry {
            result,
            inserted_at: self.clock.now(),
            generation,
        };
        trace!(subject = %key.subject, me_set = key.me_set, generation, "identify cache insert");
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.ttl_secs.is_some() {
            entries.retain(|_, e| self.is_fresh(e));
        }
        entries.insert(key, entry);
        generation
    }

    /// Generation of the entry stored under `key`, fresh or not.
    pub fn generation(&self, key: &CacheKey) -> Option<u64> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|e| e.generation)
    }

    /// Drop every entry for `subject`, with or without a viewer, along
    /// with its idle flight locks. Call after the viewer re-tracks the
    /// subject. Returns how many entries were dropped.
    pub fn invalidate(&self, subject: &UserId) -> usize {
        let dropped = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let before = entries.len();
            entries.retain(|k, _| &k.subject != subject);
            before - entries.len()
        };
        if dropped > 0 {
            self.stats.add(INVALIDATIONS, dropped as u64);
        }
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|k, f| &k.subject != subject || Arc::strong_count(f) > 1);
        dropped
    }

    /// Drop every entry and every idle flight lock.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, f| Arc::strong_count(f) > 1);
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single-flight lock for `key`. Hold it across check-then-populate,
    /// then drop it and call [`end_flight`](Self::end_flight).
    pub fn flight(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(flights.entry(key.clone()).or_default())
    }

    /// Forget the flight lock for `key` once no caller holds it.
    ///
    /// Clones are only handed out under the `flights` lock, so a strong
    /// count of one there means the map holds the last reference.
    pub fn end_flight(&self, key: &CacheKey) {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if flights.get(key).is_some_and(|f| Arc::strong_count(f) == 1) {
            flights.remove(key);
        }
    }

    /// Flight locks currently tracked, idle or held.
    pub fn flight_count(&self) -> usize {
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn hits(&self) -> u64 {
        self.stats.get(HITS)
    }

    /// Lookups that found nothing usable, expired entries included.
    pub fn misses(&self) -> u64 {
        self.stats.get(MISSES) + self.stats.get(EXPIRED)
    }

    /// Every counter: hits, misses, expired, invalidations.
    pub fn stats(&self) -> HashMap<&'static str, u64> {
        self.stats.snapshot()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        match self.ttl_secs {
            None => true,
            Some(ttl) => !entry.inserted_at.has_expired(ttl, self.clock.now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StepClock(AtomicU64);

    impl Clock for StepClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.load(Ordering::SeqCst))
        }
    }

    fn key(me_set: bool) -> CacheKey {
        CacheKey::new(UserId::new("c".repeat(32)).unwrap(), me_set)
    }

    #[test]
    fn hit_returns_the_same_allocation() {
        let cache = IdentifyCache::default();
        let res = Arc::new(IdentifyRes::new(true));
        cache.insert(key(true), Arc::clone(&res));

        let hit = cache.get(&key(true)).unwrap();
        assert!(Arc::ptr_eq(&hit, &res));
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn viewer_flag_is_part_of_the_key() {
        let cache = IdentifyCache::default();
        cache.insert(key(true), Arc::new(IdentifyRes::new(true)));
        assert!(cache.get(&key(false)).is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn insert_overwrites_and_bumps_generation() {
        let cache = IdentifyCache::default();
        let first = cache.insert(key(false), Arc::new(IdentifyRes::new(false)));
        let second = cache.insert(key(false), Arc::new(IdentifyRes::new(false)));
        assert!(second > first);
        assert_eq!(cache.generation(&key(false)), Some(second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn ttl_expires_entries() {
        let clock = Arc::new(StepClock(AtomicU64::new(1_000)));
        let cache = IdentifyCache::new(clock.clone(), Some(60));
        cache.insert(key(false), Arc::new(IdentifyRes::new(false)));

        clock.0.store(1_059, Ordering::SeqCst);
        assert!(cache.get(&key(false)).is_some());

        clock.0.store(1_060, Ordering::SeqCst);
        assert!(cache.get(&key(false)).is_none());
    }

    #[test]
    fn invalidate_drops_both_flags() {
        let cache = IdentifyCache::default();
        cache.insert(key(false), Arc::new(IdentifyRes::new(false)));
        cache.insert(key(true), Arc::new(IdentifyRes::new(true)));
        let other = CacheKey::new(UserId::new("d".repeat(32)).unwrap(), false);
        cache.insert(other.clone(), Arc::new(IdentifyRes::new(false)));

        assert_eq!(cache.invalidate(&key(false).subject), 2);
        assert!(cache.get(&key(true)).is_none());
        assert!(cache.get(&other).is_some());
    }

    #[test]
    fn flight_lock_is_shared_per_key() {
        let cache = IdentifyCache::default();
        let a = cache.flight(&key(true));
        let b = cache.flight(&key(true));
        let c = cache.flight(&key(false));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    fn subject_key(i: usize) -> CacheKey {
        CacheKey::new(UserId::new(format!("{i:032x}")).unwrap(), i % 2 == 0)
    }

    #[test]
    fn expired_entry_is_removed_on_get() {
        let clock = Arc::new(StepClock(AtomicU64::new(1_000)));
        let cache = IdentifyCache::new(clock.clone(), Some(60));
        cache.insert(key(false), Arc::new(IdentifyRes::new(false)));
        assert_eq!(cache.len(), 1);

        clock.0.store(2_000, Ordering::SeqCst);
        assert!(cache.get(&key(false)).is_none());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.generation(&key(false)), None);
        assert_eq!(cache.stats()[EXPIRED], 1);
    }

    #[test]
    fn insert_sweeps_expired_entries() {
        let clock = Arc::new(StepClock(AtomicU64::new(1_000)));
        let cache = IdentifyCache::new(clock.clone(), Some(1));
        for i in 0..100 {
            cache.insert(subject_key(i), Arc::new(IdentifyRes::new(false)));
        }
        assert_eq!(cache.len(), 100);

        clock.0.store(1_001, Ordering::SeqCst);
        cache.insert(key(true), Arc::new(IdentifyRes::new(true)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn end_flight_forgets_idle_locks_only() {
        let cache = IdentifyCache::default();
        let held = cache.flight(&key(true));

        cache.end_flight(&key(true));
        assert_eq!(cache.flight_count(), 1);

        drop(held);
        cache.end_flight(&key(true));
        assert_eq!(cache.flight_count(), 0);
    }

    #[test]
    fn clear_drops_idle_flight_locks() {
        let clock = Arc::new(StepClock(AtomicU64::new(0)));
        let cache = IdentifyCache::new(clock.clone(), Some(1));
        for i in 0..100 {
            let _ = cache.flight(&subject_key(i));
            cache.insert(subject_key(i), Arc::new(IdentifyRes::new(false)));
        }
        let held = cache.flight(&key(false));

        clock.0.store(1_000, Ordering::SeqCst);
        for i in 0..100 {
            assert!(cache.get(&subject_key(i)).is_none());
        }
        assert_eq!(cache.len(), 0);

        cache.clear();
        assert_eq!(cache.flight_count(), 1);
        drop(held);
        cache.clear();
        assert_eq!(cache.flight_count(), 0);
    }

    #[test]
    fn invalidate_drops_the_subjects_idle_flight_locks() {
        let cache = IdentifyCache::default();
        let other = CacheKey::new(UserId::new("d".repeat(32)).unwrap(), false);
        let _ = cache.flight(&key(true));
        let _ = cache.flight(&key(false));
        let _ = cache.flight(&other);

        cache.invalidate(&key(true).subject);
        assert_eq!(cache.flight_count(), 1);
    }
}
