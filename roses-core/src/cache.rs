//! Verdict cache keyed by canonical position.
//!
//! Two tables, losing and winning, each partitioned by bucket (total rose
//! count). A canonical key lives in at most one of them: game value never
//! changes once computed.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::canonical::CanonicalKey;

/// Storage for solved positions.
///
/// The analyzer only ever records completed results, so any store that
/// remembers what it was told is sound, including one shared across many
/// analyses.
pub trait VerdictStore {
    fn is_losing(&self, bucket: u64, key: &CanonicalKey) -> bool;
    fn is_winning(&self, bucket: u64, key: &CanonicalKey) -> bool;
    fn record_losing(&mut self, bucket: u64, key: CanonicalKey);
    fn record_winning(&mut self, bucket: u64, key: CanonicalKey);
}

impl<S: VerdictStore + ?Sized> VerdictStore for &mut S {
    #[inline]
    fn is_losing(&self, bucket: u64, key: &CanonicalKey) -> bool {
        (**self).is_losing(bucket, key)
    }

    #[inline]
    fn is_winning(&self, bucket: u64, key: &CanonicalKey) -> bool {
        (**self).is_winning(bucket, key)
    }

    #[inline]
    fn record_losing(&mut self, bucket: u64, key: CanonicalKey) {
        (**self).record_losing(bucket, key)
    }

    #[inline]
    fn record_winning(&mut self, bucket: u64, key: CanonicalKey) {
        (**self).record_winning(bucket, key)
    }
}

/// In-memory bucketed cache.
#[derive(Debug, Default, Clone)]
pub struct VerdictCache {
    /// bucket -> canonical keys known to lose for the player to move
    losing: HashMap<u64, HashSet<CanonicalKey>>,
    /// bucket -> canonical keys known to win for the player to move
    winning: HashMap<u64, HashSet<CanonicalKey>>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of losing positions stored.
    pub fn losing_len(&self) -> usize {
        self.losing.values().map(HashSet::len).sum()
    }

    /// Number of winning positions stored.
    pub fn winning_len(&self) -> usize {
        self.winning.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.losing_len() == 0 && self.winning_len() == 0
    }

    /// Buckets holding at least one winning entry.
    pub fn winning_buckets(&self) -> impl Iterator<Item = u64> + '_ {
        self.winning
            .iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(&bucket, _)| bucket)
    }

    /// All losing keys, ordered by bucket then key.
    pub fn losing_keys(&self) -> Vec<(u64, CanonicalKey)> {
        let mut keys: Vec<(u64, CanonicalKey)> = self
            .losing
            .iter()
            .flat_map(|(&bucket, keys)| keys.iter().map(move |k| (bucket, k.clone())))
            .collect();
        keys.sort();
        keys
    }

    pub fn clear(&mut self) {
        self.losing.clear();
        self.winning.clear();
    }
}

impl VerdictStore for VerdictCache {
    fn is_losing(&self, bucket: u64, key: &CanonicalKey) -> bool {
        self.losing.get(&bucket).is_some_and(|keys| keys.contains(key))
    }

    fn is_winning(&self, bucket: u64, key: &CanonicalKey) -> bool {
        self.winning.get(&bucket).is_some_and(|keys| keys.contains(key))
    }

    fn record_losing(&mut self, bucket: u64, key: CanonicalKey) {
        debug_assert!(
            !self.is_winning(bucket, &key),
            "{:?} already recorded as winning",
            key
        );
        trace!(bucket, key = ?key.counts(), "record losing");
        self.losing.entry(bucket).or_default().insert(key);
    }

    fn record_winning(&mut self, bucket: u64, key: CanonicalKey) {
        debug_assert!(
            !self.is_losing(bucket, &key),
            "{:?} already recorded as losing",
            key
        );
        trace!(bucket, key = ?key.counts(), "record winning");
        self.winning.entry(bucket).or_default().insert(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonical_key;

    #[test]
    fn test_record_and_lookup() {
        let mut cache = VerdictCache::new();
        let key = canonical_key(&[1, 1, 1, 1, 1, 1]);

        assert!(!cache.is_losing(6, &key));
        cache.record_losing(6, key.clone());
        assert!(cache.is_losing(6, &key));
        assert!(!cache.is_winning(6, &key));
        assert_eq!(cache.losing_len(), 1);
        assert_eq!(cache.winning_len(), 0);
    }

    #[test]
    fn test_lookup_is_per_bucket() {
        let mut cache = VerdictCache::new();
        let key = canonical_key(&[2, 2]);
        cache.record_winning(4, key.clone());
        assert!(cache.is_winning(4, &key));
        assert!(!cache.is_winning(5, &key));
    }

    #[test]
    fn test_permuted_positions_hit() {
        let mut cache = VerdictCache::new();
        cache.record_losing(7, canonical_key(&[1, 1, 1, 1, 2, 3]));
        assert!(cache.is_losing(7, &canonical_key(&[3, 1, 2, 1, 1, 1])));
    }

    #[test]
    fn test_record_twice_is_idempotent() {
        let mut cache = VerdictCache::new();
        let key = canonical_key(&[2, 2, 2]);
        cache.record_losing(6, key.clone());
        cache.record_losing(6, key);
        assert_eq!(cache.losing_len(), 1);
    }

    #[test]
    fn test_losing_keys_sorted() {
        let mut cache = VerdictCache::new();
        cache.record_losing(12, canonical_key(&[2, 2, 2, 2, 2, 2]));
        cache.record_losing(6, canonical_key(&[1, 1, 1, 1, 1, 1]));
        let keys = cache.losing_keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].0, 6);
        assert_eq!(keys[1].0, 12);
    }

    #[test]
    fn test_store_through_mut_ref() {
        fn record<S: VerdictStore>(mut store: S) {
            store.record_winning(20, canonical_key(&[4, 4, 4, 4, 4]));
        }

        let mut cache = VerdictCache::new();
        record(&mut cache);
        assert_eq!(cache.winning_len(), 1);
        assert_eq!(cache.winning_buckets().collect::<Vec<_>>(), vec![20]);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "already recorded as losing")]
    fn test_conflicting_record_panics_in_debug() {
        let mut cache = VerdictCache::new();
        let key = canonical_key(&[1, 1, 1]);
        cache.record_losing(3, key.clone());
        cache.record_winning(3, key);
    }
}
