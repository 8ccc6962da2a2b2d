//! Position canonicalization.
//!
//! Game value depends only on the multiset of bush counts, never on which
//! color holds which count. The cache therefore keys positions by their
//! counts sorted ascending, partitioned by total rose count (the bucket).
//! Every move strictly lowers the bucket, so a bucket never needs to be
//! revisited once the search has moved below it.

use serde::{Deserialize, Serialize};

/// Order-independent position key: counts sorted ascending.
#[derive(Clone, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(Vec<u32>);

impl CanonicalKey {
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.0
    }
}

/// Sum of all counts. Zero means the game is over.
#[inline]
pub fn bucket_of(counts: &[u32]) -> u64 {
    counts.iter().map(|&c| c as u64).sum()
}

/// Canonical key for a count vector.
pub fn canonical_key(counts: &[u32]) -> CanonicalKey {
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();
    CanonicalKey(sorted)
}
