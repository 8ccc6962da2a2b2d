//! Closed-form classifier for positions with an empty bush.
//!
//! Once a bush is empty the game reduces to a take-one-or-two-colors game on
//! at most five active bushes, whose losing positions are known by parity:
//!
//! ```text
//! nonzero counts, sorted descending, zero-padded to 5, mod 2
//!
//!   [0,0,0,0,0]   [1,1,1,0,0]   [0,1,1,1,1]   [1,0,0,1,1]   => LOSS
//!   anything else                                           => WIN
//! ```
//!
//! The patterns are order-sensitive: counts are sorted before reduction.
//! Positions with more than five nonempty bushes are left to the search,
//! even when some other bush is empty.

use serde::{Deserialize, Serialize};

/// Width the parity pattern is padded to.
pub const PATTERN_WIDTH: usize = 5;

/// Parity patterns that lose for the player to move.
pub const LOSING_PATTERNS: [[u8; PATTERN_WIDTH]; 4] = [
    [0, 0, 0, 0, 0],
    [1, 1, 1, 0, 0],
    [0, 1, 1, 1, 1],
    [1, 0, 0, 1, 1],
];

/// Game value for the player to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    #[inline]
    pub fn is_win(self) -> bool {
        self == Outcome::Win
    }
}

/// Parity pattern of the nonzero counts: sorted descending, padded with
/// zeros to [`PATTERN_WIDTH`], each entry mod 2.
///
/// With more than [`PATTERN_WIDTH`] nonzero counts the pattern is longer
/// than any losing pattern.
pub fn parity_pattern(counts: &[u32]) -> Vec<u8> {
    let mut active: Vec<u32> = counts.iter().copied().filter(|&c| c > 0).collect();
    active.sort_unstable_by(|a, b| b.cmp(a));
    if active.len() < PATTERN_WIDTH {
        active.resize(PATTERN_WIDTH, 0);
    }
    active.into_iter().map(|c| (c % 2) as u8).collect()
}

/// Classify a position that has at least one empty bush and at most
/// [`PATTERN_WIDTH`] nonempty ones.
///
/// Returns None otherwise; such positions need the full search.
pub fn classify(counts: &[u32]) -> Option<Outcome> {
    if !counts.contains(&0) {
        return None;
    }
    let pattern = parity_pattern(counts);
    if pattern.len() > PATTERN_WIDTH {
        return None;
    }
    let losing = LOSING_PATTERNS.iter().any(|p| p[..] == pattern[..]);
    Some(if losing { Outcome::Loss } else { Outcome::Win })
}
