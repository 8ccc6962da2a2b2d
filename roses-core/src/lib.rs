//! Roses take-away game logic and win/loss analyzer.
//!
//! # Game
//!
//! ```text
//! A position is one pile ("bush") of roses per color:
//!
//!   red  blue  green  purple  orange  cyan
//!    5     5     5      5       0      0
//!
//! A move takes one rose from one bush, or one rose each from two
//! different nonempty bushes. The player who takes the last rose wins.
//! ```
//!
//! # Analysis
//!
//! [`analyze`] decides whether the player to move has a forced win and, if
//! so, returns the position to move to. The search canonicalizes positions
//! (color order is irrelevant to game value), caches losing positions, and
//! short-circuits any position with an empty bush through a closed-form
//! parity classifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod analyzer;
pub mod cache;
pub mod canonical;
pub mod classify;
pub mod movegen;
pub mod stats;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use analyzer::{
    analyze, AnalysisError, Analyzer, AnalyzerConfig, Exhaustion, SearchLimits, Verdict,
};
pub use cache::{VerdictCache, VerdictStore};
pub use canonical::{bucket_of, canonical_key, CanonicalKey};
pub use classify::{classify, parity_pattern, Outcome};
pub use movegen::MoveGenerator;
pub use stats::SearchStats;

/// Rose color. The discriminant is the bush index in a standard position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Blue = 1,
    Green = 2,
    Purple = 3,
    Orange = 4,
    Cyan = 5,
}

impl Color {
    /// All colors in bush order.
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Purple,
        Color::Orange,
        Color::Cyan,
    ];

    /// Convert from bush index (0-5) to Color.
    #[inline]
    pub fn from_index(idx: usize) -> Option<Color> {
        Self::ALL.get(idx).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Orange => "orange",
            Color::Cyan => "cyan",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error building a position from untrusted input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("bush {index} has negative count {value}")]
    Negative { index: usize, value: i64 },
    #[error("bush {index} has non-integer count {value}")]
    NotAnInteger { index: usize, value: f64 },
    #[error("bush {index} count {value} is too large")]
    TooLarge { index: usize, value: i64 },
    #[error("cannot parse bush {index} count from {token:?}")]
    Parse { index: usize, token: String },
}

/// Error applying a move that is not legal in the given position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("bush {pile} does not exist (position has {piles} bushes)")]
    PileOutOfRange { pile: usize, piles: usize },
    #[error("bush {pile} is empty")]
    EmptyPile { pile: usize },
    #[error("a two-bush move must name two different bushes, got {pile} twice")]
    SamePile { pile: usize },
}

/// A move in the game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Move {
    /// Take one rose from a single bush.
    Single(usize),
    /// Take one rose from each of two different bushes (first index is lower).
    Pair(usize, usize),
}

impl Move {
    /// Build a two-bush move, normalizing the index order.
    #[inline]
    pub fn pair(a: usize, b: usize) -> Move {
        if a <= b {
            Move::Pair(a, b)
        } else {
            Move::Pair(b, a)
        }
    }

    /// Bushes touched by this move.
    pub fn piles(&self) -> impl Iterator<Item = usize> {
        let (first, second) = match *self {
            Move::Single(i) => (i, None),
            Move::Pair(i, j) => (i, Some(j)),
        };
        std::iter::once(first).chain(second)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |i: usize| match Color::from_index(i) {
            Some(color) => color.name().to_string(),
            None => format!("bush {}", i),
        };
        match *self {
            Move::Single(i) => write!(f, "take 1 {}", label(i)),
            Move::Pair(i, j) => write!(f, "take 1 {} and 1 {}", label(i), label(j)),
        }
    }
}

/// Rose counts, one per bush, in color order.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(Vec<u32>);

impl Position {
    /// Create a position from trusted counts.
    pub fn new(counts: Vec<u32>) -> Position {
        Position(counts)
    }

    /// The opening position of the standard game: four colors with five
    /// roses each, orange and cyan empty.
    pub fn standard() -> Position {
        Position(vec![5, 5, 5, 5, 0, 0])
    }

    /// All bushes empty.
    pub fn empty(piles: usize) -> Position {
        Position(vec![0; piles])
    }

    /// Validate signed counts at the boundary.
    pub fn from_signed(counts: &[i64]) -> Result<Position, PositionError> {
        counts
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                if value < 0 {
                    return Err(PositionError::Negative { index, value });
                }
                u32::try_from(value).map_err(|_| PositionError::TooLarge { index, value })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Position)
    }

    /// Validate floating point counts (e.g. JavaScript numbers).
    pub fn from_f64s(counts: &[f64]) -> Result<Position, PositionError> {
        let mut signed = Vec::with_capacity(counts.len());
        for (index, &value) in counts.iter().enumerate() {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(PositionError::NotAnInteger { index, value });
            }
            if value > i64::MAX as f64 || value < i64::MIN as f64 {
                return Err(PositionError::NotAnInteger { index, value });
            }
            signed.push(value as i64);
        }
        Position::from_signed(&signed)
    }

    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.0
    }

    pub fn into_counts(self) -> Vec<u32> {
        self.0
    }

    /// Number of bushes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count in bush `pile`, or None if out of range.
    #[inline]
    pub fn get(&self, pile: usize) -> Option<u32> {
        self.0.get(pile).copied()
    }

    /// True when no rose is left (the player to move has lost).
    pub fn is_terminal(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// True when at least one bush is empty.
    #[inline]
    pub fn has_empty_pile(&self) -> bool {
        self.0.contains(&0)
    }

    /// Total number of roses (the cache bucket index).
    #[inline]
    pub fn bucket(&self) -> u64 {
        canonical::bucket_of(&self.0)
    }

    /// Order-independent cache key.
    pub fn canonical(&self) -> CanonicalKey {
        canonical::canonical_key(&self.0)
    }

    /// Check that `mov` is legal here.
    pub fn check(&self, mov: Move) -> Result<(), MoveError> {
        let piles = self.0.len();
        if let Move::Pair(i, j) = mov {
            if i == j {
                return Err(MoveError::SamePile { pile: i });
            }
        }
        for pile in mov.piles() {
            match self.0.get(pile) {
                None => return Err(MoveError::PileOutOfRange { pile, piles }),
                Some(0) => return Err(MoveError::EmptyPile { pile }),
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Apply a move in place. The move must be legal (see [`Position::check`]).
    #[inline]
    pub fn apply(&mut self, mov: Move) {
        debug_assert!(self.check(mov).is_ok(), "illegal move {:?} in {:?}", mov, self);
        for pile in mov.piles() {
            self.0[pile] -= 1;
        }
    }

    /// Revert a move made with [`Position::apply`].
    #[inline]
    pub fn undo(&mut self, mov: Move) {
        for pile in mov.piles() {
            self.0[pile] += 1;
        }
    }

    /// Validated move application returning the resulting position.
    pub fn try_apply(&self, mov: Move) -> Result<Position, MoveError> {
        self.check(mov)?;
        let mut next = self.clone();
        next.apply(mov);
        Ok(next)
    }

    /// All legal moves in search order.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut gen = MoveGenerator::new(self);
        while let Some(mov) = gen.next(self) {
            moves.push(mov);
        }
        moves
    }

    /// Find the move that turns `self` into `next`, if one exists.
    pub fn move_to(&self, next: &Position) -> Option<Move> {
        if self.len() != next.len() {
            return None;
        }
        let mut taken = Vec::with_capacity(2);
        for (i, (&a, &b)) in self.0.iter().zip(next.0.iter()).enumerate() {
            if a == b {
                continue;
            }
            if b.checked_add(1) != Some(a) || taken.len() == 2 {
                return None;
            }
            taken.push(i);
        }
        match taken.as_slice() {
            [i] => Some(Move::Single(*i)),
            [i, j] => Some(Move::Pair(*i, *j)),
            _ => None,
        }
    }
}

impl From<Vec<u32>> for Position {
    fn from(counts: Vec<u32>) -> Self {
        Position(counts)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}

/// Parse counts separated by commas and/or whitespace, with optional
/// surrounding brackets: `"5 5 5 5 0 0"`, `"[5, 5, 5, 5, 0, 0]"`.
impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');
        let mut signed = Vec::new();
        for (index, token) in trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .enumerate()
        {
            let value: i64 = token.parse().map_err(|_| PositionError::Parse {
                index,
                token: token.to_string(),
            })?;
            signed.push(value);
        }
        Position::from_signed(&signed)
    }
}
