//! Lazy move generator.
//!
//! Produces moves one at a time, tracking its state to resume where it left
//! off, so the search never materializes a move list per node.

use crate::{Move, Position};

/// Lazy move generator that produces moves on demand.
///
/// Generates moves in order:
/// 1. Single-bush moves, by increasing bush index
/// 2. Two-bush moves, by increasing (first, second) index pair
///
/// The search returns the first winning move it meets, so this order decides
/// which witness is reported.
pub struct MoveGenerator {
    /// Current phase of generation
    phase: MoveGenPhase,
    /// Number of bushes
    piles: usize,
    /// Next bush for single moves, first bush for pair moves
    first: usize,
    /// Second bush for pair moves
    second: usize,
}

#[derive(Clone, Copy, PartialEq, Debug)]
enum MoveGenPhase {
    Singles,
    Pairs,
    Done,
}

impl MoveGenerator {
    /// Create a new move generator for the given position.
    pub fn new(position: &Position) -> Self {
        Self {
            phase: MoveGenPhase::Singles,
            piles: position.len(),
            first: 0,
            second: 1,
        }
    }

    /// Get the next legal move, or None if exhausted.
    ///
    /// `position` must be the position the generator was created for, in the
    /// same state (callers undo a move before asking for the next one).
    pub fn next(&mut self, position: &Position) -> Option<Move> {
        loop {
            match self.phase {
                MoveGenPhase::Singles => {
                    if let Some(mov) = self.next_single(position) {
                        return Some(mov);
                    }
                    self.phase = MoveGenPhase::Pairs;
                    self.first = 0;
                    self.second = 1;
                }
                MoveGenPhase::Pairs => {
                    if let Some(mov) = self.next_pair(position) {
                        return Some(mov);
                    }
                    self.phase = MoveGenPhase::Done;
                    return None;
                }
                MoveGenPhase::Done => return None,
            }
        }
    }

    fn next_single(&mut self, position: &Position) -> Option<Move> {
        let counts = position.counts();
        while self.first < self.piles {
            let pile = self.first;
            self.first += 1;
            if counts[pile] > 0 {
                return Some(Move::Single(pile));
            }
        }
        None
    }

    fn next_pair(&mut self, position: &Position) -> Option<Move> {
        let counts = position.counts();
        while self.first < self.piles {
            if counts[self.first] == 0 {
                // Nothing pairs with an empty bush
                self.first += 1;
                self.second = self.first + 1;
                continue;
            }

            while self.second < self.piles {
                let second = self.second;
                self.second += 1;
                if counts[second] > 0 {
                    return Some(Move::Pair(self.first, second));
                }
            }

            self.first += 1;
            self.second = self.first + 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(position: &Position) -> Vec<Move> {
        let mut gen = MoveGenerator::new(position);
        let mut moves = Vec::new();
        while let Some(mov) = gen.next(position) {
            moves.push(mov);
        }
        moves
    }

    #[test]
    fn test_standard_position_move_count() {
        // 4 nonempty bushes: 4 singles + C(4,2) pairs
        assert_eq!(collect(&Position::standard()).len(), 4 + 6);
    }

    #[test]
    fn test_full_six_bushes_move_count() {
        let pos = Position::new(vec![1; 6]);
        assert_eq!(collect(&pos).len(), 6 + 15);
    }

    #[test]
    fn test_order_singles_then_pairs() {
        let pos = Position::new(vec![1, 0, 2, 3]);
        assert_eq!(
            collect(&pos),
            vec![
                Move::Single(0),
                Move::Single(2),
                Move::Single(3),
                Move::Pair(0, 2),
                Move::Pair(0, 3),
                Move::Pair(2, 3),
            ]
        );
    }

    #[test]
    fn test_terminal_has_no_moves() {
        assert!(collect(&Position::empty(6)).is_empty());
        assert!(collect(&Position::default()).is_empty());
    }

    #[test]
    fn test_single_bush_has_no_pairs() {
        let pos = Position::new(vec![0, 0, 7, 0]);
        assert_eq!(collect(&pos), vec![Move::Single(2)]);
    }

    #[test]
    fn test_exhausted_generator_stays_exhausted() {
        let pos = Position::new(vec![1]);
        let mut gen = MoveGenerator::new(&pos);
        assert_eq!(gen.next(&pos), Some(Move::Single(0)));
        assert_eq!(gen.next(&pos), None);
        assert_eq!(gen.next(&pos), None);
    }

    #[test]
    fn test_generator_moves_are_legal() {
        use rand::prelude::*;

        let mut rng = rand::rng();

        for _ in 0..100 {
            let counts: Vec<u32> = (0..6).map(|_| rng.random_range(0..4)).collect();
            let pos = Position::new(counts);
            let moves = collect(&pos);

            let nonempty = pos.counts().iter().filter(|&&c| c > 0).count();
            assert_eq!(moves.len(), nonempty + nonempty * nonempty.saturating_sub(1) / 2);

            for mov in &moves {
                assert!(pos.check(*mov).is_ok(), "Generator produced illegal move: {:?}", mov);
            }
        }
    }
}
