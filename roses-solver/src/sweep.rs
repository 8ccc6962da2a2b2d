//! Analyze every distinct position of a family.
//!
//! Positions are enumerated lazily, once per canonical key (counts sorted
//! ascending), and visited smallest total first, so a shared cache is filled
//! bottom-up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use roses_core::{
    AnalysisError, Analyzer, AnalyzerConfig, Exhaustion, Position, SearchStats, VerdictCache,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::stats::SweepStats;

/// Which positions to sweep and how.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub piles: usize,
    pub max_count: u32,
    pub shared_cache: bool,
    pub verify: bool,
    pub log_interval_secs: u64,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub piles: usize,
    pub max_count: u32,
    pub total: u64,
    pub analyzed: u64,
    pub wins: u64,
    pub losses: u64,
    pub losing: Vec<Position>,
    pub inconclusive: Vec<Position>,
    /// Positions whose verdict changed with the closed form disabled
    pub disagreements: Vec<Position>,
    pub cancelled: bool,
    pub search: SearchStats,
}

/// Number of distinct positions of `piles` bushes with counts in
/// `0..=max_count`: C(max_count + piles, piles), saturating at `u64::MAX`.
pub fn family_size(piles: usize, max_count: u32) -> u64 {
    let mut size: u128 = 1;
    for k in 1..=piles as u128 {
        size = size * (max_count as u128 + k) / k;
        if size > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    size as u64
}

/// Every sorted count vector of `piles` bushes with counts in `0..=max_count`,
/// ordered by total then lexicographically.
pub fn canonical_positions(piles: usize, max_count: u32) -> CanonicalPositions {
    CanonicalPositions {
        piles,
        max_count,
        bucket: 0,
        last_bucket: (piles as u64).saturating_mul(max_count as u64),
        current: smallest_with_total(piles, max_count, 0),
    }
}

/// Lazy enumeration behind [`canonical_positions`]. Holds one count vector
/// at a time.
#[derive(Debug, Clone)]
pub struct CanonicalPositions {
    piles: usize,
    max_count: u32,
    bucket: u64,
    last_bucket: u64,
    /// Next vector to yield in the current bucket
    current: Option<Vec<u32>>,
}

impl Iterator for CanonicalPositions {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        loop {
            let Some(counts) = self.current.as_mut() else {
                if self.bucket >= self.last_bucket {
                    return None;
                }
                self.bucket += 1;
                self.current = smallest_with_total(self.piles, self.max_count, self.bucket);
                continue;
            };

            let out = counts.clone();
            if !advance(counts, self.max_count) {
                self.current = None;
            }
            return Some(Position::new(out));
        }
    }
}

/// Lexicographically smallest sorted vector with the given total: the
/// roses are packed into the rightmost bushes.
fn smallest_with_total(piles: usize, max_count: u32, total: u64) -> Option<Vec<u32>> {
    if total > (piles as u64).saturating_mul(max_count as u64) {
        return None;
    }
    let mut counts = vec![0; piles];
    let mut left = total;
    for slot in counts.iter_mut().rev() {
        let take = left.min(max_count as u64);
        *slot = take as u32;
        left -= take;
    }
    Some(counts)
}

/// Step to the next sorted vector with the same total, in lexicographic
/// order. Returns false when `counts` was the last one.
fn advance(counts: &mut [u32], max_count: u32) -> bool {
    let n = counts.len();
    if n < 2 {
        return false;
    }

    // Sum of counts[i + 1..]
    let mut suffix = counts[n - 1] as u64;
    for i in (0..n - 1).rev() {
        let slots = (n - 1 - i) as u64;
        let value = counts[i].saturating_add(1);
        if counts[i] < max_count && suffix >= 1 && slots * value as u64 <= suffix - 1 {
            counts[i] = value;
            let mut extra = suffix - 1 - slots * value as u64;
            for slot in counts[i + 1..].iter_mut().rev() {
                let take = extra.min((max_count - value) as u64);
                *slot = value + take as u32;
                extra -= take;
            }
            return true;
        }
        suffix += counts[i] as u64;
    }
    false
}

/// Run a sweep. Stops early, with `cancelled` set, once `running` is cleared.
pub fn run(options: &SweepOptions, config: &AnalyzerConfig, running: Arc<AtomicBool>) -> SweepReport {
    let total = family_size(options.piles, options.max_count);
    info!(
        piles = options.piles,
        max_count = options.max_count,
        total,
        shared_cache = options.shared_cache,
        verify = options.verify,
        "starting sweep"
    );

    let verify_config = AnalyzerConfig {
        closed_form: false,
        ..config.clone()
    };

    let mut shared = VerdictCache::new();
    let mut stats = SweepStats::new();
    let mut losing = Vec::new();
    let mut inconclusive = Vec::new();
    let mut disagreements = Vec::new();
    let mut cancelled = false;

    for position in canonical_positions(options.piles, options.max_count) {
        if !running.load(Ordering::SeqCst) {
            cancelled = true;
            break;
        }

        let mut fresh = VerdictCache::new();
        let store = if options.shared_cache {
            &mut shared
        } else {
            &mut fresh
        };
        let mut analyzer =
            Analyzer::with_store(store, config.clone()).with_cancel_flag(running.clone());

        let verdict = match analyzer.analyze(&position) {
            Ok(verdict) => verdict,
            Err(AnalysisError::Inconclusive {
                reason: Exhaustion::Cancelled,
                ..
            }) => {
                cancelled = true;
                break;
            }
            Err(err) => {
                warn!(%position, "{}", err);
                stats.record_inconclusive(analyzer.stats());
                inconclusive.push(position);
                continue;
            }
        };
        stats.record(verdict.outcome(), analyzer.stats());

        if options.verify {
            let mut full = Analyzer::new(verify_config.clone()).with_cancel_flag(running.clone());
            match full.analyze(&position) {
                Ok(check) if check.is_winning != verdict.is_winning => {
                    warn!(
                        %position,
                        closed_form = verdict.is_winning,
                        full_search = check.is_winning,
                        "verdicts disagree"
                    );
                    stats.disagreements += 1;
                    disagreements.push(position.clone());
                }
                Ok(_) => {}
                Err(err) => warn!(%position, "verification skipped: {}", err),
            }
        }

        if !verdict.is_winning {
            losing.push(position);
        }

        if stats.should_log(options.log_interval_secs) {
            let cached = shared.losing_len() + shared.winning_len();
            stats.log_progress(total, cached);
        }
    }

    if cancelled {
        warn!(analyzed = stats.positions_analyzed, total, "sweep cancelled");
    }
    stats.log_summary();

    SweepReport {
        piles: options.piles,
        max_count: options.max_count,
        total,
        analyzed: stats.positions_analyzed,
        wins: stats.wins,
        losses: stats.losses,
        losing,
        inconclusive,
        disagreements,
        cancelled,
        search: stats.search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roses_core::{analyze, SearchLimits};

    fn options(piles: usize, max_count: u32) -> SweepOptions {
        SweepOptions {
            piles,
            max_count,
            shared_cache: false,
            verify: false,
            log_interval_secs: 3600,
        }
    }

    fn running() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn test_canonical_positions_two_bushes() {
        let counts: Vec<Vec<u32>> = canonical_positions(2, 2)
            .into_iter()
            .map(Position::into_counts)
            .collect();
        assert_eq!(
            counts,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 1],
                vec![1, 2],
                vec![2, 2],
            ]
        );
    }

    #[test]
    fn test_canonical_positions_count() {
        // Multisets of size 6 drawn from 5 values: C(10, 6)
        assert_eq!(canonical_positions(6, 4).count(), 210);
        assert_eq!(canonical_positions(5, 3).count(), 56);
        assert_eq!(canonical_positions(0, 3).count(), 1);
        assert_eq!(canonical_positions(3, 0).count(), 1);
        assert_eq!(family_size(6, 4), 210);
        assert_eq!(family_size(5, 3), 56);
        assert_eq!(family_size(0, 3), 1);
    }

    #[test]
    fn test_large_family_is_not_materialized() {
        assert_eq!(family_size(6, 100), 1_705_904_746);
        assert_eq!(family_size(64, u32::MAX), u64::MAX);

        let first: Vec<Vec<u32>> = canonical_positions(6, 100)
            .take(4)
            .map(Position::into_counts)
            .collect();
        assert_eq!(
            first,
            vec![
                vec![0, 0, 0, 0, 0, 0],
                vec![0, 0, 0, 0, 0, 1],
                vec![0, 0, 0, 0, 0, 2],
                vec![0, 0, 0, 0, 1, 1],
            ]
        );
    }

    #[test]
    fn test_lazy_order_matches_sorted_enumeration() {
        let mut expected: Vec<Vec<u32>> = Vec::new();
        for a in 0..=3u32 {
            for b in a..=3 {
                for c in b..=3 {
                    for d in c..=3 {
                        expected.push(vec![a, b, c, d]);
                    }
                }
            }
        }
        expected.sort_by_key(|counts| counts.iter().sum::<u32>());

        let lazy: Vec<Vec<u32>> = canonical_positions(4, 3)
            .map(Position::into_counts)
            .collect();
        assert_eq!(lazy, expected);
    }

    #[test]
    fn test_canonical_positions_are_sorted_and_ordered_by_total() {
        let positions: Vec<Position> = canonical_positions(4, 3).collect();
        for pair in positions.windows(2) {
            assert!(pair[0].bucket() <= pair[1].bucket());
        }
        for position in &positions {
            let counts = position.counts();
            assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_sweep_two_bushes() {
        let report = run(&options(2, 2), &AnalyzerConfig::default(), running());
        assert_eq!(report.total, 6);
        assert_eq!(report.analyzed, 6);
        assert_eq!(report.losses, 3);
        assert_eq!(report.wins, 3);
        let losing: Vec<Vec<u32>> = report.losing.into_iter().map(Position::into_counts).collect();
        assert_eq!(losing, vec![vec![0, 0], vec![0, 2], vec![2, 2]]);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_shared_cache_matches_fresh_analysis() {
        let mut opts = options(5, 2);
        opts.shared_cache = true;
        let report = run(&opts, &AnalyzerConfig::default(), running());
        assert_eq!(report.analyzed, report.total);

        for position in canonical_positions(5, 2) {
            let expected_losing = !analyze(&position).is_winning;
            assert_eq!(
                report.losing.contains(&position),
                expected_losing,
                "{}",
                position
            );
        }
    }

    #[test]
    fn test_verify_finds_no_disagreements() {
        let mut opts = options(5, 2);
        opts.verify = true;
        let report = run(&opts, &AnalyzerConfig::default(), running());
        assert!(report.disagreements.is_empty(), "{:?}", report.disagreements);
        assert_eq!(report.analyzed, report.total);
    }

    #[test]
    fn test_cancelled_sweep_stops() {
        let report = run(
            &options(3, 2),
            &AnalyzerConfig::default(),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(report.cancelled);
        assert_eq!(report.analyzed, 0);
        assert!(report.losing.is_empty());
    }

    #[test]
    fn test_node_budget_marks_inconclusive() {
        let config = AnalyzerConfig {
            closed_form: false,
            limits: SearchLimits {
                max_nodes: Some(1),
                ..SearchLimits::default()
            },
            ..AnalyzerConfig::default()
        };
        let report = run(&options(2, 1), &config, running());
        // Only the terminal position fits in one node
        assert_eq!(report.analyzed, 1);
        assert_eq!(report.inconclusive.len(), 2);
        assert!(!report.cancelled);
    }
}
