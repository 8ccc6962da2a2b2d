//! Sweep statistics tracking.

use std::time::Instant;

use roses_core::{Outcome, SearchStats};
use tracing::info;

/// Statistics collected during a sweep.
#[derive(Debug, Default)]
pub struct SweepStats {
    /// Positions that reached a verdict
    pub positions_analyzed: u64,

    /// Breakdown of verdicts
    pub wins: u64,
    pub losses: u64,

    /// Positions abandoned at a search limit
    pub inconclusive: u64,

    /// Verdicts that changed with the closed form disabled
    pub disagreements: u64,

    /// Search counters summed over every analysis
    pub search: SearchStats,

    /// For rate calculation
    start_time: Option<Instant>,
    last_log_time: Option<Instant>,
    last_log_positions: u64,
}

impl SweepStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            last_log_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Record one finished analysis
    pub fn record(&mut self, outcome: Outcome, search: &SearchStats) {
        self.positions_analyzed += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
        }
        self.search.absorb(search);
    }

    /// Record an analysis that hit a limit
    pub fn record_inconclusive(&mut self, search: &SearchStats) {
        self.inconclusive += 1;
        self.search.absorb(search);
    }

    /// Get current positions per second
    pub fn positions_per_sec(&self) -> f64 {
        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                return self.positions_analyzed as f64 / elapsed;
            }
        }
        0.0
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        if let Some(last) = self.last_log_time {
            last.elapsed().as_secs() >= interval_secs
        } else {
            true
        }
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self, total: u64, cache_size: usize) {
        let now = Instant::now();
        let elapsed_total = self.start_time.map(|s| s.elapsed().as_secs()).unwrap_or(0);

        // Rate since last log
        let rate = if let Some(last) = self.last_log_time {
            let elapsed = last.elapsed().as_secs_f64();
            let positions = self.positions_analyzed - self.last_log_positions;
            if elapsed > 0.0 {
                positions as f64 / elapsed
            } else {
                0.0
            }
        } else {
            self.positions_per_sec()
        };

        let shortcut_pct = if self.search.nodes_visited > 0 {
            100.0 * self.search.shortcuts() as f64 / self.search.nodes_visited as f64
        } else {
            0.0
        };

        info!(
            "[{:02}:{:02}:{:02}] positions={}/{} cached={} nodes={} rate={:.1}/s shortcuts={:.1}% wins={} losses={} inconclusive={}",
            elapsed_total / 3600,
            (elapsed_total % 3600) / 60,
            elapsed_total % 60,
            self.positions_analyzed,
            total,
            cache_size,
            self.search.nodes_visited,
            rate,
            shortcut_pct,
            self.wins,
            self.losses,
            self.inconclusive,
        );

        self.last_log_time = Some(now);
        self.last_log_positions = self.positions_analyzed;
    }

    /// Log final summary
    pub fn log_summary(&self) {
        info!("Positions analyzed: {}", self.positions_analyzed);
        info!("  - Wins: {}", self.wins);
        info!("  - Losses: {}", self.losses);
        info!("Inconclusive: {}", self.inconclusive);
        info!("Disagreements: {}", self.disagreements);
        info!("Nodes visited: {}", self.search.nodes_visited);
        info!(
            "Cache hits: losing={} winning={}",
            self.search.losing_hits, self.search.winning_hits
        );
        info!("Closed-form decisions: {}", self.search.closed_form);
        info!("Max depth: {}", self.search.max_depth);

        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                info!(
                    "Average rate: {:.0} nodes/sec",
                    self.search.nodes_visited as f64 / elapsed
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tallies() {
        let mut stats = SweepStats::new();
        let search = SearchStats {
            nodes_visited: 10,
            closed_form: 4,
            ..SearchStats::default()
        };
        stats.record(Outcome::Win, &search);
        stats.record(Outcome::Loss, &search);
        stats.record_inconclusive(&search);

        assert_eq!(stats.positions_analyzed, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.inconclusive, 1);
        assert_eq!(stats.search.nodes_visited, 30);
        assert_eq!(stats.search.closed_form, 12);
    }

    #[test]
    fn test_should_log_respects_interval() {
        let mut stats = SweepStats::new();
        assert!(stats.should_log(0));
        assert!(!stats.should_log(3600));
        stats.log_progress(1, 0);
        assert!(!stats.should_log(3600));
    }

    #[test]
    fn test_default_always_logs() {
        let stats = SweepStats::default();
        assert!(stats.should_log(3600));
        assert_eq!(stats.positions_per_sec(), 0.0);
    }
}
