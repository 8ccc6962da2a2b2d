//! Search statistics tracking.

use serde::Serialize;
use tracing::debug;

/// Statistics collected during one analysis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    /// Nodes entered by the search (including cache hits)
    pub nodes_visited: u64,

    /// Nodes answered by the losing cache
    pub losing_hits: u64,

    /// Nodes answered by the winning cache
    pub winning_hits: u64,

    /// Nodes answered by the closed-form classifier
    pub closed_form: u64,

    /// Positions newly recorded as losing
    pub losing_recorded: u64,

    /// Positions newly recorded as winning
    pub winning_recorded: u64,

    /// Maximum recursion depth reached (root is 0)
    pub max_depth: u32,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes answered without expanding moves.
    pub fn shortcuts(&self) -> u64 {
        self.losing_hits + self.winning_hits + self.closed_form
    }

    /// Add another run's counters into this one.
    pub fn absorb(&mut self, other: &SearchStats) {
        self.nodes_visited += other.nodes_visited;
        self.losing_hits += other.losing_hits;
        self.winning_hits += other.winning_hits;
        self.closed_form += other.closed_form;
        self.losing_recorded += other.losing_recorded;
        self.winning_recorded += other.winning_recorded;
        self.max_depth = self.max_depth.max(other.max_depth);
    }

    /// Emit a one-line summary at debug level.
    pub fn log_summary(&self) {
        debug!(
            nodes = self.nodes_visited,
            losing_hits = self.losing_hits,
            winning_hits = self.winning_hits,
            closed_form = self.closed_form,
            losing_recorded = self.losing_recorded,
            winning_recorded = self.winning_recorded,
            max_depth = self.max_depth,
            "search finished"
        );
    }
}
