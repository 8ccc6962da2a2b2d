//! Depth-first win/loss analyzer with a canonical-position cache.
//!
//! Each node of the search is handled in this order:
//!
//! 1. Losing cache hit: LOSS.
//! 2. Winning cache hit (positions above the large-position threshold): WIN.
//! 3. An empty bush and at most five nonempty ones: the closed-form
//!    classifier decides.
//! 4. Single-bush moves, then two-bush moves: the first child that is a
//!    LOSS makes this node a WIN.
//! 5. No losing child: LOSS, recorded in the losing cache.
//!
//! Losing positions are cached at every size. Winning positions are only
//! cached above the threshold, where re-verifying them gets expensive.
//! Classifier answers are never cached.
//!
//! The root never answers from the winning cache or from a classifier WIN:
//! it always expands moves so that a winning verdict carries a witness.
//!
//! The search runs on an explicit stack of frames, one per level, so depth
//! is bounded by memory rather than the thread stack.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cache::{VerdictCache, VerdictStore};
use crate::canonical::CanonicalKey;
use crate::classify::{classify, Outcome};
use crate::movegen::MoveGenerator;
use crate::stats::SearchStats;
use crate::{Move, Position};

/// Buckets above this total rose count get their winning results cached.
pub const LARGE_POSITION_THRESHOLD: u64 = 18;

/// How often (in nodes) the cancellation flag and deadline are polled.
const POLL_INTERVAL: u64 = 1024;

/// Optional bounds on a single analysis. All unbounded by default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Maximum number of nodes entered
    pub max_nodes: Option<u64>,
    /// Maximum recursion depth (root is 0)
    pub max_depth: Option<u32>,
    /// Wall-clock budget in milliseconds
    pub time_budget_ms: Option<u64>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_nodes.is_none() && self.max_depth.is_none() && self.time_budget_ms.is_none()
    }
}

/// Analyzer settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Use the closed-form classifier for positions with an empty bush.
    /// Disabling it forces a full search everywhere (for cross-checking).
    pub closed_form: bool,
    /// Winning results are cached only for buckets above this.
    pub winning_cache_threshold: u64,
    pub limits: SearchLimits,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            closed_form: true,
            winning_cache_threshold: LARGE_POSITION_THRESHOLD,
            limits: SearchLimits::default(),
        }
    }
}

/// Which limit stopped a search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exhaustion {
    NodeBudget,
    DepthCap,
    Deadline,
    Cancelled,
}

impl fmt::Display for Exhaustion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Exhaustion::NodeBudget => "node budget exhausted",
            Exhaustion::DepthCap => "depth cap reached",
            Exhaustion::Deadline => "time budget exhausted",
            Exhaustion::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The search hit a limit before reaching a verdict.
    #[error("analysis inconclusive: {reason} after {nodes_visited} nodes")]
    Inconclusive {
        reason: Exhaustion,
        nodes_visited: u64,
    },
}

/// Result of analyzing a position for the player to move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub is_winning: bool,
    /// Position to move to: one legal move away and lost for the opponent.
    /// Present for every winning verdict, absent for losing ones.
    pub witness_move: Option<Position>,
}

impl Verdict {
    pub fn loss() -> Self {
        Verdict {
            is_winning: false,
            witness_move: None,
        }
    }

    pub fn win(witness: Position) -> Self {
        Verdict {
            is_winning: true,
            witness_move: Some(witness),
        }
    }

    pub fn outcome(&self) -> Outcome {
        if self.is_winning {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    /// The move from `from` that reaches the witness position.
    pub fn suggested_move(&self, from: &Position) -> Option<Move> {
        self.witness_move.as_ref().and_then(|w| from.move_to(w))
    }
}

/// Where a node sits relative to the top-level query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    /// The queried position
    Root,
    /// A child of the root: reported as the witness if it is a LOSS
    WitnessCandidate,
    Interior,
}

impl Role {
    fn child(self) -> Role {
        match self {
            Role::Root => Role::WitnessCandidate,
            Role::WitnessCandidate | Role::Interior => Role::Interior,
        }
    }
}

/// Stack frame for the iterative search: a node whose moves are being
/// expanded.
struct Frame {
    /// Move that led here from the parent (None for the root)
    via: Option<Move>,
    role: Role,
    depth: u32,
    bucket: u64,
    key: CanonicalKey,
    /// Above the winning-cache threshold
    large: bool,
    /// The classifier already decided this node (root only)
    classified: bool,
    /// Moves still to try
    moves: MoveGenerator,
}

/// What entering a node produced.
enum Step {
    /// Answered without expanding
    Decided(Outcome),
    Expand(Frame),
}

/// Depth-first analyzer owning its verdict store.
///
/// A fresh `Analyzer` starts with empty caches. Reusing one across calls
/// keeps everything it has learned; game values never change, so this is
/// always sound.
pub struct Analyzer<S: VerdictStore = VerdictCache> {
    store: S,
    config: AnalyzerConfig,
    /// Cleared by another thread to abandon the search
    running: Option<Arc<AtomicBool>>,
    stats: SearchStats,
    witness: Option<Position>,
    deadline: Option<Instant>,
}

impl Analyzer<VerdictCache> {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_store(VerdictCache::new(), config)
    }
}

impl Default for Analyzer<VerdictCache> {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl<S: VerdictStore> Analyzer<S> {
    /// Analyzer backed by a caller-provided store (e.g. `&mut VerdictCache`
    /// shared across analyzers).
    pub fn with_store(store: S, config: AnalyzerConfig) -> Self {
        Self {
            store,
            config,
            running: None,
            stats: SearchStats::default(),
            witness: None,
            deadline: None,
        }
    }

    /// Abandon the search with [`Exhaustion::Cancelled`] once `running` is
    /// cleared.
    pub fn with_cancel_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Statistics of the most recent analysis.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Decide the position for the player to move.
    ///
    /// On a win the verdict names the first position, in move generation
    /// order, that leaves the opponent lost.
    #[instrument(level = "debug", skip(self), fields(bucket = position.bucket()))]
    pub fn analyze(&mut self, position: &Position) -> Result<Verdict, AnalysisError> {
        self.stats = SearchStats::default();
        self.witness = None;
        self.deadline = self
            .config
            .limits
            .time_budget_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let mut root = position.clone();
        let result = self.search(&mut root);
        self.stats.log_summary();

        match result {
            Ok(Outcome::Win) => {
                debug_assert!(self.witness.is_some(), "winning root without witness");
                Ok(Verdict {
                    is_winning: true,
                    witness_move: self.witness.take(),
                })
            }
            Ok(Outcome::Loss) => Ok(Verdict::loss()),
            Err(reason) => {
                debug!(%reason, nodes = self.stats.nodes_visited, "search abandoned");
                Err(AnalysisError::Inconclusive {
                    reason,
                    nodes_visited: self.stats.nodes_visited,
                })
            }
        }
    }

    /// Iterative depth-first search over an explicit frame stack.
    ///
    /// Depth grows with the largest bush, so native recursion is not an
    /// option. `position` is left modified if a limit stops the search.
    fn search(&mut self, position: &mut Position) -> Result<Outcome, Exhaustion> {
        let root = match self.enter(position, Role::Root, 0, None)? {
            Step::Decided(outcome) => return Ok(outcome),
            Step::Expand(frame) => frame,
        };

        let mut stack: Vec<Frame> = Vec::with_capacity(64);
        stack.push(root);
        // Outcome of the child that just finished, for the frame on top
        let mut finished: Option<Outcome> = None;

        loop {
            let Some(frame) = stack.last_mut() else {
                unreachable!("search stack emptied before the root resolved");
            };

            let outcome = if finished.take() == Some(Outcome::Loss) {
                Outcome::Win
            } else if let Some(mov) = frame.moves.next(position) {
                let role = frame.role.child();
                let depth = frame.depth + 1;
                position.apply(mov);
                match self.enter(position, role, depth, Some(mov))? {
                    Step::Decided(outcome) => {
                        position.undo(mov);
                        finished = Some(outcome);
                    }
                    Step::Expand(child) => stack.push(child),
                }
                continue;
            } else {
                Outcome::Loss
            };

            let Some(frame) = stack.pop() else {
                unreachable!("search stack emptied before the root resolved");
            };
            let via = frame.via;
            self.resolve(position, frame, outcome);
            if let Some(mov) = via {
                position.undo(mov);
            }
            if stack.is_empty() {
                return Ok(outcome);
            }
            finished = Some(outcome);
        }
    }

    /// Charge a node and try every shortcut before expanding it.
    fn enter(
        &mut self,
        position: &Position,
        role: Role,
        depth: u32,
        via: Option<Move>,
    ) -> Result<Step, Exhaustion> {
        self.charge(depth)?;

        let bucket = position.bucket();
        let key = position.canonical();

        if self.store.is_losing(bucket, &key) {
            self.stats.losing_hits += 1;
            self.note_loss(position, role);
            return Ok(Step::Decided(Outcome::Loss));
        }

        let large = bucket > self.config.winning_cache_threshold;
        if large && role != Role::Root && self.store.is_winning(bucket, &key) {
            self.stats.winning_hits += 1;
            return Ok(Step::Decided(Outcome::Win));
        }

        let classified = if self.config.closed_form {
            classify(position.counts())
        } else {
            None
        };
        match (classified, role) {
            (Some(Outcome::Loss), _) => {
                self.stats.closed_form += 1;
                self.note_loss(position, role);
                return Ok(Step::Decided(Outcome::Loss));
            }
            // The root still expands to find its witness
            (Some(Outcome::Win), Role::Root) => self.stats.closed_form += 1,
            (Some(Outcome::Win), _) => {
                self.stats.closed_form += 1;
                return Ok(Step::Decided(Outcome::Win));
            }
            (None, _) => {}
        }

        Ok(Step::Expand(Frame {
            via,
            role,
            depth,
            bucket,
            key,
            large,
            classified: classified.is_some(),
            moves: MoveGenerator::new(position),
        }))
    }

    /// Record the outcome of an expanded node. `position` is that node.
    fn resolve(&mut self, position: &Position, frame: Frame, outcome: Outcome) {
        match outcome {
            Outcome::Win => {
                if frame.large && !frame.classified {
                    self.store.record_winning(frame.bucket, frame.key);
                    self.stats.winning_recorded += 1;
                }
            }
            Outcome::Loss => {
                if frame.classified {
                    // Only reachable at the root: the classifier called it a
                    // win but no move reaches a loss.
                    warn!(position = %position, "closed form disagrees with move expansion");
                } else {
                    self.store.record_losing(frame.bucket, frame.key);
                    self.stats.losing_recorded += 1;
                }
                self.note_loss(position, frame.role);
            }
        }
    }

    /// A losing child of the root is itself the move to make.
    #[inline]
    fn note_loss(&mut self, position: &Position, role: Role) {
        if role == Role::WitnessCandidate {
            self.witness = Some(position.clone());
        }
    }

    /// Count a node and enforce the limits.
    fn charge(&mut self, depth: u32) -> Result<(), Exhaustion> {
        self.stats.nodes_visited += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let limits = &self.config.limits;
        if limits.max_nodes.is_some_and(|max| self.stats.nodes_visited > max) {
            return Err(Exhaustion::NodeBudget);
        }
        if limits.max_depth.is_some_and(|max| depth > max) {
            return Err(Exhaustion::DepthCap);
        }

        if self.stats.nodes_visited % POLL_INTERVAL == 1 {
            if let Some(running) = &self.running {
                if !running.load(Ordering::SeqCst) {
                    return Err(Exhaustion::Cancelled);
                }
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(Exhaustion::Deadline);
                }
            }
        }
        Ok(())
    }
}

/// Analyze a position with fresh caches and no limits.
pub fn analyze(position: &Position) -> Verdict {
    match Analyzer::default().analyze(position) {
        Ok(verdict) => verdict,
        Err(err) => unreachable!("unbounded analysis cannot stop early: {}", err),
    }
}
