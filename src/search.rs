//! Expectiminimax search over dice outcomes.
//!
//! The tree alternates two kinds of layers:
//! - chance nodes, which average over the 21 distinct rolls weighted by their
//!   frequency out of 36, and
//! - move layers, which pick the best (or worst) distinct resulting position
//!   for one roll, with alpha-beta bounds.
//!
//! Bounds are inherited: each chance node receives the window of the move
//! layer above it and hands it to the move layers below, which cut off once
//! `beta <= alpha`. The root raises alpha to the best candidate score so far.
//! Averaging at chance nodes makes these cutoffs approximate, so a pruned
//! search can pick a different move than [`WindowMode::Exhaustive`].
//!
//! Scores are always from the searching agent's point of view. Each
//! [`Agent::get_best_move`] call owns its bookkeeping; nothing is cached
//! between calls.

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::board::{Board, Color, Move};
use crate::constants::{DEFAULT_DEPTH, DICE_OUTCOMES, PHYSICAL_ROLLS, STUCK_PENALTY};
use crate::eval::Evaluator;
use crate::movegen::{generate_unique_states, roll_values};

/// How alpha-beta bounds flow between the outcomes of one chance node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WindowMode {
    /// One window per chance node, starting from the inherited bounds and
    /// tightened by all 21 outcome branches in order.
    #[default]
    Shared,
    /// Every outcome branch starts from its own copy of the inherited bounds.
    /// Outcomes are searched concurrently when the `parallel` feature is
    /// enabled.
    PerOutcome,
    /// No cutoffs; every branch is expanded.
    Exhaustive,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Plies searched after the agent's own move.
    pub depth: u32,
    pub window: WindowMode,
    /// Abandon the search after this long and return no move.
    pub deadline: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            window: WindowMode::default(),
            deadline: None,
        }
    }
}

impl SearchConfig {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_window(mut self, window: WindowMode) -> Self {
        self.window = window;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Statistics from the most recent search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Root candidates considered.
    pub candidates: usize,
    /// Move-layer positions expanded.
    pub nodes: u64,
    /// Chance nodes expanded.
    pub chance_nodes: u64,
    pub best_score: Option<i32>,
    /// True if the deadline expired and the result was discarded.
    pub aborted: bool,
}

#[derive(Copy, Clone, Debug)]
struct Window {
    alpha: i32,
    beta: i32,
}

impl Window {
    fn full() -> Self {
        Self {
            alpha: i32::MIN,
            beta: i32::MAX,
        }
    }
}

/// Per-call search bookkeeping, shared by all branches of one search.
struct SearchContext {
    deadline: Option<Instant>,
    aborted: AtomicBool,
    nodes: AtomicU64,
    chance_nodes: AtomicU64,
}

impl SearchContext {
    fn new(limit: Option<Duration>) -> Self {
        Self {
            deadline: limit.map(|d| Instant::now() + d),
            aborted: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            chance_nodes: AtomicU64::new(0),
        }
    }

    fn should_stop(&self) -> bool {
        if self.aborted.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.aborted.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }
}

/// A search agent playing one color with a fixed evaluator.
#[derive(Clone, Debug)]
pub struct Agent {
    color: Color,
    evaluator: Evaluator,
    config: SearchConfig,
    stats: SearchStats,
}

impl Agent {
    pub fn new(color: Color, evaluator: Evaluator, config: SearchConfig) -> Self {
        Self {
            color,
            evaluator,
            config,
            stats: SearchStats::default(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Static evaluation from this agent's point of view.
    pub fn evaluate(&self, board: &Board) -> i32 {
        self.evaluator.evaluate(board, self.color)
    }

    /// Best move sequence for `dice` at the configured depth.
    pub fn best_move(&mut self, board: &Board, dice: &[u8]) -> Vec<Move> {
        self.get_best_move(board, dice, self.config.depth)
    }

    /// Best move sequence for `dice`, searching `depth` plies beyond it.
    ///
    /// Returns an empty sequence if no move is legal or the deadline expired.
    pub fn get_best_move(&mut self, board: &Board, dice: &[u8], depth: u32) -> Vec<Move> {
        let started = Instant::now();
        let ctx = SearchContext::new(self.config.deadline);
        let opponent = self.color.opponent();

        let mut candidates = generate_unique_states(board, self.color, dice);
        let base_hits = board.bar_count(opponent) as i64;
        // Try hitting moves first
        candidates.sort_by_key(|c| Reverse(c.board.bar_count(opponent) as i64 - base_hits));

        let mut best_score = i32::MIN;
        let mut best_moves = Vec::new();
        let mut root = Window::full();
        for cand in &candidates {
            let score = self.expecti(&ctx, &cand.board, depth, false, opponent, root);
            trace!("candidate {} scored {score}", format_moves(&cand.moves));
            if score > best_score {
                best_score = score;
                best_moves = cand.moves.clone();
                root.alpha = root.alpha.max(score);
            }
            if ctx.should_stop() {
                break;
            }
        }

        let aborted = ctx.aborted.load(Ordering::Relaxed);
        self.stats = SearchStats {
            candidates: candidates.len(),
            nodes: ctx.nodes.load(Ordering::Relaxed),
            chance_nodes: ctx.chance_nodes.load(Ordering::Relaxed),
            best_score: (!candidates.is_empty() && !aborted).then_some(best_score),
            aborted,
        };

        if aborted {
            warn!(
                "{} search abandoned after {:?} (depth {depth})",
                self.color,
                started.elapsed()
            );
            return Vec::new();
        }

        debug!(
            "{} dice {:?} depth {depth}: {} candidates, {} nodes, best {} ({best_score}) {:?}",
            self.color,
            dice,
            self.stats.candidates,
            self.stats.nodes,
            format_moves(&best_moves),
            started.elapsed()
        );
        best_moves
    }

    /// Expected value of `board` with `to_move` about to roll.
    ///
    /// At depth 0 this is the static evaluation.
    pub fn expectiminimax(
        &self,
        board: &Board,
        depth: u32,
        maximizing: bool,
        to_move: Color,
    ) -> i32 {
        let ctx = SearchContext::new(None);
        self.expecti(&ctx, board, depth, maximizing, to_move, Window::full())
    }

    fn expecti(
        &self,
        ctx: &SearchContext,
        board: &Board,
        depth: u32,
        maximizing: bool,
        to_move: Color,
        window: Window,
    ) -> i32 {
        if depth == 0 {
            return self.evaluate(board);
        }
        if ctx.should_stop() {
            return 0;
        }
        ctx.chance_nodes.fetch_add(1, Ordering::Relaxed);

        let total: i64 = match self.config.window {
            WindowMode::Shared => {
                let mut window = window;
                DICE_OUTCOMES
                    .iter()
                    .map(|&(d1, d2, weight)| {
                        let dice = roll_values(d1, d2);
                        let value = self.minimax_for_outcome(
                            ctx, board, depth, maximizing, to_move, &dice, &mut window,
                        );
                        weight * i64::from(value)
                    })
                    .sum()
            }
            WindowMode::PerOutcome | WindowMode::Exhaustive => {
                self.sum_outcomes(ctx, board, depth, maximizing, to_move, window)
            }
        };
        (total / PHYSICAL_ROLLS) as i32
    }

    #[cfg(not(feature = "parallel"))]
    fn sum_outcomes(
        &self,
        ctx: &SearchContext,
        board: &Board,
        depth: u32,
        maximizing: bool,
        to_move: Color,
        window: Window,
    ) -> i64 {
        DICE_OUTCOMES
            .iter()
            .map(|&(d1, d2, weight)| {
                let dice = roll_values(d1, d2);
                let mut window = window;
                let value = self.minimax_for_outcome(
                    ctx, board, depth, maximizing, to_move, &dice, &mut window,
                );
                weight * i64::from(value)
            })
            .sum()
    }

    #[cfg(feature = "parallel")]
    fn sum_outcomes(
        &self,
        ctx: &SearchContext,
        board: &Board,
        depth: u32,
        maximizing: bool,
        to_move: Color,
        window: Window,
    ) -> i64 {
        use rayon::prelude::*;

        DICE_OUTCOMES
            .par_iter()
            .map(|&(d1, d2, weight)| {
                let dice = roll_values(d1, d2);
                let mut window = window;
                let value = self.minimax_for_outcome(
                    ctx, board, depth, maximizing, to_move, &dice, &mut window,
                );
                weight * i64::from(value)
            })
            .sum()
    }

    /// Best reply value for one roll, pruning against `window`.
    ///
    /// Child chance nodes inherit the window as it stands when they are
    /// expanded; a max layer raises alpha and a min layer lowers beta.
    #[allow(clippy::too_many_arguments)]
    fn minimax_for_outcome(
        &self,
        ctx: &SearchContext,
        board: &Board,
        depth: u32,
        maximizing: bool,
        to_move: Color,
        dice: &[u8],
        window: &mut Window,
    ) -> i32 {
        let states = generate_unique_states(board, to_move, dice);
        ctx.nodes.fetch_add(1, Ordering::Relaxed);

        if states.is_empty() {
            // Stuck: the turn is lost
            let base = self.evaluate(board);
            return if maximizing {
                base - STUCK_PENALTY
            } else {
                base + STUCK_PENALTY
            };
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for cand in &states {
            let value = self.expecti(
                ctx,
                &cand.board,
                depth - 1,
                !maximizing,
                to_move.opponent(),
                *window,
            );
            if maximizing {
                best = best.max(value);
                window.alpha = window.alpha.max(best);
            } else {
                best = best.min(value);
                window.beta = window.beta.min(best);
            }
            if window.beta <= window.alpha && self.config.window != WindowMode::Exhaustive {
                break;
            }
        }
        best
    }
}

/// Render a move sequence as `"1/4 12/15"`.
pub fn format_moves(moves: &[Move]) -> String {
    if moves.is_empty() {
        return "(none)".to_string();
    }
    moves
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Allows at most one search in progress per game.
#[derive(Clone, Debug, Default)]
pub struct SearchGuard {
    busy: Arc<AtomicBool>,
}

impl SearchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a search is already running.
    pub fn try_acquire(&self) -> Option<SearchPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SearchPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held while a search runs; releases the guard on drop.
#[derive(Debug)]
pub struct SearchPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SearchPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A self-contained search that can run away from the game's thread.
#[derive(Debug)]
pub struct SearchRequest {
    pub(crate) agent: Agent,
    pub(crate) board: Board,
    pub(crate) dice: Vec<u8>,
    pub(crate) permit: SearchPermit,
}

impl SearchRequest {
    /// Run the search and release the guard.
    pub fn run(mut self) -> Vec<Move> {
        let moves = self.agent.best_move(&self.board, &self.dice);
        drop(self.permit);
        moves
    }
}
