//! Per-search shared state
//!
//! A [`SearchContext`] bundles everything a search thread needs besides its own
//! position: the shared transposition table, the evaluator, the stop flag and
//! the deadline, plus the keys the game has already visited since its last
//! placement or removal. Cloning is cheap; every clone shares the same table
//! and flag but counts its own nodes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use web_time::{Duration, Instant};

use crate::constants::{DEFAULT_QUIESCENCE_DEPTH, TIME_CHECK_INTERVAL};
use crate::evaluation::Evaluator;
use crate::position::Position;
use crate::tt::TranspositionTable;
use crate::types::{Depth, Key, Value};

#[derive(Clone)]
pub struct SearchContext {
    tt: Arc<TranspositionTable>,
    evaluator: Arc<dyn Evaluator>,
    stop: Arc<AtomicBool>,
    deadline: Option<Instant>,
    quiescence_depth: Depth,
    game_keys: Arc<[Key]>,
    nodes: u64,
}

impl SearchContext {
    pub fn new(
        tt: Arc<TranspositionTable>,
        evaluator: Arc<dyn Evaluator>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            tt,
            evaluator,
            stop,
            deadline: None,
            quiescence_depth: DEFAULT_QUIESCENCE_DEPTH,
            game_keys: Arc::from(Vec::new()),
            nodes: 0,
        }
    }

    /// Stop once `budget` has elapsed from now
    pub fn with_time_limit(mut self, budget: Option<Duration>) -> Self {
        self.deadline = budget.map(|b| Instant::now() + b);
        self
    }

    pub fn with_quiescence_depth(mut self, depth: Depth) -> Self {
        self.quiescence_depth = depth.max(0);
        self
    }

    /// Positions reached earlier in the game; a search line that returns to
    /// one of them is a repetition
    pub fn with_game_history(mut self, keys: &[Key]) -> Self {
        self.game_keys = Arc::from(keys);
        self
    }

    #[inline]
    pub fn seen_in_game(&self, key: Key) -> bool {
        self.game_keys.contains(&key)
    }

    #[inline]
    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    #[inline]
    pub fn evaluate(&self, pos: &Position) -> Value {
        self.evaluator.evaluate(pos)
    }

    #[inline]
    pub fn quiescence_depth(&self) -> Depth {
        self.quiescence_depth
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Fold in the nodes counted by forked workers
    pub fn add_nodes(&mut self, nodes: u64) {
        self.nodes += nodes;
    }

    /// Fresh counter sharing the same table, flag and deadline
    pub fn fork(&self) -> Self {
        Self {
            nodes: 0,
            ..self.clone()
        }
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Count a node; every `TIME_CHECK_INTERVAL` nodes, raise the stop flag if
    /// the deadline has passed
    #[inline]
    pub fn visit(&mut self) {
        self.nodes += 1;
        if self.nodes % TIME_CHECK_INTERVAL == 0 && self.deadline_passed() {
            self.stop();
        }
    }
}
