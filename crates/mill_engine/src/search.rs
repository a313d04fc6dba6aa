//! Alpha-beta family search
//!
//! This module implements the engine's tree search:
//! - Negamax alpha-beta with a transposition table and move ordering
//! - Principal variation search (PVS) with a narrow window after the first move
//! - MTD(f), driving zero-width searches from a first guess
//! - Quiescence extension through pending removals
//! - Iterative deepening with a deadline and a shared stop flag
//! - Root splitting across scoped worker threads
//!
//! In morris games the side to move does not always alternate: closing a mill
//! hands the same side a removal. Child values are therefore negated, and the
//! window flipped, only when the side to move actually changed.
//!
//! ## Module Organization
//!
//! - `context` - Shared table, evaluator, stop flag and deadline
//! - `alphabeta` - Core recursive search
//! - `pvs` - Narrow-window child search
//! - `mtdf` - MTD(f) driver
//! - `quiescence` - Removal-only extension past the horizon
//! - `ordering` - Move scoring and the move picker
//! - `iterative` - Iterative deepening
//! - `parallel` - Root split across threads

mod alphabeta;
mod context;
mod iterative;
mod mtdf;
mod ordering;
mod parallel;
mod pvs;
mod quiescence;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use context::SearchContext;
pub use iterative::{iterative_deepening, IterationReport};
pub use ordering::MovePicker;
pub use parallel::ParallelRoot;

use crate::error::MillEngineError;
use crate::position::{Position, StateStack};
use crate::types::{Depth, Move, Value};

use alphabeta::{Flavor, Searcher};

/// Outcome of one root search
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootResult {
    pub value: Value,
    pub best_move: Move,
    /// The root had exactly one legal move and was not searched
    pub unique: bool,
}

/// One alpha-beta variant, chosen once per engine configuration
pub trait SearchAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    /// Search `pos` to `depth`. `guess` is the previous iteration's value, if any.
    fn search_root(
        &self,
        ctx: &mut SearchContext,
        pos: &mut Position,
        stack: &mut StateStack,
        depth: Depth,
        guess: Option<Value>,
    ) -> RootResult;
}

/// Plain fail-soft alpha-beta over the full window
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphaBeta;

impl SearchAlgorithm for AlphaBeta {
    fn name(&self) -> &'static str {
        "alpha-beta"
    }

    fn search_root(
        &self,
        ctx: &mut SearchContext,
        pos: &mut Position,
        stack: &mut StateStack,
        depth: Depth,
        _guess: Option<Value>,
    ) -> RootResult {
        Searcher::new(ctx, pos, stack, Flavor::Plain).root(depth)
    }
}

/// Principal variation search with an aspiration window around the guess
#[derive(Clone, Copy, Debug, Default)]
pub struct Pvs;

impl SearchAlgorithm for Pvs {
    fn name(&self) -> &'static str {
        "pvs"
    }

    fn search_root(
        &self,
        ctx: &mut SearchContext,
        pos: &mut Position,
        stack: &mut StateStack,
        depth: Depth,
        guess: Option<Value>,
    ) -> RootResult {
        Searcher::new(ctx, pos, stack, Flavor::Principal).aspiration_root(depth, guess)
    }
}

/// MTD(f) over zero-width alpha-beta searches
#[derive(Clone, Copy, Debug, Default)]
pub struct Mtdf;

impl SearchAlgorithm for Mtdf {
    fn name(&self) -> &'static str {
        "mtdf"
    }

    fn search_root(
        &self,
        ctx: &mut SearchContext,
        pos: &mut Position,
        stack: &mut StateStack,
        depth: Depth,
        guess: Option<Value>,
    ) -> RootResult {
        Searcher::new(ctx, pos, stack, Flavor::Plain).mtdf(depth, guess.unwrap_or(0))
    }
}

/// Algorithm selector used by configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    AlphaBeta,
    Pvs,
    #[default]
    Mtdf,
}

impl Algorithm {
    /// Build the searcher. More than one thread splits the root for alpha-beta
    /// and PVS; MTD(f) always runs on the calling thread.
    pub fn build(self, threads: usize) -> Box<dyn SearchAlgorithm> {
        match (self, threads > 1) {
            (Algorithm::AlphaBeta, true) => Box::new(ParallelRoot::new(threads, Flavor::Plain)),
            (Algorithm::Pvs, true) => Box::new(ParallelRoot::new(threads, Flavor::Principal)),
            (Algorithm::AlphaBeta, false) => Box::new(AlphaBeta),
            (Algorithm::Pvs, false) => Box::new(Pvs),
            (Algorithm::Mtdf, _) => Box::new(Mtdf),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::AlphaBeta => "alphabeta",
            Algorithm::Pvs => "pvs",
            Algorithm::Mtdf => "mtdf",
        })
    }
}

impl FromStr for Algorithm {
    type Err = MillEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "alphabeta" | "alpha-beta" | "ab" => Ok(Algorithm::AlphaBeta),
            "1" | "pvs" => Ok(Algorithm::Pvs),
            "2" | "mtdf" | "mtd(f)" => Ok(Algorithm::Mtdf),
            _ => Err(MillEngineError::InvalidOptionValue {
                name: "algorithm".to_string(),
                value: s.to_string(),
            }),
        }
    }
}
