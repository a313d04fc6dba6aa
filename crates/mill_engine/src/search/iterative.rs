//! Iterative deepening driver
//!
//! Runs the chosen algorithm at depths `ID_START_DEPTH..max_depth`, feeding
//! each value to the next iteration as its guess, then once more at
//! `max_depth`. A passed deadline ends the loop early; an iteration that was
//! cut short by the stop flag is discarded in favour of the last complete one.

use tracing::debug;

use crate::constants::{ID_START_DEPTH, MAX_PLY};
use crate::position::{Position, StateStack};
use crate::types::{Depth, Move, Value};

use super::context::SearchContext;
use super::{RootResult, SearchAlgorithm};

/// Result of a deepening run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IterationReport {
    pub value: Value,
    pub best_move: Move,
    pub unique: bool,
    /// Deepest iteration that finished
    pub depth_reached: Depth,
    /// False when the stop flag or the deadline cut the run short
    pub completed: bool,
}

/// Search `pos` with iterative deepening up to `max_depth`, held to
/// `1..=MAX_PLY`. With `ids` disabled only the final iteration runs.
pub fn iterative_deepening(
    algorithm: &dyn SearchAlgorithm,
    ctx: &mut SearchContext,
    pos: &mut Position,
    stack: &mut StateStack,
    max_depth: Depth,
    ids: bool,
) -> IterationReport {
    let max_depth = max_depth.clamp(1, MAX_PLY);
    let mut report = IterationReport {
        value: 0,
        best_move: Move::NONE,
        unique: false,
        depth_reached: 0,
        completed: false,
    };
    let mut guess: Option<Value> = None;

    let mut depths: Vec<Depth> = if ids {
        (ID_START_DEPTH..max_depth).collect()
    } else {
        Vec::new()
    };
    depths.push(max_depth);

    for depth in depths {
        let result = algorithm.search_root(ctx, pos, stack, depth, guess);

        if ctx.is_stopped() {
            debug!(
                "[SEARCH] {} stopped during depth {} after {} nodes",
                algorithm.name(),
                depth,
                ctx.nodes()
            );
            if !report.best_move.is_ok() && result.best_move.is_ok() {
                accept(&mut report, result, depth);
            }
            return report;
        }

        accept(&mut report, result, depth);
        guess = Some(result.value);
        debug!(
            "[SEARCH] {} depth {} value {} best {} nodes {}",
            algorithm.name(),
            depth,
            result.value,
            result.best_move,
            ctx.nodes()
        );

        if result.unique {
            report.completed = true;
            return report;
        }
        if ctx.deadline_passed() {
            debug!("[SEARCH] deadline passed after depth {}", depth);
            return report;
        }
    }

    report.completed = true;
    report
}

fn accept(report: &mut IterationReport, result: RootResult, depth: Depth) {
    report.value = result.value;
    report.best_move = result.best_move;
    report.unique = result.unique;
    report.depth_reached = depth;
}
