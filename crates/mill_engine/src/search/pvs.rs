//! Principal variation search
//!
//! The first child of every node is searched with the full window. Later
//! children are first tested with a window of `VALUE_PVS_WINDOW` just above
//! alpha; only a child that lands strictly inside the real window is searched
//! again with it. At the root the previous iteration's value opens an
//! aspiration window whose width depends on the phase.

use tracing::trace;

use crate::constants::{VALUE_INFINITE, VALUE_MOVING_WINDOW, VALUE_PLACING_WINDOW, VALUE_PVS_WINDOW};
use crate::types::{Depth, Phase, Value};

use super::alphabeta::Searcher;
use super::RootResult;

impl Searcher<'_> {
    /// Narrow-window probe of a later child, re-searched when it beats alpha
    pub(super) fn scout_child(
        &mut self,
        depth: Depth,
        origin: Depth,
        alpha: Value,
        beta: Value,
        flips: bool,
    ) -> Value {
        if flips {
            let value = -self.search(depth, origin, -alpha - VALUE_PVS_WINDOW, -alpha);
            if value > alpha && value < beta && !self.ctx.is_stopped() {
                return -self.search(depth, origin, -beta, -alpha);
            }
            value
        } else {
            let value = self.search(depth, origin, alpha, alpha + VALUE_PVS_WINDOW);
            if value > alpha && value < beta && !self.ctx.is_stopped() {
                return self.search(depth, origin, alpha, beta);
            }
            value
        }
    }

    /// Root search inside an aspiration window around `guess`, widened to the
    /// full window when the result falls outside it
    pub(crate) fn aspiration_root(mut self, depth: Depth, guess: Option<Value>) -> RootResult {
        let Some(guess) = guess else {
            let value = self.search(depth, depth, -VALUE_INFINITE, VALUE_INFINITE);
            return self.result(value);
        };

        let window = if self.pos.phase() == Phase::Placing {
            VALUE_PLACING_WINDOW
        } else {
            VALUE_MOVING_WINDOW
        };
        let alpha = (guess - window).max(-VALUE_INFINITE);
        let beta = (guess + window).min(VALUE_INFINITE);

        let value = self.search(depth, depth, alpha, beta);
        if (value <= alpha || value >= beta) && !self.ctx.is_stopped() && !self.unique {
            trace!("[SEARCH] aspiration ({}, {}) failed with {}", alpha, beta, value);
            let value = self.search(depth, depth, -VALUE_INFINITE, VALUE_INFINITE);
            return self.result(value);
        }
        self.result(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use crate::evaluation::HandcraftedEvaluator;
    use crate::position::{Position, StateStack};
    use crate::search::alphabeta::{Flavor, Searcher};
    use crate::search::SearchContext;
    use crate::tt::TranspositionTable;

    fn context() -> SearchContext {
        SearchContext::new(
            Arc::new(TranspositionTable::new(4, 512)),
            Arc::new(HandcraftedEvaluator::default()),
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn opening() -> Position {
        let mut pos = Position::default();
        for r in ["(2,1)", "(2,3)", "(1,1)"] {
            assert!(pos.command(r));
        }
        pos
    }

    fn root(flavor: Flavor, depth: i32) -> i32 {
        let mut pos = opening();
        let mut ctx = context();
        let mut stack = StateStack::new();
        Searcher::new(&mut ctx, &mut pos, &mut stack, flavor).root(depth).value
    }

    #[test]
    fn test_pvs_matches_plain_search() {
        for depth in 1..=3 {
            assert_eq!(
                root(Flavor::Principal, depth),
                root(Flavor::Plain, depth),
                "Depth {} disagrees",
                depth
            );
        }
    }

    #[test]
    fn test_bad_aspiration_guess_still_converges() {
        let expected = root(Flavor::Plain, 3);
        let mut pos = opening();
        let mut ctx = context();
        let mut stack = StateStack::new();
        let result = Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Principal)
            .aspiration_root(3, Some(expected + 60));
        assert_eq!(result.value, expected, "The fail-low must trigger a full re-search");
        assert!(result.best_move.is_ok());
    }
}
