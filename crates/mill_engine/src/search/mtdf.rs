//! MTD(f)
//!
//! Converges on the minimax value with a sequence of narrow searches of width
//! `VALUE_MTDF_WINDOW`, each one tightening either the lower or the upper
//! bound. The transposition table carries the work from one pass to the next.

use tracing::trace;

use crate::constants::{VALUE_INFINITE, VALUE_MTDF_WINDOW};
use crate::types::{Depth, Value};

use super::alphabeta::Searcher;
use super::RootResult;

/// Guard against search instability keeping the bounds from meeting
const MAX_PASSES: usize = 64;

impl Searcher<'_> {
    pub(crate) fn mtdf(mut self, depth: Depth, first_guess: Value) -> RootResult {
        let mut g = first_guess;
        let mut lower = -VALUE_INFINITE;
        let mut upper = VALUE_INFINITE;
        let mut passes = 0;

        while lower < upper && passes < MAX_PASSES {
            let beta = if g == lower { g + VALUE_MTDF_WINDOW } else { g };
            g = self.search(depth, depth, beta - VALUE_MTDF_WINDOW, beta);
            passes += 1;

            if self.unique || self.ctx.is_stopped() {
                break;
            }
            if g < beta {
                upper = g;
            } else {
                lower = g;
            }
        }

        trace!("[SEARCH] mtdf depth {} value {} after {} passes", depth, g, passes);
        self.result(g)
    }
}
