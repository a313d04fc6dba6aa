//! Removal-only extension past the search horizon
//!
//! A node at depth zero with a removal pending is not quiet: the material
//! swing has been earned but not taken. The extension keeps resolving
//! removals, and only removals, until none is pending or the extension
//! depth runs out. Removal is forced, so there is no stand-pat option.

use crate::constants::VALUE_INFINITE;
use crate::types::{Action, Depth, Move, Value};

use super::alphabeta::Searcher;
use super::ordering::MovePicker;

impl Searcher<'_> {
    pub(super) fn quiescence(&mut self, qdepth: Depth, mut alpha: Value, beta: Value) -> Value {
        self.ctx.visit();

        if self.pos.is_game_over()
            || self.ctx.is_stopped()
            || qdepth <= 0
            || self.pos.action() != Action::Remove
        {
            return self.ctx.evaluate(self.pos);
        }

        let picker = MovePicker::new(self.pos, Move::NONE);
        if picker.is_empty() {
            return self.ctx.evaluate(self.pos);
        }

        let mut best_value = -VALUE_INFINITE;
        for em in picker.moves() {
            let before = self.pos.side_to_move();
            if self.pos.do_move(em.mv, self.stack).is_err() {
                debug_assert!(false, "generated removal {} rejected", em.mv);
                continue;
            }
            let value = if self.pos.side_to_move() != before {
                -self.quiescence(qdepth - 1, -beta, -alpha)
            } else {
                self.quiescence(qdepth - 1, alpha, beta)
            };
            self.pos.undo_move(self.stack);

            if self.ctx.is_stopped() {
                break;
            }
            if value > best_value {
                best_value = value;
                if value > alpha {
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        if best_value == -VALUE_INFINITE {
            self.ctx.evaluate(self.pos)
        } else {
            best_value
        }
    }
}
