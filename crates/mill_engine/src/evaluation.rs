//! Static evaluation
//!
//! The search consumes evaluation through the [`Evaluator`] trait, so any
//! scoring function can be plugged in. [`HandcraftedEvaluator`] is the default:
//!
//! - placing and moving phases: material balance plus, optionally, mobility
//! - placing under mill-count removal: pieces standing in mills, since
//!   material cannot change before placing ends
//! - finished games: a mate score for the winner, zero for draws
//!
//! Values are returned from the point of view of the side to move.
//!
//! ## Module Organization
//!
//! - `material` - pieces in hand, on board and owed by pending removals, and
//!   pieces standing in mills
//! - `mobility` - pieces bordering free points

mod material;
mod mobility;

pub use material::{material_diff, mill_pieces_diff};
pub use mobility::mobility_diff;

use crate::constants::{VALUE_DRAW, VALUE_MATE, VALUE_ZERO};
use crate::position::Position;
use crate::rule::MillFormationAction;
use crate::types::{Action, Color, Phase, Value};

/// Scores a position for the side to move
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, pos: &Position) -> Value;

    /// Short label shown next to engine results
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Material and mobility heuristic
#[derive(Clone, Copy, Debug)]
pub struct HandcraftedEvaluator {
    pub consider_mobility: bool,
}

impl Default for HandcraftedEvaluator {
    fn default() -> Self {
        Self {
            consider_mobility: true,
        }
    }
}

impl HandcraftedEvaluator {
    /// Score from White's point of view
    pub fn white_value(&self, pos: &Position) -> Value {
        match pos.phase() {
            Phase::None | Phase::Ready => VALUE_ZERO,
            Phase::Placing
                if pos.rule().mill_formation_action_in_placing_phase
                    == MillFormationAction::RemovalBasedOnMillCounts
                    && pos.action() != Action::Remove =>
            {
                mill_pieces_diff(pos)
            }
            Phase::Placing | Phase::Moving => {
                let mut value = material_diff(pos);
                if self.consider_mobility {
                    value += mobility_diff(pos);
                }
                value
            }
            Phase::GameOver => match pos.winner() {
                Color::White => VALUE_MATE,
                Color::Black => -VALUE_MATE,
                _ => VALUE_DRAW,
            },
        }
    }
}

impl Evaluator for HandcraftedEvaluator {
    fn evaluate(&self, pos: &Position) -> Value {
        let value = self.white_value(pos);
        if pos.side_to_move() == Color::Black {
            -value
        } else {
            value
        }
    }

    fn name(&self) -> &'static str {
        "handcrafted"
    }
}
