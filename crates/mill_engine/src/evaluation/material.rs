//! Material balance
//!
//! Counts pieces in hand, on board and, while a removal is pending, the
//! pieces each side is still owed. Removals a side owes against its own
//! pieces count against it.

use crate::constants::{
    VALUE_EACH_PIECE_INHAND, VALUE_EACH_PIECE_NEEDREMOVE, VALUE_EACH_PIECE_ONBOARD,
};
use crate::constants::SQ_NONE;
use crate::position::Position;
use crate::types::{Action, Color, Value};

/// White minus Black, in piece units
pub fn material_diff(pos: &Position) -> Value {
    let diff = |count: fn(&Position, Color) -> u32| {
        count(pos, Color::White) as Value - count(pos, Color::Black) as Value
    };

    let mut value = VALUE_EACH_PIECE_INHAND * diff(Position::piece_in_hand_count)
        + VALUE_EACH_PIECE_ONBOARD * diff(Position::piece_on_board_count);

    if pos.action() == Action::Remove {
        let owed = |c: Color| {
            let n = pos.piece_to_remove_count(c) as Value;
            if pos.removes_own_piece(c) {
                -n
            } else {
                n
            }
        };
        value += VALUE_EACH_PIECE_NEEDREMOVE * (owed(Color::White) - owed(Color::Black));
    }

    value
}

/// White minus Black count of pieces standing in a complete line
pub fn mill_pieces_diff(pos: &Position) -> Value {
    let in_mills = |c: Color| {
        pos.pieces(c)
            .squares()
            .filter(|&s| pos.potential_mills_count(s, Color::None, SQ_NONE) > 0)
            .count() as Value
    };
    in_mills(Color::White) - in_mills(Color::Black)
}
