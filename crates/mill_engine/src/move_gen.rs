//! Move generation
//!
//! Pure functions from a [`Position`] to a bounded list of moves. Placements
//! walk the geometry's priority list forwards; slides and removals walk it
//! backwards, which seeds move ordering before the picker scores anything.

use smallvec::SmallVec;

use crate::constants::{MAX_MOVES, SQ_NONE};
use crate::position::Position;
use crate::types::{Action, Color, ExtMove, Move, Phase, Square};

/// Inline storage sized for the largest legal move set
pub type MoveList = SmallVec<[ExtMove; MAX_MOVES]>;

/// One placement per empty point, while the mover still has pieces in hand
pub fn generate_place(pos: &Position) -> MoveList {
    let mut moves = MoveList::new();
    push_place(pos, &mut moves);
    moves
}

/// Slides to adjacent empty points, or flights to every empty point
pub fn generate_slide(pos: &Position) -> MoveList {
    let mut moves = MoveList::new();
    push_slide(pos, &mut moves);
    moves
}

/// Pieces the mover may take: the opponent's, or its own when owed
pub fn generate_remove(pos: &Position) -> MoveList {
    let mut moves = MoveList::new();
    push_remove(pos, &mut moves);
    moves
}

/// Every move the position accepts right now
pub fn generate_legal(pos: &Position) -> MoveList {
    let mut moves = MoveList::new();

    match (pos.phase(), pos.action()) {
        (_, Action::Remove) => push_remove(pos, &mut moves),
        (Phase::Ready | Phase::Placing, Action::Select | Action::Place) => {
            push_place(pos, &mut moves);
            push_slide(pos, &mut moves);
        }
        (Phase::Moving, Action::Select | Action::Place) => push_slide(pos, &mut moves),
        _ => {}
    }

    moves
}

fn push_place(pos: &Position, moves: &mut MoveList) {
    if pos.piece_in_hand_count(pos.side_to_move()) == 0 {
        return;
    }
    let priority = pos.geometry().priority();
    moves.extend(
        priority
            .iter()
            .filter(|&&s| pos.piece_on(s).is_empty())
            .map(|&s| ExtMove::new(Move::place(s))),
    );
}

fn push_slide(pos: &Position, moves: &mut MoveList) {
    let phase = pos.phase();
    if matches!(phase, Phase::Ready | Phase::Placing) && !pos.rule().may_move_in_placing_phase {
        return;
    }

    let us = pos.side_to_move();
    let geometry = pos.geometry();
    let last_mill_to = pos.last_mill_to(us);
    let fly = pos.can_fly(us);

    for &from in geometry.priority().iter().rev() {
        if pos.color_on(from) != us {
            continue;
        }

        if fly {
            moves.extend(
                geometry
                    .priority()
                    .iter()
                    .copied()
                    .filter(|&to| pos.piece_on(to).is_empty() && !pos.reforms_last_mill(from, to))
                    .map(|to| ExtMove::new(Move::slide(from, to))),
            );
        } else {
            moves.extend(
                geometry
                    .neighbours(from)
                    .filter(|&to| {
                        pos.piece_on(to).is_empty()
                            && !blocked_by_repeat(pos, us, last_mill_to, from, to)
                    })
                    .map(|to| ExtMove::new(Move::slide(from, to))),
            );
        }
    }
}

/// The piece that just closed a mill may not slide straight into another
/// while its old mill still stands. Flights are only held to
/// [`Position::reforms_last_mill`].
fn blocked_by_repeat(
    pos: &Position,
    us: Color,
    last_mill_to: Square,
    from: Square,
    to: Square,
) -> bool {
    if !pos.rule().restrict_repeated_mills_formation {
        return false;
    }
    if last_mill_to != SQ_NONE
        && from == last_mill_to
        && pos.potential_mills_count(to, us, from) > 0
        && pos.mills_count(from) > 0
    {
        return true;
    }
    pos.reforms_last_mill(from, to)
}

fn push_remove(pos: &Position, moves: &mut MoveList) {
    let us = pos.side_to_move();
    let own = pos.removes_own_piece(us);
    let target = if own { us } else { !us };
    let priority = pos.geometry().priority();
    let targets = priority.iter().rev().copied().filter(|&s| pos.color_on(s) == target);

    if pos.is_stalemate_removal() {
        moves.extend(
            targets
                .filter(|&s| own || pos.is_adjacent_to(s, us))
                .map(|s| ExtMove::new(Move::remove(s))),
        );
        return;
    }

    if pos.rule().may_remove_from_mills_always || pos.is_all_in_mills(target) {
        moves.extend(targets.map(|s| ExtMove::new(Move::remove(s))));
        return;
    }

    moves.extend(
        targets
            .filter(|&s| pos.potential_mills_count(s, Color::None, SQ_NONE) == 0)
            .map(|s| ExtMove::new(Move::remove(s))),
    );
}
