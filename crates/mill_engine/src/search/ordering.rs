//! Move ordering for alpha-beta pruning
//!
//! Scores generated moves with mill heuristics and sorts them best first.
//! Ordering only affects pruning, never the value a full-width search returns.

use crate::constants::{RATING_BLOCK_ONE_MILL, RATING_ONE_MILL, RATING_STAR_SQUARE, RATING_TT};
use crate::move_gen::{generate_legal, MoveList};
use crate::position::Position;
use crate::types::{Color, ExtMove, Move, MoveKind, Phase};

/// Assign an ordering score to each move
pub(crate) fn score_moves(pos: &Position, moves: &mut [ExtMove], tt_move: Move) {
    let us = pos.side_to_move();
    let them = !us;
    let may_move = pos.rule().may_move_in_placing_phase;
    let star_bonus =
        pos.rule().has_diagonal_lines && pos.piece_on_board_count(Color::Black) < 2;

    for em in moves.iter_mut() {
        let m = em.mv;
        if m == tt_move {
            em.value = RATING_TT;
            continue;
        }

        let to = m.to();
        let our_mills = pos.potential_mills_count(to, us, m.from()) as i32;
        let mut value = 0;

        if m.kind() == MoveKind::Remove {
            let (ours, theirs, _, empty) = pos.surrounded_pieces_count(to);
            let (ours, theirs) = (ours as i32, theirs as i32);

            if our_mills > 0 && theirs == 0 {
                value += 1 + ours;
            }
            if pos.potential_mills_count(to, them, 0) > 0 && theirs >= 2 {
                value -= theirs;
                if ours == 0 {
                    value -= 1;
                }
            }
            value += empty as i32;
        } else {
            if our_mills > 0 {
                value += RATING_ONE_MILL * our_mills;
            } else if pos.phase() == Phase::Placing && !may_move {
                let their_mills = pos.potential_mills_count(to, them, 0) as i32;
                value += RATING_BLOCK_ONE_MILL * their_mills;
            } else {
                let their_mills = pos.potential_mills_count(to, them, 0) as i32;
                if their_mills > 0 {
                    let (_, theirs, _, _) = pos.surrounded_pieces_count(to);
                    let hemmed = if to % 2 == 0 { theirs == 3 } else { theirs == 2 };
                    if hemmed {
                        value += RATING_BLOCK_ONE_MILL * their_mills;
                    }
                }
            }

            if star_bonus && m.kind() == MoveKind::Place && pos.is_star_square(to) {
                value += RATING_STAR_SQUARE;
            }
        }

        em.value = value;
    }
}

/// Score and sort moves, best first. The sort is stable, so equal scores keep
/// generation order.
pub(crate) fn order_moves(pos: &Position, moves: &mut [ExtMove], tt_move: Move) {
    score_moves(pos, moves, tt_move);
    moves.sort_by(|a, b| b.value.cmp(&a.value));
}

/// Legal moves of a position in search order
pub struct MovePicker {
    moves: MoveList,
}

impl MovePicker {
    pub fn new(pos: &Position, tt_move: Move) -> Self {
        let mut moves = generate_legal(pos);
        order_moves(pos, &mut moves, tt_move);
        Self { moves }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Highest rated move, `Move::NONE` when there is none
    pub fn best(&self) -> Move {
        self.moves.first().map_or(Move::NONE, |em| em.mv)
    }

    pub fn moves(&self) -> &[ExtMove] {
        &self.moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(pos: &mut Position, records: &[&str]) {
        for r in records {
            assert!(pos.command(r), "{} should be accepted", r);
        }
    }

    #[test]
    fn test_closing_mill_is_first() {
        let mut pos = Position::default();
        // White holds (1,8) and (1,1); (1,2) closes the inner top side
        play(&mut pos, &["(1,8)", "(3,1)", "(1,1)", "(3,3)"]);
        let picker = MovePicker::new(&pos, Move::NONE);
        assert_eq!(picker.best(), Move::place(9), "Mill-closing placement should lead");
        assert_eq!(picker.moves()[0].value, RATING_ONE_MILL);
    }

    #[test]
    fn test_blocking_is_rated_in_placing() {
        let mut pos = Position::default();
        play(&mut pos, &["(1,8)", "(3,1)", "(1,1)"]);
        // Black to move; White threatens (1,2)
        let picker = MovePicker::new(&pos, Move::NONE);
        assert_eq!(picker.best(), Move::place(9));
        assert_eq!(picker.moves()[0].value, RATING_BLOCK_ONE_MILL);
    }

    #[test]
    fn test_tt_move_is_first() {
        let pos = Position::default();
        let tt_move = Move::place(31);
        let picker = MovePicker::new(&pos, tt_move);
        assert_eq!(picker.best(), tt_move);
        assert_eq!(picker.moves()[0].value, RATING_TT);
    }

    #[test]
    fn test_order_is_stable_for_equal_scores() {
        let pos = Position::default();
        let picker = MovePicker::new(&pos, Move::NONE);
        let generated = generate_legal(&pos);
        let order: Vec<Move> = picker.moves().iter().map(|em| em.mv).collect();
        let expected: Vec<Move> = generated.iter().map(|em| em.mv).collect();
        assert_eq!(order, expected, "An empty board has no preferences");
    }

    #[test]
    fn test_picker_keeps_every_move() {
        let mut pos = Position::default();
        play(&mut pos, &["(2,1)", "(2,3)"]);
        assert_eq!(MovePicker::new(&pos, Move::NONE).len(), 22);
    }
}
