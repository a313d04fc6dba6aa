//! # Position - Board State and the Phase/Action State Machine
//!
//! ## Overview
//!
//! A [`Position`] is a shared, read-only [`Variant`] (the rule plus its geometry tables)
//! and a small `Copy` [`StateInfo`] holding everything that changes during a game:
//!
//! - `board[Square] -> Piece` over the 40-slot array
//! - one bitboard per colour, one for banned (marked) points, one for all occupied points
//! - per-colour on-board, in-hand and to-remove counters
//! - `phase`, `action`, `side_to_move`, winner and game-over reason
//! - the Zobrist key, updated incrementally by every mutation
//! - the N-move counter, the ply counter and the currently selected square
//!
//! ## State Machine
//!
//! ```text
//! Ready --start--> Placing --(hands empty, no mill)--> Moving --(terminal)--> GameOver
//!                    |  ^                                |  ^
//!                    v  |                                v  |
//!                 (mill) remove ...................... (mill) remove
//! ```
//!
//! `GameOver` is terminal; only [`Position::reset`] leaves it.
//!
//! ## Undo
//!
//! Because `StateInfo` is a plain `Copy` value of a couple hundred bytes, undo is a full
//! snapshot: [`Position::do_move`] pushes the previous state onto a caller-owned stack
//! and [`Position::undo_move`] pops it back, restoring the board, bitboards, key, counters
//! and phase/action byte for byte.
//!
//! ## Validation
//!
//! Every mutator checks all of its preconditions before the first write. An `Err` always
//! leaves the position exactly as it was.

mod record;
mod transform;

pub use record::{resign_record, time_over_record};
pub use transform::Transform;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::bitboard::Bitboard;
use crate::constants::{COLOR_NB, SQUARE_EXT_NB, SQUARE_NB, SQ_BEGIN, SQ_END, SQ_NONE};
use crate::error::{IllegalMove, MillEngineResult};
use crate::geometry::{Geometry, Variant};
use crate::hash;
use crate::rule::{BoardFullAction, MillFormationAction, Rule, StalemateAction};
use crate::types::{
    is_on_board, Action, Color, GameOverReason, Key, Move, MoveKind, Phase, Piece, Square,
};

/// Everything about a position that changes move to move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateInfo {
    board: [Piece; SQUARE_EXT_NB],
    by_color: [Bitboard; COLOR_NB],
    marked: Bitboard,
    occupied: Bitboard,
    piece_on_board: [u32; COLOR_NB],
    piece_in_hand: [u32; COLOR_NB],
    piece_to_remove: [u32; COLOR_NB],
    /// The pending removals take the remover's own pieces
    removes_own: [bool; COLOR_NB],
    side_to_move: Color,
    phase: Phase,
    action: Action,
    winner: Color,
    game_over_reason: GameOverReason,
    key: Key,
    rule50: u32,
    game_ply: u32,
    current_square: Square,
    last_mill_from: [Square; COLOR_NB],
    last_mill_to: [Square; COLOR_NB],
    formed_mills: [Bitboard; COLOR_NB],
    is_stalemate_removing: bool,
    /// Move that produced this state
    current_move: Move,
}

impl StateInfo {
    const fn empty() -> Self {
        Self {
            board: [Piece::Empty; SQUARE_EXT_NB],
            by_color: [Bitboard::EMPTY; COLOR_NB],
            marked: Bitboard::EMPTY,
            occupied: Bitboard::EMPTY,
            piece_on_board: [0; COLOR_NB],
            piece_in_hand: [0; COLOR_NB],
            piece_to_remove: [0; COLOR_NB],
            removes_own: [false; COLOR_NB],
            side_to_move: Color::White,
            phase: Phase::Ready,
            action: Action::Place,
            winner: Color::None,
            game_over_reason: GameOverReason::None,
            key: 0,
            rule50: 0,
            game_ply: 0,
            current_square: SQ_NONE,
            last_mill_from: [SQ_NONE; COLOR_NB],
            last_mill_to: [SQ_NONE; COLOR_NB],
            formed_mills: [Bitboard::EMPTY; COLOR_NB],
            is_stalemate_removing: false,
            current_move: Move::NONE,
        }
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn current_move(&self) -> Move {
        self.current_move
    }
}

/// Undo records pushed by [`Position::do_move`]
pub type StateStack = Vec<StateInfo>;

#[derive(Clone, Debug)]
pub struct Position {
    variant: Arc<Variant>,
    st: StateInfo,
}

impl Default for Position {
    fn default() -> Self {
        Self::with_variant(Arc::new(Variant::default()))
    }
}

impl Position {
    /// Validate `rule`, build its tables and return a reset position
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` if the rule fails validation.
    pub fn new(rule: Rule) -> MillEngineResult<Self> {
        Ok(Self::with_variant(Variant::new(rule)?))
    }

    pub fn with_variant(variant: Arc<Variant>) -> Self {
        let mut pos = Self {
            variant,
            st: StateInfo::empty(),
        };
        pos.reset();
        pos
    }

    /// Adopt a new rule and reset. On error the old rule stays in effect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` if the rule fails validation.
    pub fn set_rule(&mut self, rule: Rule) -> MillEngineResult<()> {
        let variant =
            Variant::new(rule).inspect_err(|e| warn!("[POSITION] rule rejected: {}", e))?;
        self.variant = variant;
        self.reset();
        Ok(())
    }

    /// Swap in tables for the same rule (a reshuffled priority list) without
    /// touching the state
    pub fn set_variant(&mut self, variant: Arc<Variant>) {
        debug_assert_eq!(variant.rule(), self.variant.rule());
        self.variant = variant;
    }

    #[inline]
    pub fn variant(&self) -> &Arc<Variant> {
        &self.variant
    }

    #[inline]
    pub fn rule(&self) -> &Rule {
        self.variant.rule()
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        self.variant.geometry()
    }

    #[inline]
    pub fn state(&self) -> &StateInfo {
        &self.st
    }

    // Accessors

    #[inline]
    pub fn piece_on(&self, s: Square) -> Piece {
        self.st.board[s]
    }

    #[inline]
    pub fn color_on(&self, s: Square) -> Color {
        self.st.board[s].color()
    }

    #[inline]
    pub fn pieces(&self, c: Color) -> Bitboard {
        self.st.by_color[c.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.st.occupied
    }

    #[inline]
    pub fn marked(&self) -> Bitboard {
        self.st.marked
    }

    #[inline]
    pub fn piece_on_board_count(&self, c: Color) -> u32 {
        self.st.piece_on_board[c.index()]
    }

    #[inline]
    pub fn piece_in_hand_count(&self, c: Color) -> u32 {
        self.st.piece_in_hand[c.index()]
    }

    #[inline]
    pub fn piece_to_remove_count(&self, c: Color) -> u32 {
        self.st.piece_to_remove[c.index()]
    }

    /// `c`'s pending removals take its own pieces
    #[inline]
    pub fn removes_own_piece(&self, c: Color) -> bool {
        self.st.removes_own[c.index()]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.st.side_to_move
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.st.phase
    }

    #[inline]
    pub fn action(&self) -> Action {
        self.st.action
    }

    #[inline]
    pub fn winner(&self) -> Color {
        self.st.winner
    }

    #[inline]
    pub fn game_over_reason(&self) -> GameOverReason {
        self.st.game_over_reason
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.st.key
    }

    #[inline]
    pub fn rule50_count(&self) -> u32 {
        self.st.rule50
    }

    #[inline]
    pub fn game_ply(&self) -> u32 {
        self.st.game_ply
    }

    #[inline]
    pub fn current_square(&self) -> Square {
        self.st.current_square
    }

    #[inline]
    pub fn current_move(&self) -> Move {
        self.st.current_move
    }

    #[inline]
    pub fn last_mill_to(&self, c: Color) -> Square {
        self.st.last_mill_to[c.index()]
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.st.phase == Phase::GameOver
    }

    // Lifecycle

    /// Empty board, full hands, White to place, zero key
    pub fn reset(&mut self) {
        let count = self.rule().piece_count;
        self.st = StateInfo::empty();
        self.st.piece_in_hand[Color::White.index()] = count;
        self.st.piece_in_hand[Color::Black.index()] = count;
    }

    /// Ready -> Placing. Resets first when called on a finished game.
    pub fn start(&mut self) -> bool {
        match self.st.phase {
            Phase::Placing | Phase::Moving | Phase::None => false,
            Phase::GameOver => {
                self.reset();
                self.st.phase = Phase::Placing;
                true
            }
            Phase::Ready => {
                self.st.phase = Phase::Placing;
                true
            }
        }
    }

    // Board primitives

    fn put_on(&mut self, s: Square, pc: Piece) {
        self.st.board[s] = pc;
        self.st.occupied.insert(s);
        match pc {
            Piece::White | Piece::Black => self.st.by_color[pc.color().index()].insert(s),
            Piece::Marked => self.st.marked.insert(s),
            Piece::Empty => {}
        }
        self.st.key ^= hash::psq(pc, s);
    }

    fn take_off(&mut self, s: Square) -> Piece {
        let pc = self.st.board[s];
        self.st.key ^= hash::psq(pc, s);
        self.st.board[s] = Piece::Empty;
        self.st.occupied.remove(s);
        self.st.by_color[Color::White.index()].remove(s);
        self.st.by_color[Color::Black.index()].remove(s);
        self.st.marked.remove(s);
        pc
    }

    /// Removal count of the side to move, plus a flag while it takes its own pieces
    fn misc_bits(&self) -> u32 {
        let i = self.st.side_to_move.index();
        self.st.piece_to_remove[i].min(7) | (u32::from(self.st.removes_own[i]) << 3)
    }

    fn update_key_misc(&mut self) {
        self.st.key = hash::with_misc(self.st.key, self.misc_bits());
    }

    fn set_side_to_move(&mut self, c: Color) {
        if self.st.side_to_move != c {
            self.st.side_to_move = c;
            self.st.key ^= hash::side_key();
        }

        if self.st.piece_in_hand[c.index()] == 0 {
            self.st.phase = Phase::Moving;
            self.st.action = Action::Select;
        } else {
            self.st.phase = Phase::Placing;
            self.st.action = Action::Place;
        }

        if self.st.piece_to_remove[c.index()] != 0 {
            self.st.action = Action::Remove;
        }
        self.update_key_misc();
    }

    fn keep_side_to_move(&mut self) {
        self.set_side_to_move(self.st.side_to_move);
    }

    fn change_side_to_move(&mut self) {
        self.set_side_to_move(!self.st.side_to_move);
    }

    fn set_gameover(&mut self, winner: Color, reason: GameOverReason) {
        self.st.phase = Phase::GameOver;
        self.st.winner = winner;
        self.st.game_over_reason = reason;
    }

    /// Recompute bitboards from the board array and the key from scratch
    fn reset_bb(&mut self) {
        self.st.by_color = [Bitboard::EMPTY; COLOR_NB];
        self.st.marked = Bitboard::EMPTY;
        self.st.occupied = Bitboard::EMPTY;
        for s in SQ_BEGIN..SQ_END {
            match self.st.board[s] {
                Piece::Empty => {}
                Piece::Marked => {
                    self.st.marked.insert(s);
                    self.st.occupied.insert(s);
                }
                pc => {
                    self.st.by_color[pc.color().index()].insert(s);
                    self.st.occupied.insert(s);
                }
            }
        }
        self.st.key = self.compute_key();
    }

    /// Zobrist key rebuilt from board, side to move and the pending-removal bits
    pub fn compute_key(&self) -> Key {
        let mut key = (SQ_BEGIN..SQ_END).fold(0, |k, s| k ^ hash::psq(self.st.board[s], s));
        if self.st.side_to_move == Color::Black {
            key ^= hash::side_key();
        }
        hash::with_misc(key, self.misc_bits())
    }

    // Mill queries

    fn count_lines(&self, s: Square, owned: Bitboard) -> u32 {
        self.geometry()
            .mill_masks(s)
            .iter()
            .filter(|&&mask| owned.covers(mask))
            .count() as u32
    }

    /// Lines through `s` fully owned by the colour standing on `s`
    pub fn mills_count(&self, s: Square) -> u32 {
        let c = self.color_on(s);
        if c == Color::None {
            return 0;
        }
        self.count_lines(s, self.pieces(c))
    }

    /// Count mills newly closed on `s`; under one-time-use mills, records them
    fn close_mills(&mut self, s: Square) -> u32 {
        if !self.rule().one_time_use_mill {
            return self.mills_count(s);
        }

        let c = self.color_on(s);
        let owned = self.pieces(c);
        let masks = *self.geometry().mill_masks(s);
        let mut n = 0;
        for mask in masks.into_iter().filter(|&m| owned.covers(m)) {
            let line = mask | Bitboard::square(s);
            let formed = &mut self.st.formed_mills[c.index()];
            if !formed.covers(line) {
                *formed |= line;
                n += 1;
            }
        }
        n
    }

    /// Mills `c` would have on `to` if a piece stood there. `Color::None` means
    /// the colour already on `to`. A non-zero `from` is treated as vacated.
    pub fn potential_mills_count(&self, to: Square, c: Color, from: Square) -> u32 {
        let explicit = c != Color::None;
        let c = if explicit { c } else { self.color_on(to) };
        if c == Color::None {
            return 0;
        }

        let mut owned = self.pieces(c);
        if from != SQ_NONE {
            owned.remove(from);
        }

        if self.rule().one_time_use_mill && explicit {
            let formed = self.st.formed_mills[self.st.side_to_move.index()];
            return self
                .geometry()
                .mill_masks(to)
                .iter()
                .filter(|&&mask| owned.covers(mask) && !formed.covers(mask | Bitboard::square(to)))
                .count() as u32;
        }

        self.count_lines(to, owned)
    }

    /// Every piece of `c` currently sits in a mill
    pub fn is_all_in_mills(&self, c: Color) -> bool {
        self.pieces(c)
            .squares()
            .all(|s| self.potential_mills_count(s, Color::None, SQ_NONE) > 0)
    }

    /// Number of complete lines owned by `c`
    pub fn total_mills_count(&self, c: Color) -> u32 {
        let owned = self.pieces(c);
        self.geometry()
            .lines()
            .iter()
            .filter(|&&line| owned.covers(line))
            .count() as u32
    }

    pub fn is_star_square(&self, s: Square) -> bool {
        self.geometry().is_star_square(s)
    }

    /// Some neighbour of `s` holds a piece of colour `c`
    pub fn is_adjacent_to(&self, s: Square, c: Color) -> bool {
        self.geometry().adjacent_bb(s).squares().any(|n| self.color_on(n) == c)
    }

    /// Neighbours of `s` as (ours, theirs, marked, empty) for the side to move
    pub fn surrounded_pieces_count(&self, s: Square) -> (u32, u32, u32, u32) {
        let us = self.st.side_to_move;
        let (mut ours, mut theirs, mut marked, mut empty) = (0, 0, 0, 0);
        for n in self.geometry().neighbours(s) {
            match self.st.board[n] {
                Piece::Empty => empty += 1,
                Piece::Marked => marked += 1,
                pc if pc.color() == us => ours += 1,
                _ => theirs += 1,
            }
        }
        (ours, theirs, marked, empty)
    }

    /// `c` may jump to any empty point
    #[inline]
    pub fn can_fly(&self, c: Color) -> bool {
        let rule = self.rule();
        rule.may_fly
            && self.piece_on_board_count(c) <= rule.fly_piece_count
            && self.piece_in_hand_count(c) == 0
    }

    /// `c` cannot slide anywhere
    pub fn is_all_surrounded(&self, c: Color) -> bool {
        if self.piece_on_board_count(Color::White) + self.piece_on_board_count(Color::Black)
            >= SQUARE_NB as u32
        {
            return true;
        }

        let rule = self.rule();
        if rule.may_fly && self.piece_on_board_count(c) <= rule.fly_piece_count {
            return false;
        }

        let occupied = self.st.occupied;
        self.pieces(c).squares().all(|s| {
            let around = self.geometry().adjacent_bb(s);
            (around & !occupied).is_empty()
        })
    }

    /// Either side is down to three pieces in the moving phase
    pub fn is_three_endgame(&self) -> bool {
        if self.st.phase == Phase::Placing {
            return false;
        }
        self.piece_on_board_count(Color::White) == 3 || self.piece_on_board_count(Color::Black) == 3
    }

    /// White minus Black count of pieces bordering empty or marked points
    pub fn mobility_diff(&self) -> i32 {
        let mut white = 0i32;
        let mut black = 0i32;
        for s in SQ_BEGIN..SQ_END {
            if matches!(self.st.board[s], Piece::Empty | Piece::Marked) {
                for n in self.geometry().neighbours(s) {
                    match self.st.board[n] {
                        Piece::White => white += 1,
                        Piece::Black => black += 1,
                        _ => {}
                    }
                }
            }
        }
        white - black
    }

    fn is_board_full_removal_at_placing_phase_end(&self) -> bool {
        let rule = self.rule();
        rule.piece_count == 12
            && !matches!(
                rule.board_full_action,
                BoardFullAction::FirstPlayerLose | BoardFullAction::AgreeToDraw
            )
            && self.st.phase == Phase::Placing
            && self.piece_in_hand_count(Color::White) == 0
            && self.piece_in_hand_count(Color::Black) == 0
            && self.total_mills_count(Color::Black) == 0
    }

    /// The pending removal resolves a blocked side rather than a closed mill
    pub fn is_stalemate_removal(&self) -> bool {
        if self.is_board_full_removal_at_placing_phase_end() {
            return true;
        }
        if !self.rule().stalemate_action.removes() {
            return false;
        }
        self.st.is_stalemate_removing || self.is_all_surrounded(self.st.side_to_move)
    }

    // Phase transitions

    fn remove_marked_pieces(&mut self) {
        for s in self.st.marked.squares() {
            self.take_off(s);
        }
    }

    /// Leave the placing phase once both hands and both removal counters are empty.
    /// Returns `true` when the side to move was set here.
    fn handle_placing_phase_end(&mut self) -> bool {
        if self.st.phase != Phase::Placing
            || self.piece_in_hand_count(Color::White) > 0
            || self.piece_in_hand_count(Color::Black) > 0
            || self.piece_to_remove_count(Color::White) > 0
            || self.piece_to_remove_count(Color::Black) > 0
        {
            return false;
        }

        let rule = self.rule();
        let defender_first = rule.is_defender_move_first;
        let action = rule.mill_formation_action_in_placing_phase;
        let invariant = action == MillFormationAction::RemoveOpponentsPieceFromHandThenOpponentsTurn
            || (action == MillFormationAction::RemoveOpponentsPieceFromHandThenYourTurn
                && rule.may_remove_multiple)
            || rule.may_move_in_placing_phase;

        if action == MillFormationAction::MarkAndDelayRemovingPieces {
            self.remove_marked_pieces();
        } else if action == MillFormationAction::RemovalBasedOnMillCounts {
            self.assign_removals_by_mill_counts();
        } else if invariant {
            if defender_first {
                self.set_side_to_move(Color::Black);
                return true;
            }
            return false;
        }

        self.set_side_to_move(if defender_first {
            Color::Black
        } else {
            Color::White
        });
        true
    }

    /// Removals owed once placing ends under mill-count removal. The side with
    /// more mills takes one more piece than the other; with no mills on the
    /// board each side gives up one of its own.
    fn assign_removals_by_mill_counts(&mut self) {
        let white = self.total_mills_count(Color::White);
        let black = self.total_mills_count(Color::Black);
        let (w, b) = match (white, black) {
            (0, 0) => (1, 1),
            (_, 0) => (2, 1),
            (0, _) => (1, 2),
            (w, b) if w > b => (b + 1, b),
            (w, b) if w < b => (w, w + 1),
            (w, b) => (w, b),
        };
        let own = white == 0 && black == 0;
        for (c, n) in [(Color::White, w), (Color::Black, b)] {
            self.st.piece_to_remove[c.index()] = n;
            self.st.removes_own[c.index()] = own;
        }
        self.update_key_misc();
    }

    /// Apply draw rules and the stalemate policy. Returns `true` when the game ended.
    pub fn check_if_game_is_over(&mut self) -> bool {
        if matches!(self.st.phase, Phase::Ready | Phase::GameOver) {
            return self.st.phase == Phase::GameOver;
        }

        let at_least = self.rule().pieces_at_least_count;
        for c in [Color::White, Color::Black] {
            if self.piece_on_board_count(c) + self.piece_in_hand_count(c) < at_least {
                self.set_gameover(!c, GameOverReason::LoseFewerThanThree);
                return true;
            }
        }

        let (n_move, endgame_n_move, stalemate) = {
            let rule = self.rule();
            (
                rule.n_move_rule,
                rule.endgame_n_move_rule,
                rule.stalemate_action,
            )
        };

        if self.st.rule50 >= n_move {
            self.set_gameover(Color::Draw, GameOverReason::DrawFiftyMove);
            return true;
        }

        if endgame_n_move < n_move && self.is_three_endgame() && self.st.rule50 >= endgame_n_move {
            self.set_gameover(Color::Draw, GameOverReason::DrawEndgameFiftyMove);
            return true;
        }

        let us = self.st.side_to_move;
        if self.st.phase == Phase::Moving
            && self.st.action == Action::Select
            && self.is_all_surrounded(us)
        {
            match stalemate {
                StalemateAction::EndWithStalemateLoss => {
                    self.set_gameover(!us, GameOverReason::LoseNoLegalMoves);
                    return true;
                }
                StalemateAction::ChangeSideToMove => self.change_side_to_move(),
                StalemateAction::RemoveOpponentsPieceAndMakeNextMove => {
                    self.st.piece_to_remove[us.index()] = 1;
                    self.st.is_stalemate_removing = true;
                    self.update_key_misc();
                }
                StalemateAction::RemoveOpponentsPieceAndChangeSideToMove => {
                    self.st.piece_to_remove[us.index()] = 1;
                    self.update_key_misc();
                }
                StalemateAction::EndWithStalemateDraw => {
                    self.set_gameover(Color::Draw, GameOverReason::DrawStalemateCondition);
                    return true;
                }
            }
        }

        if self.piece_to_remove_count(self.st.side_to_move) != 0 {
            self.st.action = Action::Remove;
        }

        false
    }

    fn apply_board_full_action(&mut self) {
        let (action, defender_first) = {
            let rule = self.rule();
            (rule.board_full_action, rule.is_defender_move_first)
        };
        match action {
            BoardFullAction::FirstPlayerLose => {
                self.set_gameover(Color::Black, GameOverReason::LoseFullBoard);
            }
            BoardFullAction::FirstAndSecondPlayerRemovePiece => {
                self.st.piece_to_remove = [0, 1, 1];
                self.change_side_to_move();
            }
            BoardFullAction::SecondAndFirstPlayerRemovePiece => {
                self.st.piece_to_remove = [0, 1, 1];
                self.keep_side_to_move();
            }
            BoardFullAction::SideToMoveRemovePiece => {
                self.set_side_to_move(if defender_first {
                    Color::Black
                } else {
                    Color::White
                });
                self.st.piece_to_remove[self.st.side_to_move.index()] = 1;
                self.keep_side_to_move();
            }
            BoardFullAction::AgreeToDraw => {
                self.set_gameover(Color::Draw, GameOverReason::DrawFullBoard);
            }
        }
    }

    // Move operations

    /// Place a piece on `s`, or during moving slide the selected piece there
    ///
    /// Under rules that allow moving during placing, pointing at one of your own
    /// pieces toggles it as the selected piece.
    ///
    /// # Returns
    ///
    /// The number of mills closed by the move.
    ///
    /// # Errors
    ///
    /// `IllegalMove` naming the violated precondition; the position is unchanged.
    pub fn put_piece(&mut self, s: Square) -> MillEngineResult<u32> {
        let us = self.st.side_to_move;

        if self.st.phase == Phase::GameOver {
            return Err(IllegalMove::GameOver.into());
        }
        if !is_on_board(s) {
            return Err(IllegalMove::InvalidSquare(s).into());
        }
        let pc = self.st.board[s];
        if pc == Piece::of(!us) {
            return Err(IllegalMove::Occupied(s).into());
        }
        if pc == Piece::Marked {
            return Err(IllegalMove::MarkedSquare(s).into());
        }
        let may_move = self.rule().may_move_in_placing_phase;
        if !may_move && !pc.is_empty() {
            return Err(IllegalMove::Occupied(s).into());
        }

        match (self.st.phase, self.st.action) {
            (Phase::Ready, _) | (Phase::Placing, Action::Place) => {}
            (Phase::Moving, Action::Place) => return self.move_selected_to(s),
            (Phase::Placing | Phase::Moving, Action::Remove) => {
                return Err(IllegalMove::WrongAction.into())
            }
            (Phase::Moving, _) => return Err(IllegalMove::NothingSelected.into()),
            (Phase::Placing, _) => return Err(IllegalMove::WrongAction.into()),
            _ => return Err(IllegalMove::WrongPhase.into()),
        }

        if may_move && self.st.phase == Phase::Placing {
            if !pc.is_empty() {
                let current = self.st.current_square;
                self.st.current_square = if current == s { SQ_NONE } else { s };
                return Ok(0);
            }
            if self.st.current_square != SQ_NONE {
                return self.move_selected_to(s);
            }
        }

        if self.piece_in_hand_count(us) == 0 {
            return Err(IllegalMove::NothingInHand.into());
        }

        if self.st.phase == Phase::Ready {
            self.start();
        }

        self.place(s)
    }

    fn place(&mut self, s: Square) -> MillEngineResult<u32> {
        let us = self.st.side_to_move;
        let them = !us;

        self.st.piece_in_hand[us.index()] -= 1;
        self.st.piece_on_board[us.index()] += 1;
        self.put_on(s, Piece::of(us));
        self.st.rule50 = 0;
        self.st.current_square = SQ_NONE;
        self.st.last_mill_from[us.index()] = SQ_NONE;
        self.st.last_mill_to[us.index()] = SQ_NONE;

        let n = self.close_mills(s);

        if self.rule().mill_formation_action_in_placing_phase
            == MillFormationAction::RemovalBasedOnMillCounts
        {
            if !self.handle_placing_phase_end() {
                self.change_side_to_move();
            }
            self.check_if_game_is_over();
            return Ok(n);
        }

        if n == 0 {
            debug_assert!(
                self.piece_to_remove_count(Color::White) == 0
                    && self.piece_to_remove_count(Color::Black) == 0,
                "no removal may be pending while placing"
            );

            let board_full = self.rule().piece_count == 12
                && self.piece_on_board_count(Color::White) + self.piece_on_board_count(Color::Black)
                    >= SQUARE_NB as u32;
            if board_full {
                self.apply_board_full_action();
            } else {
                if !self.handle_placing_phase_end() {
                    self.change_side_to_move();
                }
                self.check_if_game_is_over();
            }
            return Ok(n);
        }

        let (multiple, action) = {
            let rule = self.rule();
            (
                rule.may_remove_multiple,
                rule.mill_formation_action_in_placing_phase,
            )
        };
        let rm = if multiple { n } else { 1 };
        self.st.piece_to_remove[us.index()] = rm;
        self.update_key_misc();

        match action {
            MillFormationAction::RemoveOpponentsPieceFromHandThenOpponentsTurn
            | MillFormationAction::RemoveOpponentsPieceFromHandThenYourTurn => {
                for taken in 0..rm {
                    if self.piece_in_hand_count(them) == 0 {
                        self.st.piece_to_remove[us.index()] = rm - taken;
                        self.update_key_misc();
                        self.st.action = Action::Remove;
                        return Ok(n);
                    }
                    self.st.piece_in_hand[them.index()] -= 1;
                    self.st.piece_to_remove[us.index()] -= 1;
                    self.update_key_misc();
                }

                if !self.handle_placing_phase_end()
                    && action == MillFormationAction::RemoveOpponentsPieceFromHandThenOpponentsTurn
                {
                    self.change_side_to_move();
                }
                self.check_if_game_is_over();
            }
            _ => self.st.action = Action::Remove,
        }

        Ok(n)
    }

    /// Slide (or fly) the selected piece to `s`
    fn move_selected_to(&mut self, s: Square) -> MillEngineResult<u32> {
        let us = self.st.side_to_move;
        let from = self.st.current_square;

        if from == SQ_NONE || self.st.board[from] != Piece::of(us) {
            return Err(IllegalMove::NothingSelected.into());
        }
        if !self.st.board[s].is_empty() {
            return Err(IllegalMove::Occupied(s).into());
        }
        if !self.can_fly(us) && !self.geometry().is_adjacent(from, s) {
            return Err(IllegalMove::NotAdjacent { from, to: s }.into());
        }

        if self.reforms_last_mill(from, s) {
            return Err(IllegalMove::RepeatedMill(s).into());
        }

        let restrict = self.rule().restrict_repeated_mills_formation;
        let mut owned_after = self.pieces(us);
        owned_after.remove(from);
        owned_after.insert(s);
        let left_behind = self.count_lines(from, owned_after);

        let pc = self.take_off(from);
        self.put_on(s, pc);
        self.st.rule50 += 1;

        let n = self.close_mills(s);

        if n == 0 {
            self.st.current_square = SQ_NONE;
            self.st.last_mill_from[us.index()] = SQ_NONE;
            self.st.last_mill_to[us.index()] = SQ_NONE;
            self.change_side_to_move();
            self.check_if_game_is_over();
            return Ok(0);
        }

        if restrict {
            if left_behind > 0 {
                self.st.last_mill_from[us.index()] = from;
                self.st.last_mill_to[us.index()] = s;
            } else {
                self.st.last_mill_from[us.index()] = SQ_NONE;
                self.st.last_mill_to[us.index()] = SQ_NONE;
            }
        }

        self.st.current_square = SQ_NONE;
        self.st.piece_to_remove[us.index()] = if self.rule().may_remove_multiple {
            n
        } else {
            1
        };
        self.update_key_misc();
        self.st.action = Action::Remove;
        Ok(n)
    }

    /// Under the repeated-mill restriction, sliding `from` back to `to` would
    /// re-close the mill that piece just came out of
    pub fn reforms_last_mill(&self, from: Square, to: Square) -> bool {
        let us = self.st.side_to_move;
        if !self.rule().restrict_repeated_mills_formation
            || from == SQ_NONE
            || from != self.st.last_mill_to[us.index()]
            || to != self.st.last_mill_from[us.index()]
        {
            return false;
        }

        let mut owned_after = self.pieces(us);
        owned_after.remove(from);
        owned_after.insert(to);
        self.count_lines(to, owned_after) > 0
            && (self.mills_count(from) > 0 || self.count_lines(from, owned_after) > 0)
    }

    /// Pick up one of the mover's pieces for a following [`put_piece`](Self::put_piece)
    ///
    /// # Errors
    ///
    /// `IllegalMove` if no slide may start now or `s` is not the mover's piece.
    pub fn select_piece(&mut self, s: Square) -> MillEngineResult<()> {
        let phase_ok = self.st.phase == Phase::Moving
            || (self.st.phase == Phase::Placing && self.rule().may_move_in_placing_phase);
        if !phase_ok {
            return Err(IllegalMove::WrongPhase.into());
        }
        if !matches!(self.st.action, Action::Select | Action::Place) {
            return Err(IllegalMove::WrongAction.into());
        }
        if !is_on_board(s) {
            return Err(IllegalMove::InvalidSquare(s).into());
        }
        if self.st.board[s] != Piece::of(self.st.side_to_move) {
            return Err(IllegalMove::NotOwnPiece(s).into());
        }

        self.st.current_square = s;
        self.st.action = Action::Place;
        Ok(())
    }

    /// Select `from` and slide it to `to` as one step
    ///
    /// # Errors
    ///
    /// `IllegalMove` from either half; the position is unchanged.
    pub fn move_piece(&mut self, from: Square, to: Square) -> MillEngineResult<u32> {
        let saved = self.st;
        let result = self.select_piece(from).and_then(|_| self.put_piece(to));
        if result.is_err() {
            self.st = saved;
        }
        result
    }

    /// Remove an opponent piece after a mill or a forced-removal event, or one of
    /// the mover's own pieces when [`removes_own_piece`](Self::removes_own_piece)
    ///
    /// # Errors
    ///
    /// `IllegalMove` if no removal is pending, `s` holds the wrong colour, the piece
    /// is protected by a mill, or a stalemate removal targets a non-adjacent piece.
    pub fn remove_piece(&mut self, s: Square) -> MillEngineResult<()> {
        match self.st.phase {
            Phase::GameOver => return Err(IllegalMove::GameOver.into()),
            Phase::Ready | Phase::None => return Err(IllegalMove::WrongPhase.into()),
            Phase::Placing | Phase::Moving => {}
        }
        if self.st.action != Action::Remove {
            return Err(IllegalMove::WrongAction.into());
        }

        let us = self.st.side_to_move;
        let own = self.removes_own_piece(us);
        let target = if own { us } else { !us };

        if self.piece_to_remove_count(us) == 0 {
            return Err(IllegalMove::NothingToRemove.into());
        }
        if !is_on_board(s) {
            return Err(IllegalMove::InvalidSquare(s).into());
        }
        if self.st.board[s] != Piece::of(target) {
            return Err(if own {
                IllegalMove::NotOwnPiece(s)
            } else {
                IllegalMove::NotOpponentPiece(s)
            }
            .into());
        }

        // Stalemate removal takes precedence over mill protection
        if self.is_stalemate_removal() {
            if !own && !self.is_adjacent_to(s, us) {
                return Err(IllegalMove::NotAdjacentToMover(s).into());
            }
        } else if !self.rule().may_remove_from_mills_always
            && self.potential_mills_count(s, Color::None, SQ_NONE) > 0
            && !self.is_all_in_mills(target)
        {
            return Err(IllegalMove::ProtectedByMill(s).into());
        }

        let mark = self.rule().mill_formation_action_in_placing_phase
            == MillFormationAction::MarkAndDelayRemovingPieces
            && self.st.phase == Phase::Placing;

        self.take_off(s);
        if mark {
            self.put_on(s, Piece::Marked);
        }
        self.st.rule50 = 0;

        debug_assert!(self.piece_on_board_count(target) > 0, "on-board count underflow");
        self.st.piece_on_board[target.index()] -= 1;
        self.st.current_square = SQ_NONE;
        self.st.piece_to_remove[us.index()] -= 1;
        if self.st.piece_to_remove[us.index()] == 0 {
            self.st.removes_own[us.index()] = false;
        }
        self.update_key_misc();

        let at_least = self.rule().pieces_at_least_count;
        if self.piece_on_board_count(target) + self.piece_in_hand_count(target) < at_least {
            self.set_gameover(!target, GameOverReason::LoseFewerThanThree);
            return Ok(());
        }

        if self.piece_to_remove_count(us) != 0 {
            return Ok(());
        }

        if !self.handle_placing_phase_end() {
            if self.st.is_stalemate_removing {
                self.st.is_stalemate_removing = false;
                self.keep_side_to_move();
            } else {
                self.change_side_to_move();
            }
        }

        let side = self.st.side_to_move;
        if self.piece_to_remove_count(side) != 0 {
            return Ok(());
        }
        if self.piece_in_hand_count(side) == 0 {
            self.check_if_game_is_over();
        }
        Ok(())
    }

    /// `loser` gives up
    ///
    /// # Errors
    ///
    /// `IllegalMove` if no game is in progress.
    pub fn resign(&mut self, loser: Color) -> MillEngineResult<()> {
        self.end_by(loser, GameOverReason::LoseResign)
    }

    /// `loser` ran out of time
    ///
    /// # Errors
    ///
    /// `IllegalMove` if no game is in progress.
    pub fn time_over(&mut self, loser: Color) -> MillEngineResult<()> {
        self.end_by(loser, GameOverReason::LoseTimeOver)
    }

    fn end_by(&mut self, loser: Color, reason: GameOverReason) -> MillEngineResult<()> {
        match self.st.phase {
            Phase::GameOver => Err(IllegalMove::GameOver.into()),
            Phase::Ready | Phase::None => Err(IllegalMove::WrongPhase.into()),
            Phase::Placing | Phase::Moving => {
                self.set_gameover(!loser, reason);
                Ok(())
            }
        }
    }

    /// End the game as a draw by repetition
    pub fn declare_threefold_draw(&mut self) {
        self.set_gameover(Color::Draw, GameOverReason::DrawThreefoldRepetition);
    }

    // Search interface

    /// Apply `m`, bumping the ply counter and recording it as the current move
    ///
    /// # Errors
    ///
    /// `IllegalMove` from the dispatched operation; the position is unchanged.
    pub fn apply(&mut self, m: Move) -> MillEngineResult<()> {
        let saved = self.st;
        let result = match m.kind() {
            MoveKind::Remove => self.remove_piece(m.to()),
            MoveKind::Slide => self.move_piece(m.from(), m.to()).map(|_| ()),
            MoveKind::Place => {
                self.st.current_square = SQ_NONE;
                self.put_piece(m.to()).map(|_| ())
            }
        };

        match result {
            Ok(()) => {
                self.st.game_ply += 1;
                self.st.current_move = m;
                Ok(())
            }
            Err(e) => {
                self.st = saved;
                Err(e)
            }
        }
    }

    /// Apply `m` and push the previous state onto `stack`
    ///
    /// # Errors
    ///
    /// `IllegalMove` from the dispatched operation; nothing is pushed.
    pub fn do_move(&mut self, m: Move, stack: &mut StateStack) -> MillEngineResult<()> {
        let saved = self.st;
        let predicted = self.key_after(m);
        self.apply(m)?;
        debug_assert!(
            m.kind() == MoveKind::Remove
                || self.st.side_to_move == saved.side_to_move
                || self.st.marked != saved.marked
                || self.st.action == Action::Remove
                || self.st.phase == Phase::GameOver
                || self.st.key == predicted,
            "key_after({}) disagrees with the applied key",
            m
        );
        stack.push(saved);
        Ok(())
    }

    /// Restore the state saved by the matching [`do_move`](Self::do_move)
    pub fn undo_move(&mut self, stack: &mut StateStack) -> bool {
        match stack.pop() {
            Some(st) => {
                self.st = st;
                true
            }
            None => false,
        }
    }

    /// Key the position would have after `m`, without applying it. Exact for
    /// moves that hand the turn over with nothing left to remove.
    pub(crate) fn key_after(&self, m: Move) -> Key {
        let us = self.st.side_to_move;
        let s = m.to();
        let mut k = self.st.key;

        match m.kind() {
            MoveKind::Remove => {
                let target = if self.removes_own_piece(us) { us } else { !us };
                k ^= hash::psq(Piece::of(target), s);
                if self.rule().mill_formation_action_in_placing_phase
                    == MillFormationAction::MarkAndDelayRemovingPieces
                    && self.st.phase == Phase::Placing
                {
                    k ^= hash::psq(Piece::Marked, s);
                }
            }
            MoveKind::Slide => {
                k ^= hash::psq(Piece::of(us), s) ^ hash::psq(Piece::of(us), m.from());
            }
            MoveKind::Place => k ^= hash::psq(Piece::of(us), s),
        }

        k ^ hash::side_key()
    }

    /// The current key already occurred on `stack` since the last removal
    pub fn has_repeated(&self, stack: &[StateInfo]) -> bool {
        for st in stack.iter().rev() {
            if st.key == self.st.key {
                return true;
            }
            if st.current_move.kind() == MoveKind::Remove {
                break;
            }
        }
        false
    }

    /// Apply a transform to board, selection, last move and mill bookkeeping
    pub fn transform(&mut self, t: Transform) {
        let old = self.st.board;
        for s in SQ_BEGIN..SQ_END {
            self.st.board[t.map_square(s)] = old[s];
        }

        let map = |s: Square| if s == SQ_NONE { SQ_NONE } else { t.map_square(s) };
        self.st.current_square = map(self.st.current_square);
        for c in [Color::White, Color::Black] {
            let i = c.index();
            self.st.last_mill_from[i] = map(self.st.last_mill_from[i]);
            self.st.last_mill_to[i] = map(self.st.last_mill_to[i]);
            self.st.formed_mills[i] = t.map_bitboard(self.st.formed_mills[i]);
        }
        self.st.current_move = t.map_move(self.st.current_move);

        self.reset_bb();
    }

    /// Left-right reflection
    pub fn mirror(&mut self) {
        self.transform(Transform::Mirror);
    }

    /// Swap the inner and outer rings
    pub fn turn(&mut self) {
        self.transform(Transform::Turn);
    }

    /// Rotate clockwise by a multiple of 90 degrees. Other angles are rejected.
    pub fn rotate(&mut self, degrees: i32) -> bool {
        match Transform::rotation(degrees) {
            Some(t) => {
                self.transform(t);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = |s: Square| self.st.board[s].symbol();
        writeln!(f, "{}----------{}----------{}", p(31), p(24), p(25))?;
        writeln!(f, "|          |          |")?;
        writeln!(f, "|   {}------{}------{}   |", p(23), p(16), p(17))?;
        writeln!(f, "|   |      |      |   |")?;
        writeln!(f, "|   |   {}--{}--{}   |   |", p(15), p(8), p(9))?;
        writeln!(f, "|   |   |     |   |   |")?;
        writeln!(f, "{}---{}---{}     {}---{}---{}", p(30), p(22), p(14), p(10), p(18), p(26))?;
        writeln!(f, "|   |   |     |   |   |")?;
        writeln!(f, "|   |   {}--{}--{}   |   |", p(13), p(12), p(11))?;
        writeln!(f, "|   |      |      |   |")?;
        writeln!(f, "|   {}------{}------{}   |", p(21), p(20), p(19))?;
        writeln!(f, "|          |          |")?;
        writeln!(f, "{}----------{}----------{}", p(29), p(28), p(27))?;
        writeln!(
            f,
            "side: {}  phase: {:?}  action: {:?}",
            self.st.side_to_move, self.st.phase, self.st.action
        )?;
        writeln!(
            f,
            "in hand: {}/{}  on board: {}/{}  to remove: {}/{}",
            self.piece_in_hand_count(Color::White),
            self.piece_in_hand_count(Color::Black),
            self.piece_on_board_count(Color::White),
            self.piece_on_board_count(Color::Black),
            self.piece_to_remove_count(Color::White),
            self.piece_to_remove_count(Color::Black),
        )?;
        write!(f, "key: {:016x}", self.st.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_gen::generate_legal;
    use crate::rule::presets;

    fn pos() -> Position {
        Position::default()
    }

    fn play(pos: &mut Position, moves: &[Move]) {
        for &m in moves {
            pos.apply(m)
                .unwrap_or_else(|e| panic!("{:?} should be legal: {}", m, e));
        }
    }

    fn records(pos: &mut Position, records: &[&str]) {
        for r in records {
            assert!(pos.command(r), "{} should be accepted", r);
        }
    }

    /// Twelve a side covering all 24 points with no line of one colour
    const FULL_BOARD: [&str; 24] = [
        "(1,1)", "(1,3)", "(1,2)", "(1,4)", "(1,5)", "(1,7)", "(1,6)", "(1,8)", "(2,3)", "(2,1)",
        "(2,4)", "(2,2)", "(2,7)", "(2,5)", "(2,8)", "(2,6)", "(3,1)", "(3,3)", "(3,2)", "(3,4)",
        "(3,5)", "(3,7)", "(3,6)", "(3,8)",
    ];

    fn twelve(rule: Rule) -> Position {
        Position::new(Rule {
            piece_count: 12,
            has_diagonal_lines: false,
            ..rule
        })
        .unwrap()
    }

    /// White's four ring-one corners hemmed in by Black's four midpoints
    fn hemmed_in(stalemate_action: StalemateAction) -> Position {
        let mut p = Position::new(Rule {
            piece_count: 4,
            stalemate_action,
            ..Rule::default()
        })
        .unwrap();
        records(
            &mut p,
            &["(1,2)", "(1,1)", "(1,4)", "(1,3)", "(1,6)", "(1,5)", "(1,8)", "(1,7)"],
        );
        p
    }

    /// White re-forms the ring-two mill it closed while placing by sliding
    /// (2,1) out to close ring one, then Black shuffles
    const SLIDE_OUT_OF_MILL: [&str; 15] = [
        "(2,8)", "(3,3)", "(2,2)", "(3,5)", "(1,8)", "(3,7)", "(1,2)", "(2,4)", "(2,1)", "-(3,3)",
        "(1,6)", "(2,1)->(1,1)", "-(3,5)", "(3,7)->(3,8)", "(1,2)->(1,3)",
    ];

    #[test]
    fn test_reset_state() {
        let p = pos();
        assert_eq!(p.phase(), Phase::Ready);
        assert_eq!(p.action(), Action::Place);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.piece_in_hand_count(Color::White), 9);
        assert_eq!(p.piece_in_hand_count(Color::Black), 9);
        assert_eq!(p.key(), 0);
    }

    #[test]
    fn test_start_transitions() {
        let mut p = pos();
        assert!(p.start());
        assert_eq!(p.phase(), Phase::Placing);
        assert!(!p.start(), "Already started");
    }

    #[test]
    fn test_place_switches_side() {
        let mut p = pos();
        assert_eq!(p.put_piece(8).unwrap(), 0);
        assert_eq!(p.phase(), Phase::Placing);
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.piece_in_hand_count(Color::White), 8);
        assert_eq!(p.piece_on_board_count(Color::White), 1);
        assert_eq!(p.key(), p.compute_key());
    }

    #[test]
    fn test_place_on_occupied_is_rejected_without_change() {
        let mut p = pos();
        p.put_piece(8).unwrap();
        let before = *p.state();
        assert!(p.put_piece(8).is_err());
        assert_eq!(*p.state(), before);
    }

    #[test]
    fn test_closing_mill_enters_remove_action() {
        let mut p = pos();
        // White 15, 8, then 9 closes the ring side 15-8-9
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(24),
                Move::place(8),
                Move::place(26),
            ],
        );
        assert_eq!(p.put_piece(9).unwrap(), 1);
        assert_eq!(p.action(), Action::Remove);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.piece_to_remove_count(Color::White), 1);
        assert_eq!(p.key(), p.compute_key());
    }

    #[test]
    fn test_mill_protected_piece_cannot_be_removed() {
        let mut p = pos();
        // Black builds 24-25-31 first, White then closes 15-8-9
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(31),
                Move::place(8),
                Move::place(24),
                Move::place(12),
                Move::place(25),
            ],
        );
        // Black closed a mill and must remove; take White's loose 12
        play(&mut p, &[Move::remove(12)]);
        play(&mut p, &[Move::place(12), Move::place(28), Move::place(9)]);
        assert_eq!(p.action(), Action::Remove);

        let before = *p.state();
        let err = p.remove_piece(24).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MillEngineError::IllegalMove(IllegalMove::ProtectedByMill(24))
        ));
        assert_eq!(*p.state(), before, "Rejected removal must not change state");

        p.remove_piece(28).unwrap();
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.piece_on_board_count(Color::Black), 3);
    }

    #[test]
    fn test_all_in_mills_allows_removal_from_mill() {
        let mut p = pos();
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(31),
                Move::place(8),
                Move::place(24),
                Move::place(12),
                Move::place(25),
                Move::remove(12),
            ],
        );
        // Every black piece sits in 31-24-25
        assert!(p.is_all_in_mills(Color::Black));
        assert_eq!(p.put_piece(9).unwrap(), 1);
        assert!(p.remove_piece(24).is_ok());
        assert_eq!(p.piece_on(24), Piece::Empty);
    }

    #[test]
    fn test_do_undo_restores_state() {
        let mut p = pos();
        let mut stack = StateStack::new();
        let before = *p.state();
        p.do_move(Move::place(16), &mut stack).unwrap();
        p.do_move(Move::place(18), &mut stack).unwrap();
        assert_eq!(stack.len(), 2);
        assert!(p.undo_move(&mut stack));
        assert!(p.undo_move(&mut stack));
        assert_eq!(*p.state(), before);
        assert!(!p.undo_move(&mut stack));
    }

    #[test]
    fn test_key_after_matches_applied_key_for_place() {
        let mut p = pos();
        p.put_piece(8).unwrap();
        let predicted = p.key_after(Move::place(16));
        p.put_piece(16).unwrap();
        assert_eq!(predicted, p.key());
    }

    #[test]
    fn test_incremental_key_matches_recompute_through_random_game() {
        use rand::rngs::StdRng;
        use rand::seq::IndexedRandom;
        use rand::SeedableRng;

        for (i, rule) in presets().iter().enumerate() {
            let mut p = Position::new(rule.clone()).unwrap();
            let mut rng = StdRng::seed_from_u64(i as u64 + 11);
            for _ in 0..200 {
                if p.is_game_over() {
                    break;
                }
                let moves = generate_legal(&p);
                let Some(m) = moves.choose(&mut rng).map(|em| em.mv) else {
                    break;
                };
                p.apply(m).unwrap_or_else(|e| {
                    panic!("{}: generated {:?} rejected: {}", rule.name, m, e)
                });
                assert_eq!(p.key(), p.compute_key(), "{}: key drifted", rule.name);
            }
        }
    }

    #[test]
    fn test_fewer_than_three_ends_game() {
        let mut p = pos();
        // Drain Black to two pieces in hand+board terms is long; use a rule with 3 pieces
        p.set_rule(Rule {
            piece_count: 3,
            ..Rule::default()
        })
        .unwrap();
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(24),
                Move::place(8),
                Move::place(26),
                Move::place(9),
            ],
        );
        assert_eq!(p.action(), Action::Remove);
        p.remove_piece(24).unwrap();
        assert!(p.is_game_over());
        assert_eq!(p.winner(), Color::White);
        assert_eq!(p.game_over_reason(), GameOverReason::LoseFewerThanThree);
    }

    #[test]
    fn test_resign() {
        let mut p = pos();
        assert!(p.resign(Color::White).is_err(), "Cannot resign before start");
        p.put_piece(8).unwrap();
        p.resign(Color::Black).unwrap();
        assert_eq!(p.winner(), Color::White);
        assert_eq!(p.game_over_reason(), GameOverReason::LoseResign);
    }

    #[test]
    fn test_rejected_rule_keeps_previous() {
        let mut p = pos();
        let bad = Rule {
            fly_piece_count: 20,
            ..Rule::default()
        };
        assert!(p.set_rule(bad).is_err());
        assert_eq!(p.rule().piece_count, 9);
    }

    #[test]
    fn test_mark_and_delay_marks_removed_points() {
        let da_san_qi = presets()
            .iter()
            .find(|r| r.name == "Da San Qi")
            .cloned()
            .unwrap();
        let mut p = Position::new(da_san_qi).unwrap();
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(24),
                Move::place(8),
                Move::place(26),
                Move::place(9),
                Move::remove(24),
            ],
        );
        assert_eq!(p.piece_on(24), Piece::Marked);
        assert!(p.put_piece(24).is_err(), "Marked points cannot be reused");
        assert_eq!(p.key(), p.compute_key());
    }

    #[test]
    fn test_stalemate_actions() {
        let p = hemmed_in(StalemateAction::EndWithStalemateLoss);
        assert!(p.is_game_over());
        assert_eq!(p.winner(), Color::Black);
        assert_eq!(p.game_over_reason(), GameOverReason::LoseNoLegalMoves);

        let p = hemmed_in(StalemateAction::EndWithStalemateDraw);
        assert_eq!(p.winner(), Color::Draw);
        assert_eq!(p.game_over_reason(), GameOverReason::DrawStalemateCondition);

        let p = hemmed_in(StalemateAction::ChangeSideToMove);
        assert!(!p.is_game_over());
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.action(), Action::Select);
        assert_eq!(p.key(), p.compute_key());

        for (action, next) in [
            (StalemateAction::RemoveOpponentsPieceAndMakeNextMove, Color::White),
            (StalemateAction::RemoveOpponentsPieceAndChangeSideToMove, Color::Black),
        ] {
            let mut p = hemmed_in(action);
            assert_eq!(p.side_to_move(), Color::White);
            assert_eq!(p.action(), Action::Remove);
            assert_eq!(p.piece_to_remove_count(Color::White), 1);
            assert!(p.is_stalemate_removal());
            assert_eq!(p.key(), p.compute_key());

            p.remove_piece(8).unwrap();
            assert_eq!(p.side_to_move(), next, "{:?}", action);
            assert_eq!(p.action(), Action::Select);
            assert_eq!(p.piece_on_board_count(Color::Black), 3);
        }
    }

    #[test]
    fn test_board_full_actions() {
        let p = {
            let mut p = twelve(Rule::default());
            records(&mut p, &FULL_BOARD);
            p
        };
        assert_eq!(p.winner(), Color::Black);
        assert_eq!(p.game_over_reason(), GameOverReason::LoseFullBoard);

        let mut p = twelve(Rule {
            board_full_action: BoardFullAction::AgreeToDraw,
            ..Rule::default()
        });
        records(&mut p, &FULL_BOARD);
        assert_eq!(p.winner(), Color::Draw);
        assert_eq!(p.game_over_reason(), GameOverReason::DrawFullBoard);

        // Removal order, then the side left to slide
        for (action, removals, mover) in [
            (
                BoardFullAction::FirstAndSecondPlayerRemovePiece,
                &["-(1,3)", "-(3,1)"][..],
                Color::White,
            ),
            (
                BoardFullAction::SecondAndFirstPlayerRemovePiece,
                &["-(1,1)", "-(1,3)"][..],
                Color::Black,
            ),
            (BoardFullAction::SideToMoveRemovePiece, &["-(1,3)"][..], Color::Black),
        ] {
            let mut p = twelve(Rule {
                board_full_action: action,
                ..Rule::default()
            });
            records(&mut p, &FULL_BOARD);
            assert!(!p.is_game_over(), "{:?}", action);
            assert_eq!(p.action(), Action::Remove);
            assert_eq!(p.key(), p.compute_key());

            records(&mut p, removals);
            assert_eq!(p.side_to_move(), mover, "{:?}", action);
            assert_eq!(p.phase(), Phase::Moving);
            assert_eq!(p.action(), Action::Select);
        }
    }

    #[test]
    fn test_may_remove_from_mills_always_lifts_protection() {
        let mut p = Position::new(Rule {
            may_remove_from_mills_always: true,
            ..Rule::default()
        })
        .unwrap();
        play(
            &mut p,
            &[
                Move::place(15),
                Move::place(31),
                Move::place(8),
                Move::place(24),
                Move::place(12),
                Move::place(25),
                Move::remove(12),
                Move::place(12),
                Move::place(28),
                Move::place(9),
            ],
        );
        assert!(!p.is_all_in_mills(Color::Black), "28 stands outside the mill");
        assert!(generate_legal(&p).iter().any(|m| m.mv == Move::remove(24)));
        p.remove_piece(24).unwrap();
        assert_eq!(p.piece_on(24), Piece::Empty);
    }

    #[test]
    fn test_repeated_mill_restriction_blocks_sliding_back() {
        let rule = Rule {
            piece_count: 5,
            may_fly: false,
            restrict_repeated_mills_formation: true,
            ..Rule::default()
        };
        let mut p = Position::new(rule.clone()).unwrap();
        records(&mut p, &SLIDE_OUT_OF_MILL[..14]);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.last_mill_to(Color::White), 8);

        let back: Move = "(1,1)->(2,1)".parse().unwrap();
        assert!(!generate_legal(&p).iter().any(|m| m.mv == back));
        let before = *p.state();
        assert!(!p.command("(1,1)->(2,1)"));
        assert_eq!(*p.state(), before);
        assert!(p.command(SLIDE_OUT_OF_MILL[14]), "Other pieces still move");

        let mut free = Position::new(Rule {
            restrict_repeated_mills_formation: false,
            ..rule
        })
        .unwrap();
        records(&mut free, &SLIDE_OUT_OF_MILL[..14]);
        assert!(free.command("(1,1)->(2,1)"));
        assert_eq!(free.action(), Action::Remove);
    }

    #[test]
    fn test_one_time_use_mill_closes_once() {
        let mut p = Position::new(Rule {
            piece_count: 5,
            may_fly: false,
            one_time_use_mill: true,
            ..Rule::default()
        })
        .unwrap();
        records(&mut p, &SLIDE_OUT_OF_MILL[..12]);
        assert_eq!(p.action(), Action::Remove, "Ring one closes for the first time");
        records(&mut p, &SLIDE_OUT_OF_MILL[12..14]);

        assert!(p.command("(1,1)->(2,1)"), "Ring two was already used");
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.action(), Action::Select);
        assert_eq!(p.piece_to_remove_count(Color::White), 0);
    }

    #[test]
    fn test_moving_during_placing() {
        let mut p = Position::new(Rule {
            piece_count: 10,
            may_move_in_placing_phase: true,
            ..Rule::default()
        })
        .unwrap();
        records(&mut p, &["(1,1)", "(3,3)"]);

        let slide = Move::slide(8, 9);
        let moves = generate_legal(&p);
        assert!(moves.iter().any(|m| m.mv == slide));
        assert!(moves.iter().any(|m| m.mv == Move::place(9)));

        p.apply(slide).unwrap();
        assert_eq!(p.phase(), Phase::Placing);
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.piece_in_hand_count(Color::White), 9, "A slide keeps the hand");
        assert_eq!(p.piece_on(8), Piece::Empty);
        assert_eq!(p.color_on(9), Color::White);
    }

    #[test]
    fn test_mill_count_removal_without_mills_takes_own_pieces() {
        let mut p = Position::new(Rule::preset(9).unwrap()).unwrap();
        records(&mut p, &FULL_BOARD);

        assert_eq!(p.phase(), Phase::Moving);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.action(), Action::Remove);
        assert!(p.removes_own_piece(Color::White));
        assert!(p.removes_own_piece(Color::Black));
        assert_eq!(p.key(), p.compute_key());

        let moves = generate_legal(&p);
        assert_eq!(moves.len(), 12);
        assert!(moves.iter().all(|m| p.color_on(m.mv.to()) == Color::White));
        assert!(!p.command("-(1,3)"), "Black's pieces are not White's to take");

        records(&mut p, &["-(1,1)"]);
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.action(), Action::Remove);
        assert!(!p.removes_own_piece(Color::White));
        assert_eq!(p.key(), p.compute_key());

        records(&mut p, &["-(2,1)"]);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.action(), Action::Select);
        assert_eq!(p.piece_on_board_count(Color::White), 11);
        assert_eq!(p.piece_on_board_count(Color::Black), 11);
    }

    #[test]
    fn test_mill_count_removal_favours_the_side_with_mills() {
        let mut p = Position::new(Rule::preset(9).unwrap()).unwrap();
        records(&mut p, &["(1,8)", "(1,3)", "(1,1)", "(1,4)", "(1,2)"]);
        assert_eq!(p.action(), Action::Place, "Placing mills remove nothing yet");
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.piece_to_remove_count(Color::White), 0);

        records(
            &mut p,
            &[
                "(1,5)", "(1,6)", "(1,7)", "(2,3)", "(2,1)", "(2,4)", "(2,2)", "(2,7)", "(2,5)",
                "(2,8)", "(2,6)", "(3,1)", "(3,3)", "(3,2)", "(3,4)", "(3,5)", "(3,7)", "(3,6)",
                "(3,8)",
            ],
        );
        assert_eq!(p.total_mills_count(Color::White), 1);
        assert_eq!(p.total_mills_count(Color::Black), 0);
        assert_eq!(p.piece_to_remove_count(Color::White), 2);
        assert_eq!(p.piece_to_remove_count(Color::Black), 1);
        assert!(!p.removes_own_piece(Color::White));

        records(&mut p, &["-(1,3)", "-(1,4)", "-(1,1)"]);
        assert_eq!(p.side_to_move(), Color::White);
        assert_eq!(p.action(), Action::Select);
        assert_eq!(p.piece_on_board_count(Color::White), 11);
        assert_eq!(p.piece_on_board_count(Color::Black), 10);
    }

    #[test]
    fn test_moving_phase_requires_adjacent_destination() {
        let mut p = Position::new(Rule {
            piece_count: 4,
            ..Rule::default()
        })
        .unwrap();
        // 8 placements without mills
        play(
            &mut p,
            &[
                Move::place(8),
                Move::place(9),
                Move::place(10),
                Move::place(11),
                Move::place(12),
                Move::place(13),
                Move::place(14),
                Move::place(15),
            ],
        );
        assert_eq!(p.phase(), Phase::Moving);
        assert_eq!(p.action(), Action::Select);
        assert!(p.move_piece(8, 24).is_err(), "8 and 24 are not adjacent");
        assert!(p.move_piece(8, 16).is_ok());
        assert_eq!(p.side_to_move(), Color::Black);
        assert_eq!(p.rule50_count(), 1);
    }
}
