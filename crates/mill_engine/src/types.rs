//! # Mill Engine Core Types
//!
//! ## Overview
//!
//! This module defines the small value types every other part of the engine is built on:
//! squares, colours, pieces, the phase/action state machine, the packed `Move`, search
//! bounds, and the reasons a game can end.
//!
//! ## Board Coordinates
//!
//! The 24 playable points of a morris board are embedded in a 40-slot array. A square
//! index encodes a ring ("file") and a position on that ring ("rank"):
//!
//! - `file = square >> 3` runs 1..=3 from the inner ring outwards
//! - `rank = (square & 7) + 1` runs 1..=8 clockwise starting at the top middle point
//!
//! Slots 0..8 and 32..40 are padding so that `file * 8 + rank - 1` never needs a bounds
//! branch. Only squares in `SQ_BEGIN..SQ_END` can ever be produced by move generation.
//!
//! ## The `Move` Encoding
//!
//! A move fits in a single `i32`:
//!
//! | Kind   | Encoding            |
//! |--------|---------------------|
//! | Place  | `to`                |
//! | Slide  | `(from << 8) \| to` |
//! | Remove | `-to`               |
//!
//! The sign and the high byte alone select the kind, so moves stay 32-bit and can be
//! stored in the transposition table without a tag. Call sites never decode bits by hand;
//! they use [`Move::place`], [`Move::slide`], [`Move::remove`], [`Move::kind`],
//! [`Move::from`] and [`Move::to`].

use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};

use crate::constants::{SQ_BEGIN, SQ_END};

/// Index into the 40-slot board array
pub type Square = usize;

/// Zobrist key
pub type Key = u64;

/// Search score. Small signed range: draw is 0, mates sit near +-80.
pub type Value = i32;

/// Search depth in plies
pub type Depth = i32;

/// Ring of a square, 1 = inner ring
#[inline]
pub const fn file_of(s: Square) -> usize {
    s >> 3
}

/// Position of a square on its ring, 1..=8
#[inline]
pub const fn rank_of(s: Square) -> usize {
    (s & 7) + 1
}

/// Build a square from ring and rank
#[inline]
pub const fn make_square(file: usize, rank: usize) -> Square {
    (file << 3) + rank - 1
}

/// Whether `s` is one of the 24 live points
#[inline]
pub const fn is_on_board(s: Square) -> bool {
    s >= SQ_BEGIN && s < SQ_END
}

/// Side colour. `None` and `Draw` only appear as winners or "no owner".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    None,
    White,
    Black,
    Draw,
}

impl Color {
    /// Slot used by per-colour counter arrays
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::None => 0,
            Color::White => 1,
            Color::Black => 2,
            Color::Draw => 3,
        }
    }

    /// The other player. `None` and `Draw` map to themselves.
    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
            other => other,
        }
    }

    /// `1` for White, `2` for Black, as used in "PlayerN" records
    pub const fn player_number(self) -> u8 {
        self.index() as u8
    }

    pub fn from_player_number(n: u8) -> Option<Color> {
        match n {
            1 => Some(Color::White),
            2 => Some(Color::Black),
            _ => None,
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        self.opponent()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::None => "none",
            Color::White => "white",
            Color::Black => "black",
            Color::Draw => "draw",
        };
        f.write_str(name)
    }
}

/// Content of a board slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Piece {
    #[default]
    Empty,
    White,
    Black,
    /// A point vacated during placing under mark-and-delay rules. Cannot be reused
    /// until the placing phase ends.
    Marked,
}

impl Piece {
    #[inline]
    pub const fn of(c: Color) -> Piece {
        match c {
            Color::White => Piece::White,
            Color::Black => Piece::Black,
            _ => Piece::Empty,
        }
    }

    #[inline]
    pub const fn color(self) -> Color {
        match self {
            Piece::White => Color::White,
            Piece::Black => Color::Black,
            _ => Color::None,
        }
    }

    /// Row in the Zobrist piece-square table
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Piece::Empty => 0,
            Piece::White => 1,
            Piece::Black => 2,
            Piece::Marked => 3,
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, Piece::Empty)
    }

    /// Character used by the text board dump
    pub const fn symbol(self) -> char {
        match self {
            Piece::Empty => '*',
            Piece::White => 'O',
            Piece::Black => '@',
            Piece::Marked => 'X',
        }
    }
}

/// Game phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    None,
    Ready,
    Placing,
    Moving,
    GameOver,
}

/// What the side to move is expected to do next
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    None,
    Select,
    Place,
    Remove,
}

/// Shape of a [`Move`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Place,
    Slide,
    Remove,
}

/// Packed move, see the module docs for the layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Move(i32);

impl Move {
    pub const NONE: Move = Move(0);
    pub const NULL: Move = Move(65);

    #[inline]
    pub const fn place(to: Square) -> Move {
        Move(to as i32)
    }

    #[inline]
    pub const fn slide(from: Square, to: Square) -> Move {
        Move(((from as i32) << 8) | to as i32)
    }

    #[inline]
    pub const fn remove(square: Square) -> Move {
        Move(-(square as i32))
    }

    #[inline]
    pub const fn from_raw(raw: i32) -> Move {
        Move(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn kind(self) -> MoveKind {
        if self.0 < 0 {
            MoveKind::Remove
        } else if self.0 & 0x1f00 != 0 {
            MoveKind::Slide
        } else {
            MoveKind::Place
        }
    }

    /// Origin square of a slide, `0` for the other kinds
    #[inline]
    pub const fn from(self) -> Square {
        if self.0 < 0 {
            0
        } else {
            ((self.0 >> 8) & 0x7f) as Square
        }
    }

    #[inline]
    pub const fn to(self) -> Square {
        (self.0.unsigned_abs() & 0xff) as Square
    }

    /// True for every real move: not NONE, not NULL, and `from != to`
    #[inline]
    pub const fn is_ok(self) -> bool {
        self.0 != Move::NONE.0 && self.0 != Move::NULL.0 && self.from() != self.to()
    }
}

/// A generated move together with its ordering score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ExtMove {
    pub mv: Move,
    pub value: i32,
}

impl ExtMove {
    pub const fn new(mv: Move) -> Self {
        Self { mv, value: 0 }
    }
}

/// Transposition-table bound kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Bound {
    #[default]
    None,
    Upper,
    Lower,
    Exact,
}

/// Why a game entered [`Phase::GameOver`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GameOverReason {
    #[default]
    None,
    LoseFewerThanThree,
    LoseNoLegalMoves,
    LoseFullBoard,
    LoseResign,
    LoseTimeOver,
    DrawThreefoldRepetition,
    DrawFiftyMove,
    DrawEndgameFiftyMove,
    DrawFullBoard,
    DrawStalemateCondition,
}

impl GameOverReason {
    pub const fn is_draw(self) -> bool {
        matches!(
            self,
            GameOverReason::DrawThreefoldRepetition
                | GameOverReason::DrawFiftyMove
                | GameOverReason::DrawEndgameFiftyMove
                | GameOverReason::DrawFullBoard
                | GameOverReason::DrawStalemateCondition
        )
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameOverReason::None => "no reason",
            GameOverReason::LoseFewerThanThree => "insufficient pieces",
            GameOverReason::LoseNoLegalMoves => "no legal moves",
            GameOverReason::LoseFullBoard => "board is full",
            GameOverReason::LoseResign => "resigned",
            GameOverReason::LoseTimeOver => "time over",
            GameOverReason::DrawThreefoldRepetition => "threefold repetition",
            GameOverReason::DrawFiftyMove => "N-move rule",
            GameOverReason::DrawEndgameFiftyMove => "endgame N-move rule",
            GameOverReason::DrawFullBoard => "board is full",
            GameOverReason::DrawStalemateCondition => "stalemate",
        };
        f.write_str(text)
    }
}
