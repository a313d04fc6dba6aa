//! Board symmetries
//!
//! Every transform permutes squares within the 24 live points and maps lines
//! onto lines, with or without diagonals. Ranks are numbered clockwise from
//! the top middle point, so a quarter turn shifts every rank by two.

use crate::bitboard::Bitboard;
use crate::types::{Move, MoveKind, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Left-right reflection
    Mirror,
    /// Inner ring and outer ring trade places
    Turn,
    /// Clockwise quarter turns
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Transform {
    /// Rotation for `degrees`, normalised into 0..360. `None` unless it is a
    /// non-zero multiple of 90.
    pub fn rotation(degrees: i32) -> Option<Transform> {
        match degrees.rem_euclid(360) {
            90 => Some(Transform::Rotate90),
            180 => Some(Transform::Rotate180),
            270 => Some(Transform::Rotate270),
            _ => None,
        }
    }

    /// The transform that undoes this one
    pub fn inverse(self) -> Transform {
        match self {
            Transform::Rotate90 => Transform::Rotate270,
            Transform::Rotate270 => Transform::Rotate90,
            other => other,
        }
    }

    pub fn map_square(self, s: Square) -> Square {
        let file = s >> 3;
        let rank = s & 7;
        match self {
            Transform::Mirror => (file << 3) | ((8 - rank) & 7),
            Transform::Turn => ((4 - file) << 3) | rank,
            Transform::Rotate90 => (file << 3) | ((rank + 2) & 7),
            Transform::Rotate180 => (file << 3) | ((rank + 4) & 7),
            Transform::Rotate270 => (file << 3) | ((rank + 6) & 7),
        }
    }

    /// Sentinels pass through unchanged
    pub fn map_move(self, m: Move) -> Move {
        if !m.is_ok() {
            return m;
        }
        match m.kind() {
            MoveKind::Place => Move::place(self.map_square(m.to())),
            MoveKind::Slide => Move::slide(self.map_square(m.from()), self.map_square(m.to())),
            MoveKind::Remove => Move::remove(self.map_square(m.to())),
        }
    }

    pub fn map_bitboard(self, bb: Bitboard) -> Bitboard {
        bb.squares()
            .fold(Bitboard::EMPTY, |acc, s| acc | Bitboard::square(self.map_square(s)))
    }

    /// Map a move record; control records are returned unchanged
    pub fn map_record(self, record: &str) -> String {
        match record.parse::<Move>() {
            Ok(m) => self.map_move(m).to_string(),
            Err(_) => record.to_string(),
        }
    }
}
