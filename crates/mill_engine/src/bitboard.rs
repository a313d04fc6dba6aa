//! # Bitboard - 32-bit Set of Board Points
//!
//! ## Overview
//!
//! A morris board has 24 live points, embedded at indices 8..32 of the 40-slot square
//! array. Those indices fit exactly into the upper 24 bits of a `u32`, so a whole side's
//! pieces, the occupied set, or a mill line can each be held in one register:
//!
//! - **Insert**: `bb |= 1 << sq`
//! - **Remove**: `bb &= !(1 << sq)`
//! - **Contains**: `bb & (1 << sq) != 0`
//! - **Count**: `bb.count_ones()` (hardware POPCNT)
//!
//! Mill detection is a subset test. The mill table stores, for each square and each line
//! through it, the two *other* points of that line; a square closes a mill for a colour
//! when the colour's bitboard [`covers`](Bitboard::covers) that pair.

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use crate::types::Square;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bitboard(pub u32);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);

    #[inline]
    pub const fn square(s: Square) -> Self {
        Bitboard(1 << s)
    }

    #[inline]
    pub fn insert(&mut self, s: Square) {
        self.0 |= 1 << s;
    }

    #[inline]
    pub fn remove(&mut self, s: Square) {
        self.0 &= !(1 << s);
    }

    #[inline]
    pub const fn contains(self, s: Square) -> bool {
        self.0 & (1 << s) != 0
    }

    #[inline]
    pub const fn count_ones(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Every bit of `mask` is also set in `self`. An empty mask is never covered.
    #[inline]
    pub const fn covers(self, mask: Bitboard) -> bool {
        mask.0 != 0 && self.0 & mask.0 == mask.0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Iterate set squares from lowest to highest
    pub fn squares(self) -> Squares {
        Squares(self.0)
    }
}

/// Iterator over the squares of a [`Bitboard`]
pub struct Squares(u32);

impl Iterator for Squares {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let s = self.0.trailing_zeros() as Square;
        self.0 &= self.0 - 1;
        Some(s)
    }
}

impl BitOr for Bitboard {
    type Output = Bitboard;

    fn bitor(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 | rhs.0)
    }
}

impl BitAnd for Bitboard {
    type Output = Bitboard;

    fn bitand(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 & rhs.0)
    }
}

impl Not for Bitboard {
    type Output = Bitboard;

    fn not(self) -> Bitboard {
        Bitboard(!self.0)
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Bitboard) {
        self.0 |= rhs.0;
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Bitboard) {
        self.0 &= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_contains() {
        let mut bb = Bitboard::EMPTY;
        bb.insert(8);
        bb.insert(31);
        assert!(bb.contains(8));
        assert!(bb.contains(31));
        assert_eq!(bb.count_ones(), 2);

        bb.remove(8);
        assert!(!bb.contains(8));
        assert_eq!(bb.count_ones(), 1);
    }

    #[test]
    fn test_covers_requires_every_bit() {
        let line = Bitboard::square(16) | Bitboard::square(24);
        let mut owned = Bitboard::square(16);
        assert!(!owned.covers(line));
        owned.insert(24);
        assert!(owned.covers(line));
        assert!(!owned.covers(Bitboard::EMPTY), "Empty masks never count as lines");
    }

    #[test]
    fn test_squares_iterates_in_order() {
        let bb = Bitboard::square(30) | Bitboard::square(9) | Bitboard::square(17);
        let squares: Vec<Square> = bb.squares().collect();
        assert_eq!(squares, vec![9, 17, 30]);
    }
}
