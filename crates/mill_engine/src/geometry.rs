//! Board geometry derived from a rule
//!
//! Neighbour lists, mill masks and the placement priority order. The tables
//! depend only on `Rule::has_diagonal_lines` and are rebuilt whenever a new
//! rule is adopted; nothing mutates them afterwards except the optional
//! priority shuffle done on a private copy before a search.

mod tables;

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bitboard::Bitboard;
use crate::constants::{LD_NB, MD_NB, SQUARE_EXT_NB, SQUARE_NB};
use crate::error::MillEngineResult;
use crate::rule::Rule;
use crate::types::Square;

use tables::{
    ADJACENT_SQUARES, ADJACENT_SQUARES_DIAGONAL, DIAGONAL_LINES, LINES, PRIORITY_GROUPS,
    PRIORITY_GROUPS_DIAGONAL,
};

/// Precomputed tables for one board layout
#[derive(Clone, Debug)]
pub struct Geometry {
    has_diagonal_lines: bool,
    adjacent: [[Square; MD_NB]; SQUARE_EXT_NB],
    adjacent_bb: [Bitboard; SQUARE_EXT_NB],
    /// For each square, the other two points of every line through it
    mill_table: [[Bitboard; LD_NB]; SQUARE_EXT_NB],
    lines: Vec<Bitboard>,
    priority: [Square; SQUARE_NB],
}

impl Geometry {
    pub fn new(has_diagonal_lines: bool) -> Self {
        let adjacent = if has_diagonal_lines {
            ADJACENT_SQUARES_DIAGONAL
        } else {
            ADJACENT_SQUARES
        };

        let mut adjacent_bb = [Bitboard::EMPTY; SQUARE_EXT_NB];
        for (s, neighbours) in adjacent.iter().enumerate() {
            for &n in neighbours.iter().filter(|&&n| n != 0) {
                adjacent_bb[s].insert(n);
            }
        }

        let mut line_points: Vec<[Square; 3]> = LINES.to_vec();
        if has_diagonal_lines {
            line_points.extend_from_slice(&DIAGONAL_LINES);
        }

        let mut mill_table = [[Bitboard::EMPTY; LD_NB]; SQUARE_EXT_NB];
        let mut filled = [0usize; SQUARE_EXT_NB];
        for points in &line_points {
            for &s in points {
                let others = points
                    .iter()
                    .filter(|&&p| p != s)
                    .fold(Bitboard::EMPTY, |acc, &p| acc | Bitboard::square(p));
                debug_assert!(filled[s] < LD_NB, "at most three lines cross a point");
                mill_table[s][filled[s]] = others;
                filled[s] += 1;
            }
        }

        let lines = line_points
            .iter()
            .map(|points| {
                points
                    .iter()
                    .fold(Bitboard::EMPTY, |acc, &p| acc | Bitboard::square(p))
            })
            .collect();

        let groups = if has_diagonal_lines {
            PRIORITY_GROUPS_DIAGONAL
        } else {
            PRIORITY_GROUPS
        };
        let mut priority = [0; SQUARE_NB];
        for (slot, &s) in priority.iter_mut().zip(groups.iter().flat_map(|g| g.iter())) {
            *slot = s;
        }

        Self {
            has_diagonal_lines,
            adjacent,
            adjacent_bb,
            mill_table,
            lines,
            priority,
        }
    }

    #[inline]
    pub fn has_diagonal_lines(&self) -> bool {
        self.has_diagonal_lines
    }

    /// Neighbour slots of `s`; unused slots hold `0`
    #[inline]
    pub fn adjacent(&self, s: Square) -> &[Square; MD_NB] {
        &self.adjacent[s]
    }

    #[inline]
    pub fn neighbours(&self, s: Square) -> impl Iterator<Item = Square> + '_ {
        self.adjacent[s].iter().copied().filter(|&n| n != 0)
    }

    #[inline]
    pub fn adjacent_bb(&self, s: Square) -> Bitboard {
        self.adjacent_bb[s]
    }

    #[inline]
    pub fn is_adjacent(&self, a: Square, b: Square) -> bool {
        self.adjacent_bb[a].contains(b)
    }

    /// Partner pairs of every line through `s`; unused slots are empty
    #[inline]
    pub fn mill_masks(&self, s: Square) -> &[Bitboard; LD_NB] {
        &self.mill_table[s]
    }

    /// All full lines of the board
    pub fn lines(&self) -> &[Bitboard] {
        &self.lines
    }

    /// Placement order; slides and removals walk it backwards
    pub fn priority(&self) -> &[Square; SQUARE_NB] {
        &self.priority
    }

    /// Points where an early placement is worth a bonus
    pub fn is_star_square(&self, s: Square) -> bool {
        if self.has_diagonal_lines {
            matches!(s, 17 | 19 | 21 | 23)
        } else {
            matches!(s, 16 | 18 | 20 | 22)
        }
    }

    /// Shuffle within each priority group, keeping the group order
    pub fn shuffle_priority<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut start = 0;
        for len in [4, 8, 4, 8] {
            self.priority[start..start + len].shuffle(rng);
            start += len;
        }
    }
}

/// A validated rule together with the tables derived from it
///
/// Shared read-only between every `Position` of a game and every search
/// thread through an `Arc`.
#[derive(Clone, Debug)]
pub struct Variant {
    rule: Rule,
    geometry: Geometry,
}

impl Variant {
    /// Validate `rule`, then build its geometry
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` before any table is built.
    pub fn new(rule: Rule) -> MillEngineResult<Arc<Variant>> {
        rule.validate()?;
        let geometry = Geometry::new(rule.has_diagonal_lines);
        Ok(Arc::new(Variant { rule, geometry }))
    }

    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Copy with a shuffled priority list
    pub fn reshuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Variant {
        let mut geometry = self.geometry.clone();
        geometry.shuffle_priority(rng);
        Variant {
            rule: self.rule.clone(),
            geometry,
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        let rule = Rule::default();
        let geometry = Geometry::new(rule.has_diagonal_lines);
        Variant { rule, geometry }
    }
}
