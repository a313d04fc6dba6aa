//! Static board tables
//!
//! Neighbour lists and mill lines for both board layouts. Padding squares
//! (0..8 and 32..40) have no neighbours; a `0` slot means "no neighbour in
//! this direction".

use crate::constants::{MD_NB, SQUARE_EXT_NB};
use crate::types::Square;

/// Neighbours without diagonal lines: clockwise, anticlockwise, inward, outward
#[rustfmt::skip]
pub(crate) const ADJACENT_SQUARES: [[Square; MD_NB]; SQUARE_EXT_NB] = [
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],

    /*  8 */ [16, 9, 15, 0],
    /*  9 */ [10, 8, 0, 0],
    /* 10 */ [18, 11, 9, 0],
    /* 11 */ [12, 10, 0, 0],
    /* 12 */ [20, 13, 11, 0],
    /* 13 */ [14, 12, 0, 0],
    /* 14 */ [22, 15, 13, 0],
    /* 15 */ [8, 14, 0, 0],

    /* 16 */ [8, 24, 17, 23],
    /* 17 */ [18, 16, 0, 0],
    /* 18 */ [10, 26, 19, 17],
    /* 19 */ [20, 18, 0, 0],
    /* 20 */ [12, 28, 21, 19],
    /* 21 */ [22, 20, 0, 0],
    /* 22 */ [14, 30, 23, 21],
    /* 23 */ [16, 22, 0, 0],

    /* 24 */ [16, 25, 31, 0],
    /* 25 */ [26, 24, 0, 0],
    /* 26 */ [18, 27, 25, 0],
    /* 27 */ [28, 26, 0, 0],
    /* 28 */ [20, 29, 27, 0],
    /* 29 */ [30, 28, 0, 0],
    /* 30 */ [22, 31, 29, 0],
    /* 31 */ [24, 30, 0, 0],

    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
];

/// Neighbours with diagonal lines joining the ring corners
#[rustfmt::skip]
pub(crate) const ADJACENT_SQUARES_DIAGONAL: [[Square; MD_NB]; SQUARE_EXT_NB] = [
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],

    /*  8 */ [9, 15, 16, 0],
    /*  9 */ [17, 8, 10, 0],
    /* 10 */ [9, 11, 18, 0],
    /* 11 */ [19, 10, 12, 0],
    /* 12 */ [11, 13, 20, 0],
    /* 13 */ [21, 12, 14, 0],
    /* 14 */ [13, 15, 22, 0],
    /* 15 */ [23, 8, 14, 0],

    /* 16 */ [17, 23, 8, 24],
    /* 17 */ [9, 25, 16, 18],
    /* 18 */ [17, 19, 10, 26],
    /* 19 */ [11, 27, 18, 20],
    /* 20 */ [19, 21, 12, 28],
    /* 21 */ [13, 29, 20, 22],
    /* 22 */ [21, 23, 14, 30],
    /* 23 */ [15, 31, 16, 22],

    /* 24 */ [25, 31, 16, 0],
    /* 25 */ [17, 24, 26, 0],
    /* 26 */ [25, 27, 18, 0],
    /* 27 */ [19, 26, 28, 0],
    /* 28 */ [27, 29, 20, 0],
    /* 29 */ [21, 28, 30, 0],
    /* 30 */ [29, 31, 22, 0],
    /* 31 */ [23, 24, 30, 0],

    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
    [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0],
];

/// The sixteen lines every board has: four ring sides per ring plus four cross lines
#[rustfmt::skip]
pub(crate) const LINES: [[Square; 3]; 16] = [
    [31, 24, 25], [23, 16, 17], [15, 8, 9],
    [30, 22, 14], [10, 18, 26],
    [13, 12, 11], [21, 20, 19], [29, 28, 27],
    [31, 30, 29], [23, 22, 21], [15, 14, 13],
    [24, 16, 8], [12, 20, 28],
    [9, 10, 11], [17, 18, 19], [25, 26, 27],
];

/// Corner-to-corner lines added by diagonal variants
#[rustfmt::skip]
pub(crate) const DIAGONAL_LINES: [[Square; 3]; 4] = [
    [31, 23, 15], [9, 17, 25], [29, 21, 13], [11, 19, 27],
];

/// Placement priority groups: cross points of the middle ring first, then
/// the other cross points, then corners
#[rustfmt::skip]
pub(crate) const PRIORITY_GROUPS: [&[Square]; 4] = [
    &[16, 18, 20, 22],
    &[24, 26, 28, 30, 8, 10, 12, 14],
    &[17, 19, 21, 23],
    &[25, 27, 29, 31, 9, 11, 13, 15],
];

/// With diagonals the corners carry more lines, so they lead
#[rustfmt::skip]
pub(crate) const PRIORITY_GROUPS_DIAGONAL: [&[Square]; 4] = [
    &[17, 19, 21, 23],
    &[25, 27, 29, 31, 9, 11, 13, 15],
    &[16, 18, 20, 22],
    &[24, 26, 28, 30, 8, 10, 12, 14],
];
