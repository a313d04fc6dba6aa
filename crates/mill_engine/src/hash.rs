//! Zobrist hashing
//!
//! Random keys for every (piece, square) pair plus the side to move. Keys are
//! generated once from a fixed seed so hashes are reproducible across runs, and
//! shifted right by `KEY_MISC_BIT` so the top bits stay free for the pending
//! removal state.

use std::sync::LazyLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{KEY_MISC_BIT, PIECE_TYPE_NB, SQUARE_EXT_NB, ZOBRIST_SEED};
use crate::types::{Key, Piece, Square};

pub struct Zobrist {
    psq: [[Key; SQUARE_EXT_NB]; PIECE_TYPE_NB],
    side: Key,
}

impl Zobrist {
    fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut psq = [[0; SQUARE_EXT_NB]; PIECE_TYPE_NB];
        for row in psq.iter_mut().skip(1) {
            for key in row.iter_mut() {
                *key = rng.random::<Key>() >> KEY_MISC_BIT;
            }
        }

        Self {
            psq,
            side: rng.random::<Key>() >> KEY_MISC_BIT,
        }
    }
}

static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(|| Zobrist::new(ZOBRIST_SEED));

/// Key of `piece` standing on `s`. Empty squares hash to zero.
#[inline]
pub fn psq(piece: Piece, s: Square) -> Key {
    ZOBRIST.psq[piece.index()][s]
}

/// Key toggled whenever the side to move changes
#[inline]
pub fn side_key() -> Key {
    ZOBRIST.side
}

/// Replace the misc bits of `key` with `misc`
#[inline]
pub fn with_misc(key: Key, misc: u32) -> Key {
    let shift = Key::BITS - KEY_MISC_BIT;
    let body = (key << KEY_MISC_BIT) >> KEY_MISC_BIT;
    body | ((misc as Key & ((1 << KEY_MISC_BIT) - 1)) << shift)
}

/// Derive a secondary key (LCG step), used to salt per-thread values
#[inline]
pub const fn make_key(seed: u64) -> Key {
    seed.wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}
