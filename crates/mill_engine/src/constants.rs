//! Engine constants
//!
//! Board dimensions, score scale, move-ordering ratings and search limits.

use crate::types::{Depth, Value};

// Board layout
pub const SQ_NONE: usize = 0;
pub const SQ_BEGIN: usize = 8;
pub const SQ_END: usize = 32;
pub const SQUARE_NB: usize = 24;
pub const SQUARE_EXT_NB: usize = 40;

pub const FILE_NB: usize = 3;
pub const RANK_NB: usize = 8;

/// Neighbour slots per square: clockwise, anticlockwise, inward, outward
pub const MD_NB: usize = 4;
/// Lines through a square: horizontal, vertical, slash
pub const LD_NB: usize = 3;

pub const COLOR_NB: usize = 3;
pub const PIECE_TYPE_NB: usize = 4;

/// Upper bound on legal moves in any position
pub const MAX_MOVES: usize = 72;
/// Deepest search the engine runs; terminal values are biased by at most this
pub const MAX_PLY: Depth = 40;

// Zobrist
pub const ZOBRIST_SEED: u64 = 1_070_372;
/// High key bits reserved for the pending removal: three bits of count and
/// one own-piece flag
pub const KEY_MISC_BIT: u32 = 4;

// Values
pub const VALUE_ZERO: Value = 0;
pub const VALUE_DRAW: Value = 0;
pub const VALUE_MATE: Value = 80;
/// Above every depth-biased mate value
pub const VALUE_UNIQUE: Value = VALUE_MATE + MAX_PLY + 1;
pub const VALUE_INFINITE: Value = 125;

const _: () = assert!(VALUE_MATE + MAX_PLY < VALUE_UNIQUE && VALUE_UNIQUE < VALUE_INFINITE);

pub const VALUE_EACH_PIECE: Value = 5;
pub const VALUE_EACH_PIECE_INHAND: Value = VALUE_EACH_PIECE;
pub const VALUE_EACH_PIECE_ONBOARD: Value = VALUE_EACH_PIECE;
pub const VALUE_EACH_PIECE_NEEDREMOVE: Value = VALUE_EACH_PIECE;
pub const VALUE_EACH_PIECE_PLACING_NEEDREMOVE: Value = VALUE_EACH_PIECE;
pub const VALUE_EACH_PIECE_MOVING_NEEDREMOVE: Value = VALUE_EACH_PIECE;

pub const VALUE_MTDF_WINDOW: Value = VALUE_EACH_PIECE;
pub const VALUE_PVS_WINDOW: Value = VALUE_EACH_PIECE;

pub const VALUE_PLACING_WINDOW: Value = VALUE_EACH_PIECE_PLACING_NEEDREMOVE
    + (VALUE_EACH_PIECE_ONBOARD - VALUE_EACH_PIECE_INHAND)
    + 1;
pub const VALUE_MOVING_WINDOW: Value = VALUE_EACH_PIECE_MOVING_NEEDREMOVE + 1;

// Move ordering ratings
pub const RATING_BLOCK_ONE_MILL: i32 = 10;
pub const RATING_ONE_MILL: i32 = 11;
pub const RATING_STAR_SQUARE: i32 = 11;
pub const RATING_TT: i32 = 100;

// Search
pub const DEFAULT_MAX_DEPTH: Depth = 8;
/// Extra plies the quiescence search may follow removals past depth zero
pub const DEFAULT_QUIESCENCE_DEPTH: Depth = 16;
/// First depth tried by iterative deepening
pub const ID_START_DEPTH: Depth = 2;
/// Nodes between two clock reads
pub const TIME_CHECK_INTERVAL: u64 = 1024;

// Transposition table
pub const DEFAULT_TT_SHARDS: usize = 64;
pub const DEFAULT_TT_BUCKETS_PER_SHARD: usize = 1 << 14;

// Records
pub const RECORD_DRAW: &str = "draw";
pub const RECORD_THREEFOLD_DRAW: &str = "Threefold Repetition. Draw!";
