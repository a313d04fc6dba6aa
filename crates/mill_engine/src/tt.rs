//! Sharded transposition table
//!
//! The table is split into independently locked shards so search threads only
//! contend when they touch the same shard. Each shard holds two-slot buckets.
//! Entries carry the generation of the search that wrote them; entries from an
//! older generation never produce a cutoff and are the first to be replaced.
//!
//! Replacement: a new entry replaces a live one when its depth is at least the
//! stored depth, except that an exact bound is never displaced by a non-exact
//! one and always displaces a non-exact one.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::constants::{DEFAULT_TT_BUCKETS_PER_SHARD, DEFAULT_TT_SHARDS};
use crate::hash;
use crate::types::{Bound, Depth, Key, Move, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TtEntry {
    key: Key,
    value: Value,
    depth: Depth,
    bound: Bound,
    best_move: Move,
    generation: u8,
}

impl TtEntry {
    fn is_empty(&self) -> bool {
        self.bound == Bound::None
    }

    /// Whether `new` should overwrite this live entry
    fn yields_to(&self, depth: Depth, bound: Bound) -> bool {
        match (self.bound == Bound::Exact, bound == Bound::Exact) {
            (false, true) => true,
            (true, false) => false,
            _ => depth >= self.depth,
        }
    }
}

type Bucket = [TtEntry; 2];

/// What a probe learned about a position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtProbe {
    /// Value to return immediately, if the stored bound settles the node
    pub cutoff: Option<Value>,
    /// Window narrowed by a stored bound
    pub alpha: Value,
    pub beta: Value,
    /// Stored best move, even when the depth was insufficient
    pub best_move: Move,
}

pub struct TranspositionTable {
    shards: Vec<Mutex<Box<[Bucket]>>>,
    buckets_per_shard: usize,
    generation: AtomicU8,
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TT_SHARDS, DEFAULT_TT_BUCKETS_PER_SHARD)
    }
}

impl TranspositionTable {
    /// Both counts are clamped to at least one
    pub fn new(shards: usize, buckets_per_shard: usize) -> Self {
        let shards = shards.max(1);
        let buckets_per_shard = buckets_per_shard.max(1);
        Self {
            shards: (0..shards)
                .map(|_| Mutex::new(vec![Bucket::default(); buckets_per_shard].into_boxed_slice()))
                .collect(),
            buckets_per_shard,
            generation: AtomicU8::new(0),
        }
    }

    #[inline]
    fn locate(&self, key: Key) -> (usize, usize) {
        let mixed = hash::make_key(key);
        let shard = (mixed >> 40) as usize % self.shards.len();
        let bucket = (mixed as usize) % self.buckets_per_shard;
        (shard, bucket)
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Stamp a new search. Entries written before this call stop producing cutoffs.
    pub fn new_search(&self) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        trace!("[TT] generation {}", generation);
    }

    /// Drop every entry
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().fill(Bucket::default());
        }
        trace!("[TT] cleared {} shards", self.shards.len());
    }

    /// Look up `key` for a search of `depth` within `(alpha, beta)`
    pub fn probe(&self, key: Key, depth: Depth, alpha: Value, beta: Value) -> TtProbe {
        let mut result = TtProbe {
            cutoff: None,
            alpha,
            beta,
            best_move: Move::NONE,
        };

        let (shard, bucket) = self.locate(key);
        let entry = {
            let guard = self.shards[shard].lock();
            match guard[bucket].iter().find(|e| !e.is_empty() && e.key == key) {
                Some(e) => *e,
                None => return result,
            }
        };

        result.best_move = entry.best_move;
        if entry.generation != self.generation() || entry.depth < depth {
            return result;
        }

        match entry.bound {
            Bound::Exact => result.cutoff = Some(entry.value),
            Bound::Lower => result.alpha = result.alpha.max(entry.value),
            Bound::Upper => result.beta = result.beta.min(entry.value),
            Bound::None => {}
        }
        if result.cutoff.is_none() && result.alpha >= result.beta {
            result.cutoff = Some(entry.value);
        }
        result
    }

    /// Record a search result, subject to the replacement policy
    pub fn save(&self, key: Key, depth: Depth, bound: Bound, value: Value, best_move: Move) {
        if bound == Bound::None {
            return;
        }

        let generation = self.generation();
        let (shard, bucket) = self.locate(key);
        let mut guard = self.shards[shard].lock();
        let slots = &mut guard[bucket];

        let slot = match slots.iter().position(|e| !e.is_empty() && e.key == key) {
            Some(i) => i,
            None => {
                // Prefer an empty or stale slot, then the shallower one
                let score = |e: &TtEntry| {
                    if e.is_empty() || e.generation != generation {
                        Depth::MIN
                    } else {
                        e.depth + if e.bound == Bound::Exact { 1 } else { 0 }
                    }
                };
                if score(&slots[0]) <= score(&slots[1]) {
                    0
                } else {
                    1
                }
            }
        };

        let old = slots[slot];
        let replace = old.is_empty() || old.generation != generation || old.yields_to(depth, bound);
        if !replace {
            if old.key == key && best_move.is_ok() && !old.best_move.is_ok() {
                slots[slot].best_move = best_move;
            }
            return;
        }

        slots[slot] = TtEntry {
            key,
            value,
            depth,
            bound,
            best_move,
            generation,
        };
    }
}
