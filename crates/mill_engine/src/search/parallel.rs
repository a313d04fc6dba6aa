//! Root splitting across worker threads
//!
//! The ordered root moves are dealt round-robin to scoped workers. Each worker
//! owns a copy of the position and its own undo stack, shares the
//! transposition table and stop flag, and searches its moves with the full
//! window. Results come back over a channel; the best value wins and ties go
//! to the move that ordering ranked first, so the choice does not depend on
//! thread timing.

use std::thread;

use crossbeam_channel::unbounded;
use tracing::{debug, warn};

use crate::constants::{VALUE_INFINITE, VALUE_UNIQUE};
use crate::position::{Position, StateStack};
use crate::types::{Bound, Depth, Move, Value};

use super::alphabeta::{biased, Flavor, Searcher};
use super::context::SearchContext;
use super::ordering::MovePicker;
use super::{RootResult, SearchAlgorithm};

/// Alpha-beta or PVS with the root moves split across `threads` workers
#[derive(Clone, Copy, Debug)]
pub struct ParallelRoot {
    threads: usize,
    flavor: Flavor,
}

impl ParallelRoot {
    pub(crate) fn new(threads: usize, flavor: Flavor) -> Self {
        Self {
            threads: threads.max(1),
            flavor,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl SearchAlgorithm for ParallelRoot {
    fn name(&self) -> &'static str {
        match self.flavor {
            Flavor::Plain => "parallel alpha-beta",
            Flavor::Principal => "parallel pvs",
        }
    }

    fn search_root(
        &self,
        ctx: &mut SearchContext,
        pos: &mut Position,
        stack: &mut StateStack,
        depth: Depth,
        _guess: Option<Value>,
    ) -> RootResult {
        ctx.visit();
        let mut result = RootResult {
            value: 0,
            best_move: Move::NONE,
            unique: false,
        };

        if pos.is_game_over() || ctx.is_stopped() {
            result.value = biased(ctx.evaluate(pos), depth);
            return result;
        }

        let key = pos.key();
        let tt_move = ctx.tt().probe(key, depth, -VALUE_INFINITE, VALUE_INFINITE).best_move;
        let picker = MovePicker::new(pos, tt_move);
        if picker.is_empty() {
            result.value = biased(ctx.evaluate(pos), depth);
            return result;
        }
        if picker.len() == 1 {
            result.value = VALUE_UNIQUE;
            result.best_move = picker.best();
            result.unique = true;
            return result;
        }

        let moves: Vec<Move> = picker.moves().iter().map(|em| em.mv).collect();
        let workers = self.threads.min(moves.len());
        let (tx, rx) = unbounded::<(usize, Move, Value)>();

        let worker_nodes: u64 = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let tx = tx.clone();
                    let moves = &moves;
                    let mut wctx = ctx.fork();
                    let mut wpos = pos.clone();
                    let mut wstack = stack.clone();
                    let flavor = self.flavor;

                    scope.spawn(move || {
                        for (index, &m) in moves.iter().enumerate().skip(w).step_by(workers) {
                            if wctx.is_stopped() {
                                break;
                            }
                            let before = wpos.side_to_move();
                            if wpos.do_move(m, &mut wstack).is_err() {
                                continue;
                            }
                            let flips = wpos.side_to_move() != before;
                            let value = {
                                let mut searcher =
                                    Searcher::new(&mut wctx, &mut wpos, &mut wstack, flavor);
                                if flips {
                                    -searcher.search(depth - 1, depth, -VALUE_INFINITE, VALUE_INFINITE)
                                } else {
                                    searcher.search(depth - 1, depth, -VALUE_INFINITE, VALUE_INFINITE)
                                }
                            };
                            wpos.undo_move(&mut wstack);

                            if wctx.is_stopped() || tx.send((index, m, value)).is_err() {
                                break;
                            }
                        }
                        wctx.nodes()
                    })
                })
                .collect();
            drop(tx);

            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(nodes) => nodes,
                    Err(_) => {
                        warn!("[SEARCH] root worker panicked");
                        0
                    }
                })
                .sum()
        });
        ctx.add_nodes(worker_nodes);

        let mut results: Vec<(usize, Move, Value)> = rx.iter().collect();
        results.sort_by_key(|&(index, _, _)| index);

        let mut best_value = -VALUE_INFINITE;
        for &(_, m, value) in &results {
            if value > best_value {
                best_value = value;
                result.best_move = m;
            }
        }

        if results.is_empty() {
            result.value = biased(ctx.evaluate(pos), depth);
            result.best_move = picker.best();
            return result;
        }
        result.value = best_value;

        if results.len() == moves.len() && !ctx.is_stopped() {
            ctx.tt().save(key, depth, Bound::Exact, best_value, result.best_move);
        }
        debug!(
            "[SEARCH] {} workers searched {}/{} root moves, best {} value {}",
            workers,
            results.len(),
            moves.len(),
            result.best_move,
            best_value
        );
        result
    }
}
