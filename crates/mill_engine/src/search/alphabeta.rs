//! Core recursive negamax with transposition table and move ordering

use crate::constants::{VALUE_DRAW, VALUE_INFINITE, VALUE_UNIQUE};
use crate::position::{Position, StateStack};
use crate::types::{Bound, Depth, Move, Phase, Value};

use super::context::SearchContext;
use super::ordering::MovePicker;
use super::RootResult;

/// How children after the first are searched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flavor {
    /// Every child gets the full window
    Plain,
    /// Later children get a narrow window and are re-searched on success
    Principal,
}

/// One search thread's working set
pub(crate) struct Searcher<'a> {
    pub(super) ctx: &'a mut SearchContext,
    pub(super) pos: &'a mut Position,
    pub(super) stack: &'a mut StateStack,
    pub(super) flavor: Flavor,
    pub(super) root_move: Move,
    pub(super) unique: bool,
}

/// Prefer quick wins and slow losses: terminal values move away from zero by
/// the depth still left
#[inline]
pub(super) fn biased(value: Value, depth: Depth) -> Value {
    if value > 0 {
        value + depth
    } else {
        value - depth
    }
}

/// The N-move or endgame N-move rule already applies
pub(super) fn drawn_by_move_rules(pos: &Position) -> bool {
    let rule = pos.rule();
    let rule50 = pos.rule50_count();
    if rule50 > rule.n_move_rule {
        return true;
    }
    rule.endgame_n_move_rule < rule.n_move_rule
        && pos.is_three_endgame()
        && rule50 >= rule.endgame_n_move_rule
}

impl<'a> Searcher<'a> {
    pub(crate) fn new(
        ctx: &'a mut SearchContext,
        pos: &'a mut Position,
        stack: &'a mut StateStack,
        flavor: Flavor,
    ) -> Self {
        Self {
            ctx,
            pos,
            stack,
            flavor,
            root_move: Move::NONE,
            unique: false,
        }
    }

    /// Full-window search of the root
    pub(crate) fn root(mut self, depth: Depth) -> RootResult {
        let value = self.search(depth, depth, -VALUE_INFINITE, VALUE_INFINITE);
        self.result(value)
    }

    pub(super) fn result(&self, value: Value) -> RootResult {
        RootResult {
            value,
            best_move: self.root_move,
            unique: self.unique,
        }
    }

    /// Search one child and return its value from the parent's point of view.
    /// `index` is the child's position in the ordered move list.
    pub(super) fn child(
        &mut self,
        depth: Depth,
        origin: Depth,
        alpha: Value,
        beta: Value,
        flips: bool,
        index: usize,
    ) -> Value {
        if self.flavor == Flavor::Principal && index > 0 {
            return self.scout_child(depth, origin, alpha, beta, flips);
        }
        if flips {
            -self.search(depth, origin, -beta, -alpha)
        } else {
            self.search(depth, origin, alpha, beta)
        }
    }

    /// Fail-soft alpha-beta. The root is the node where `depth == origin`.
    pub(crate) fn search(
        &mut self,
        depth: Depth,
        origin: Depth,
        mut alpha: Value,
        mut beta: Value,
    ) -> Value {
        self.ctx.visit();
        let at_root = depth == origin;

        if self.pos.is_game_over() || self.ctx.is_stopped() {
            return biased(self.ctx.evaluate(self.pos), depth);
        }
        if depth <= 0 {
            let qdepth = self.ctx.quiescence_depth();
            return self.quiescence(qdepth, alpha, beta);
        }

        if drawn_by_move_rules(self.pos) {
            alpha = VALUE_DRAW;
            if alpha >= beta {
                return alpha;
            }
        }
        if !at_root
            && self.pos.rule().threefold_repetition_rule
            && self.pos.phase() == Phase::Moving
            && (self.pos.has_repeated(self.stack) || self.ctx.seen_in_game(self.pos.key()))
        {
            return VALUE_DRAW;
        }

        let key = self.pos.key();
        let probe = self.ctx.tt().probe(key, depth, alpha, beta);
        if let Some(value) = probe.cutoff {
            if !at_root {
                return value;
            }
            if probe.best_move.is_ok() {
                self.root_move = probe.best_move;
                return value;
            }
        }
        alpha = probe.alpha;
        beta = probe.beta;
        let alpha_orig = alpha;

        let picker = MovePicker::new(self.pos, probe.best_move);
        if picker.is_empty() {
            return biased(self.ctx.evaluate(self.pos), depth);
        }
        if at_root && picker.len() == 1 {
            self.root_move = picker.best();
            self.unique = true;
            return VALUE_UNIQUE;
        }

        let mut best_value = -VALUE_INFINITE;
        let mut best_move = Move::NONE;

        for (index, em) in picker.moves().iter().enumerate() {
            let before = self.pos.side_to_move();
            if self.pos.do_move(em.mv, self.stack).is_err() {
                debug_assert!(false, "generated move {} rejected", em.mv);
                continue;
            }
            let flips = self.pos.side_to_move() != before;
            let value = self.child(depth - 1, origin, alpha, beta, flips, index);
            self.pos.undo_move(self.stack);

            if self.ctx.is_stopped() {
                break;
            }

            if value > best_value {
                best_value = value;
                best_move = em.mv;
                if value > alpha {
                    if at_root {
                        self.root_move = em.mv;
                    }
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        if at_root && !self.root_move.is_ok() {
            self.root_move = if best_move.is_ok() { best_move } else { picker.best() };
        }

        if self.ctx.is_stopped() {
            return if best_value == -VALUE_INFINITE {
                biased(self.ctx.evaluate(self.pos), depth)
            } else {
                best_value
            };
        }

        let bound = if best_value <= alpha_orig {
            Bound::Upper
        } else if best_value >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.ctx.tt().save(key, depth, bound, best_value, best_move);

        best_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use crate::constants::VALUE_MATE;
    use crate::evaluation::HandcraftedEvaluator;
    use crate::rule::Rule;
    use crate::tt::TranspositionTable;

    fn context() -> SearchContext {
        SearchContext::new(
            Arc::new(TranspositionTable::new(4, 256)),
            Arc::new(HandcraftedEvaluator::default()),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[test]
    fn test_biased_moves_away_from_zero() {
        assert_eq!(biased(10, 3), 13);
        assert_eq!(biased(-10, 3), -13);
        assert_eq!(biased(0, 2), -2);
    }

    #[test]
    fn test_single_legal_move_is_unique() {
        let mut pos = Position::default();
        // Black holds the (3,2)-(3,4) mill plus a loose piece on (3,7); White's
        // mill on (1,2) may only take the loose one
        for r in [
            "(1,8)", "(3,2)", "(1,1)", "(3,3)", "(2,1)", "(3,4)", "-(2,1)", "(2,2)", "(3,7)",
            "(1,2)",
        ] {
            assert!(pos.command(r), "{} rejected", r);
        }
        assert_eq!(MovePicker::new(&pos, Move::NONE).len(), 1);

        let mut ctx = context();
        let mut stack = StateStack::new();
        let result = Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Plain).root(4);
        assert!(result.unique);
        assert_eq!(result.value, VALUE_UNIQUE);
        assert_eq!(result.best_move, Move::remove(30));
    }

    #[test]
    fn test_finds_winning_removal() {
        let mut pos = Position::new(Rule {
            piece_count: 3,
            ..Rule::default()
        })
        .unwrap();
        for r in ["(1,8)", "(3,1)", "(1,1)", "(3,3)"] {
            assert!(pos.command(r));
        }
        let mut ctx = context();
        let mut stack = StateStack::new();
        let result = Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Plain).root(3);
        assert_eq!(result.best_move, Move::place(9));
        assert!(result.value >= VALUE_MATE, "Mill then removal leaves Black with two");
        assert!(stack.is_empty());
    }

    #[test]
    fn test_game_history_repetition_is_a_draw_below_the_root() {
        let mut pos = Position::new(Rule {
            piece_count: 4,
            ..Rule::default()
        })
        .unwrap();
        for r in ["(1,1)", "(1,3)", "(2,2)", "(2,4)", "(3,5)", "(3,7)", "(1,6)", "(2,8)"] {
            assert!(pos.command(r));
        }
        assert_eq!(pos.phase(), Phase::Moving);

        let mut ctx = context().with_game_history(&[pos.key()]);
        let mut stack = StateStack::new();
        let value = Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Plain).search(
            2,
            3,
            -VALUE_INFINITE,
            VALUE_INFINITE,
        );
        assert_eq!(value, VALUE_DRAW);
        assert_eq!(ctx.nodes(), 1);

        let mut ctx = context();
        Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Plain).search(
            2,
            3,
            -VALUE_INFINITE,
            VALUE_INFINITE,
        );
        assert!(ctx.nodes() > 1, "Without the history the node is expanded");
    }

    #[test]
    fn test_stopped_search_returns_quickly() {
        let mut pos = Position::default();
        let mut ctx = context();
        ctx.stop();
        let mut stack = StateStack::new();
        let result = Searcher::new(&mut ctx, &mut pos, &mut stack, Flavor::Plain).root(6);
        assert!(ctx.nodes() <= 1);
        assert_eq!(result.best_move, Move::NONE);
    }
}
