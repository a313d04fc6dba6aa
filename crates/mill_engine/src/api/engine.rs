//! Engine front end
//!
//! [`Engine`] turns a position and its key history into a [`SearchOutcome`]:
//!
//! 1. Root draw rules are checked first (N-move, endgame N-move, threefold
//!    repetition) for positions where pieces can slide.
//! 2. Otherwise the configured algorithm runs under iterative deepening on a
//!    private copy of the position, optionally with a reshuffled placement
//!    order, sharing one transposition table across searches.
//! 3. The value is reported from White's point of view.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use web_time::{Duration, Instant};

use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_QUIESCENCE_DEPTH, DEFAULT_TT_BUCKETS_PER_SHARD, DEFAULT_TT_SHARDS,
    MAX_PLY, RECORD_DRAW, VALUE_DRAW,
};
use crate::error::{MillEngineError, MillEngineResult};
use crate::evaluation::{Evaluator, HandcraftedEvaluator};
use crate::position::{Position, StateStack};
use crate::search::{iterative_deepening, Algorithm, MovePicker, SearchAlgorithm, SearchContext};
use crate::tt::TranspositionTable;
use crate::types::{Color, Depth, GameOverReason, Key, Move, Phase, Value};

/// Engine knobs, loadable from JSON with every field optional
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub algorithm: Algorithm,
    pub max_depth: Depth,
    /// Seconds per move, 0 for depth only
    pub move_time: u64,
    /// Iterative deepening; always on when a move time is set
    pub ids: bool,
    pub threads: usize,
    pub tt_shards: usize,
    pub tt_buckets: usize,
    /// Randomize the placement order among equally rated squares
    pub shuffle: bool,
    pub seed: u64,
    pub quiescence_depth: Depth,
    pub consider_mobility: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            move_time: 0,
            ids: true,
            threads: 1,
            tt_shards: DEFAULT_TT_SHARDS,
            tt_buckets: DEFAULT_TT_BUCKETS_PER_SHARD,
            shuffle: false,
            seed: 0,
            quiescence_depth: DEFAULT_QUIESCENCE_DEPTH,
            consider_mobility: true,
        }
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> MillEngineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MillEngineError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}

fn parse_flag(name: &str, value: &str) -> MillEngineResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(MillEngineError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

impl EngineOptions {
    /// Set one option by name. Names are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// `UnknownOption` for names this struct does not own, so callers can
    /// fall through to [`Rule::set_option`](crate::rule::Rule::set_option);
    /// `InvalidOptionValue` when the value does not parse or is out of range.
    pub fn set_option(&mut self, name: &str, value: &str) -> MillEngineResult<()> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "algorithm" => self.algorithm = value.parse()?,
            "depth" | "maxdepth" | "skilllevel" => {
                let depth: Depth = parse_value(name, value)?;
                if !(1..=MAX_PLY).contains(&depth) {
                    return Err(MillEngineError::InvalidOptionValue {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
                self.max_depth = depth;
            }
            "movetime" => self.move_time = parse_value(name, value)?,
            "ids" | "idsenabled" => self.ids = parse_flag(name, value)?,
            "threads" => self.threads = parse_value::<usize>(name, value)?.max(1),
            "ttshards" => self.tt_shards = parse_value::<usize>(name, value)?.max(1),
            "ttbuckets" => self.tt_buckets = parse_value::<usize>(name, value)?.max(1),
            "shuffle" | "shufflingenabled" => self.shuffle = parse_flag(name, value)?,
            "seed" => self.seed = parse_value(name, value)?,
            "quiescencedepth" => self.quiescence_depth = parse_value::<Depth>(name, value)?.max(0),
            "considermobility" => self.consider_mobility = parse_flag(name, value)?,
            _ => {
                return Err(MillEngineError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// How a search result was reached
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Normal search
    Searched,
    /// Only one legal move; nothing was searched
    Unique,
    /// A draw rule already applies at the root
    Draw(GameOverReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    /// From White's point of view
    pub value: Value,
    pub best_move: Move,
    /// Record of the best move, or `"draw"`
    pub record: String,
    pub kind: OutcomeKind,
    pub depth_reached: Depth,
    pub nodes: u64,
    pub evaluator: &'static str,
}

impl SearchOutcome {
    fn draw(reason: GameOverReason) -> Self {
        Self {
            value: VALUE_DRAW,
            best_move: Move::NONE,
            record: RECORD_DRAW.to_string(),
            kind: OutcomeKind::Draw(reason),
            depth_reached: 0,
            nodes: 0,
            evaluator: "rule",
        }
    }

    /// `info score <value> bestmove <record>`
    pub fn info_line(&self) -> String {
        format!("info score {} bestmove {}", self.value, self.record)
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.info_line(), self.evaluator)
    }
}

/// Lets another thread stop a running search
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct Engine {
    options: EngineOptions,
    tt: Arc<TranspositionTable>,
    evaluator: Arc<dyn Evaluator>,
    stop: Arc<AtomicBool>,
    algorithm: Box<dyn SearchAlgorithm>,
    rng: StdRng,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let evaluator = Arc::new(HandcraftedEvaluator {
            consider_mobility: options.consider_mobility,
        });
        Self::with_evaluator(options, evaluator)
    }

    pub fn with_evaluator(options: EngineOptions, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            tt: Arc::new(TranspositionTable::new(options.tt_shards, options.tt_buckets)),
            evaluator,
            stop: Arc::new(AtomicBool::new(false)),
            algorithm: options.algorithm.build(options.threads),
            rng: StdRng::seed_from_u64(options.seed),
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Replace the options, rebuilding whatever they affect
    pub fn set_options(&mut self, options: EngineOptions) {
        if options.tt_shards != self.options.tt_shards || options.tt_buckets != self.options.tt_buckets {
            self.tt = Arc::new(TranspositionTable::new(options.tt_shards, options.tt_buckets));
        }
        if options.consider_mobility != self.options.consider_mobility {
            self.evaluator = Arc::new(HandcraftedEvaluator {
                consider_mobility: options.consider_mobility,
            });
        }
        if options.seed != self.options.seed {
            self.rng = StdRng::seed_from_u64(options.seed);
        }
        self.algorithm = options.algorithm.build(options.threads);
        self.options = options;
    }

    /// Set one option by name, see [`EngineOptions::set_option`]
    ///
    /// # Errors
    ///
    /// As [`EngineOptions::set_option`]; the engine is unchanged on error.
    pub fn set_option(&mut self, name: &str, value: &str) -> MillEngineResult<()> {
        let mut options = self.options.clone();
        options.set_option(name, value)?;
        self.set_options(options);
        Ok(())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Forget every stored result
    pub fn clear(&self) {
        self.tt.clear();
    }

    /// Draw rule that already applies at the root, if any
    pub fn root_draw(pos: &Position, history: &[Key]) -> Option<GameOverReason> {
        let rule = pos.rule();
        let may_slide = pos.phase() == Phase::Moving
            || (pos.phase() == Phase::Placing && rule.may_move_in_placing_phase);
        if !may_slide {
            return None;
        }

        let rule50 = pos.rule50_count();
        if rule50 >= rule.n_move_rule {
            return Some(GameOverReason::DrawFiftyMove);
        }
        if rule.endgame_n_move_rule < rule.n_move_rule
            && pos.is_three_endgame()
            && rule50 >= rule.endgame_n_move_rule
        {
            return Some(GameOverReason::DrawEndgameFiftyMove);
        }
        let key = pos.key();
        if rule.threefold_repetition_rule && history.iter().filter(|&&k| k == key).count() >= 3 {
            return Some(GameOverReason::DrawThreefoldRepetition);
        }
        None
    }

    /// Pick a move for the side to move
    ///
    /// # Errors
    ///
    /// `SearchError` if the game is already over or no legal move exists.
    pub fn search(&mut self, pos: &Position, history: &[Key]) -> MillEngineResult<SearchOutcome> {
        if pos.is_game_over() {
            return Err(MillEngineError::SearchError {
                message: "the game is already over".to_string(),
            });
        }

        if let Some(reason) = Self::root_draw(pos, history) {
            info!("[ENGINE] root draw: {}", reason);
            return Ok(SearchOutcome::draw(reason));
        }

        let started = Instant::now();
        self.stop.store(false, Ordering::Relaxed);
        self.tt.new_search();

        let mut root = pos.clone();
        if self.options.shuffle {
            root.set_variant(Arc::new(root.variant().reshuffled(&mut self.rng)));
        }

        let time_limit = (self.options.move_time > 0).then(|| Duration::from_secs(self.options.move_time));
        let mut ctx = SearchContext::new(
            Arc::clone(&self.tt),
            Arc::clone(&self.evaluator),
            Arc::clone(&self.stop),
        )
        .with_time_limit(time_limit)
        .with_quiescence_depth(self.options.quiescence_depth)
        .with_game_history(history);

        let mut stack = StateStack::new();
        let report = iterative_deepening(
            self.algorithm.as_ref(),
            &mut ctx,
            &mut root,
            &mut stack,
            self.options.max_depth,
            self.options.ids || time_limit.is_some(),
        );

        let mut best_move = report.best_move;
        if !best_move.is_ok() {
            warn!("[ENGINE] search stopped before its first iteration finished");
            best_move = MovePicker::new(pos, Move::NONE).best();
        }
        if !best_move.is_ok() {
            return Err(MillEngineError::SearchError {
                message: "no legal move".to_string(),
            });
        }

        let value = match pos.side_to_move() {
            Color::Black => -report.value,
            _ => report.value,
        };
        let outcome = SearchOutcome {
            value,
            best_move,
            record: best_move.to_string(),
            kind: if report.unique {
                OutcomeKind::Unique
            } else {
                OutcomeKind::Searched
            },
            depth_reached: report.depth_reached,
            nodes: ctx.nodes(),
            evaluator: self.evaluator.name(),
        };

        info!(
            "[ENGINE] {} {} depth {} nodes {} in {:?}",
            self.algorithm.name(),
            outcome.info_line(),
            outcome.depth_reached,
            outcome.nodes,
            started.elapsed()
        );
        Ok(outcome)
    }
}
