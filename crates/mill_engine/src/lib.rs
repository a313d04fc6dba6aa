//! # Mill Engine
//!
//! Rules, move generation and alpha-beta search for the Nine Men's Morris
//! family: Nine and Twelve Men's Morris, Morabaraba, Dooz, Lasker, Russian
//! Mill and the Chinese variants, all driven by one [`Rule`] table.
//!
//! ## Overview
//!
//! - [`position::Position`] holds the board and the placing/moving/removing
//!   state machine, with snapshot undo and an incremental Zobrist key
//! - [`move_gen`] produces exactly the moves [`Position::do_move`] accepts
//! - [`search`] implements alpha-beta, PVS and MTD(f) with a sharded
//!   transposition table, quiescence through removals, iterative deepening
//!   and a threaded root split
//! - [`api`] wraps these for callers that speak the text record protocol
//!
//! ## Example
//!
//! ```
//! use mill_engine::api::{Engine, EngineOptions, Game};
//!
//! let mut game = Game::default();
//! assert!(game.command("(2,1)"));
//!
//! let mut engine = Engine::new(EngineOptions { max_depth: 3, ..EngineOptions::default() });
//! let outcome = engine.search(game.position(), game.key_history()).unwrap();
//! assert!(game.command(&outcome.record));
//! ```
//!
//! [`Rule`]: rule::Rule
//! [`Position::do_move`]: position::Position::do_move

pub mod api;
pub mod bitboard;
pub mod constants;
pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod hash;
pub mod move_gen;
pub mod position;
pub mod rule;
pub mod search;
pub mod tt;
pub mod types;

pub use api::{Engine, EngineOptions, Game, OutcomeKind, SearchOutcome};
pub use error::{IllegalMove, MillEngineError, MillEngineResult};
pub use position::Position;
pub use rule::Rule;
pub use types::{Action, Color, GameOverReason, Move, MoveKind, Phase, Square};
