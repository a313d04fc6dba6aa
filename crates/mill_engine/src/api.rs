//! Public API for the mill engine
//!
//! High-level entry points for callers that speak the record protocol rather
//! than driving [`Position`](crate::position::Position) directly.
//!
//! ## Module Organization
//!
//! - `game` - A game in progress: position, records, undo and repetition history
//! - `engine` - Engine options, root draw detection and search results

mod engine;
mod game;

pub use engine::{Engine, EngineOptions, OutcomeKind, SearchOutcome, StopHandle};
pub use game::Game;
