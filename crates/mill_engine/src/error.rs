//! Error types for the mill engine
//!
//! Illegal moves, rule configuration problems and record parsing failures.
//! Every mutating `Position` operation validates before it writes, so an
//! `Err` always means the position is unchanged.

use thiserror::Error;

use crate::types::Square;

/// Why a move was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalMove {
    #[error("the game is over")]
    GameOver,

    #[error("operation not allowed in the current phase")]
    WrongPhase,

    #[error("operation not allowed for the current action")]
    WrongAction,

    #[error("square {0} is not on the board")]
    InvalidSquare(Square),

    #[error("square {0} is occupied")]
    Occupied(Square),

    #[error("square {0} is marked and cannot be used until placing ends")]
    MarkedSquare(Square),

    #[error("square {0} does not hold a piece of the side to move")]
    NotOwnPiece(Square),

    #[error("square {0} does not hold an opponent piece")]
    NotOpponentPiece(Square),

    #[error("no piece left in hand")]
    NothingInHand,

    #[error("no piece selected")]
    NothingSelected,

    #[error("no removal pending")]
    NothingToRemove,

    #[error("square {to} is not adjacent to {from}")]
    NotAdjacent { from: Square, to: Square },

    #[error("piece on {0} is protected by a mill")]
    ProtectedByMill(Square),

    #[error("piece on {0} is not adjacent to the side to move")]
    NotAdjacentToMover(Square),

    #[error("moving back to {0} would repeat the last mill")]
    RepeatedMill(Square),
}

/// Errors that can occur in the mill engine
#[derive(Error, Debug)]
pub enum MillEngineError {
    /// Move rejected by the position
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),

    /// Rule failed validation
    #[error("Invalid rule field `{field}`: {reason}")]
    InvalidRule { field: &'static str, reason: String },

    /// Preset index out of range
    #[error("Rule index {index} out of range (0..{count})")]
    RuleIndexOutOfRange { index: usize, count: usize },

    /// Unknown named option
    #[error("Unknown option: {name}")]
    UnknownOption { name: String },

    /// Option value could not be parsed
    #[error("Invalid value `{value}` for option {name}")]
    InvalidOptionValue { name: String, value: String },

    /// Text record could not be parsed
    #[error("Cannot parse record: {text}")]
    ParseRecord { text: String },

    /// Search could not produce a move
    #[error("Search error: {message}")]
    SearchError { message: String },
}

/// Result type alias for mill engine operations
pub type MillEngineResult<T> = Result<T, MillEngineError>;
