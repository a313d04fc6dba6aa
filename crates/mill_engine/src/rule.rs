//! # Rule Variants
//!
//! ## Overview
//!
//! A [`Rule`] is an immutable description of one member of the morris family: how many
//! pieces each side has, when pieces may fly, whether the board has diagonal lines, what
//! happens when a mill is closed during placing, and which draw rules apply.
//!
//! Rules are plain data. They are validated once with [`Rule::validate`] before a
//! [`Position`](crate::position::Position) adopts them; a rejected rule never reaches
//! the geometry tables, so the previous rule stays in effect.
//!
//! ## Configuration Surfaces
//!
//! - **Presets**: [`Rule::preset`] picks one of the named variants in [`presets`].
//! - **Serde**: every field has a default, so a partial JSON document overlays Nine
//!   Men's Morris.
//! - **Named options**: [`Rule::set_option`] takes the flat `name`/`value` pairs used by
//!   text front-ends (`PiecesCount`, `HasDiagonalLines`, `MayFly`, ...).

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{MillEngineError, MillEngineResult};

/// What closing a mill during the placing phase does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MillFormationAction {
    /// Remove one of the opponent's pieces from the board
    #[default]
    RemoveOpponentsPieceFromBoard,
    /// Take a piece from the opponent's hand, then the opponent moves
    RemoveOpponentsPieceFromHandThenOpponentsTurn,
    /// Take a piece from the opponent's hand, then move again
    RemoveOpponentsPieceFromHandThenYourTurn,
    /// Option slot kept for index compatibility; plays like
    /// `RemoveOpponentsPieceFromBoard`
    OpponentRemovesOwnPiece,
    /// Removed points stay banned until placing ends
    MarkAndDelayRemovingPieces,
    /// Mills closed while placing remove nothing. Once both hands are empty
    /// each side owes removals according to the mills left on the board.
    RemovalBasedOnMillCounts,
}

/// What happens when the 24 points fill up during placing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardFullAction {
    #[default]
    FirstPlayerLose,
    FirstAndSecondPlayerRemovePiece,
    SecondAndFirstPlayerRemovePiece,
    SideToMoveRemovePiece,
    AgreeToDraw,
}

/// What happens when the side to move cannot slide any piece
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalemateAction {
    #[default]
    EndWithStalemateLoss,
    ChangeSideToMove,
    RemoveOpponentsPieceAndMakeNextMove,
    RemoveOpponentsPieceAndChangeSideToMove,
    EndWithStalemateDraw,
}

impl StalemateAction {
    /// Variants that resolve a blocked side by a forced removal
    pub const fn removes(self) -> bool {
        matches!(
            self,
            StalemateAction::RemoveOpponentsPieceAndMakeNextMove
                | StalemateAction::RemoveOpponentsPieceAndChangeSideToMove
        )
    }
}

/// Parse an enum option from either its index or its snake_case name
fn parse_choice<T: Copy>(value: &str, choices: &[(&str, T)]) -> Option<T> {
    let value = value.trim();
    if let Ok(index) = value.parse::<usize>() {
        return choices.get(index).map(|(_, choice)| *choice);
    }
    choices
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|(_, choice)| *choice)
}

const MILL_FORMATION_CHOICES: [(&str, MillFormationAction); 6] = [
    (
        "remove_opponents_piece_from_board",
        MillFormationAction::RemoveOpponentsPieceFromBoard,
    ),
    (
        "remove_opponents_piece_from_hand_then_opponents_turn",
        MillFormationAction::RemoveOpponentsPieceFromHandThenOpponentsTurn,
    ),
    (
        "remove_opponents_piece_from_hand_then_your_turn",
        MillFormationAction::RemoveOpponentsPieceFromHandThenYourTurn,
    ),
    (
        "opponent_removes_own_piece",
        MillFormationAction::OpponentRemovesOwnPiece,
    ),
    (
        "mark_and_delay_removing_pieces",
        MillFormationAction::MarkAndDelayRemovingPieces,
    ),
    (
        "removal_based_on_mill_counts",
        MillFormationAction::RemovalBasedOnMillCounts,
    ),
];

const BOARD_FULL_CHOICES: [(&str, BoardFullAction); 5] = [
    ("first_player_lose", BoardFullAction::FirstPlayerLose),
    (
        "first_and_second_player_remove_piece",
        BoardFullAction::FirstAndSecondPlayerRemovePiece,
    ),
    (
        "second_and_first_player_remove_piece",
        BoardFullAction::SecondAndFirstPlayerRemovePiece,
    ),
    ("side_to_move_remove_piece", BoardFullAction::SideToMoveRemovePiece),
    ("agree_to_draw", BoardFullAction::AgreeToDraw),
];

const STALEMATE_CHOICES: [(&str, StalemateAction); 5] = [
    ("end_with_stalemate_loss", StalemateAction::EndWithStalemateLoss),
    ("change_side_to_move", StalemateAction::ChangeSideToMove),
    (
        "remove_opponents_piece_and_make_next_move",
        StalemateAction::RemoveOpponentsPieceAndMakeNextMove,
    ),
    (
        "remove_opponents_piece_and_change_side_to_move",
        StalemateAction::RemoveOpponentsPieceAndChangeSideToMove,
    ),
    ("end_with_stalemate_draw", StalemateAction::EndWithStalemateDraw),
];

/// One morris-family variant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub name: String,
    /// Pieces each side starts with in hand
    pub piece_count: u32,
    /// A side with this many pieces or fewer on board may fly
    pub fly_piece_count: u32,
    /// A side with fewer pieces than this (board + hand) loses
    pub pieces_at_least_count: u32,
    pub has_diagonal_lines: bool,
    pub mill_formation_action_in_placing_phase: MillFormationAction,
    pub may_move_in_placing_phase: bool,
    pub is_defender_move_first: bool,
    pub may_remove_multiple: bool,
    pub restrict_repeated_mills_formation: bool,
    pub may_remove_from_mills_always: bool,
    pub one_time_use_mill: bool,
    pub board_full_action: BoardFullAction,
    pub stalemate_action: StalemateAction,
    pub may_fly: bool,
    pub n_move_rule: u32,
    pub endgame_n_move_rule: u32,
    pub threefold_repetition_rule: bool,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            name: "Nine Men's Morris".to_string(),
            piece_count: 9,
            fly_piece_count: 3,
            pieces_at_least_count: 3,
            has_diagonal_lines: false,
            mill_formation_action_in_placing_phase: MillFormationAction::default(),
            may_move_in_placing_phase: false,
            is_defender_move_first: false,
            may_remove_multiple: false,
            restrict_repeated_mills_formation: false,
            may_remove_from_mills_always: false,
            one_time_use_mill: false,
            board_full_action: BoardFullAction::FirstPlayerLose,
            stalemate_action: StalemateAction::EndWithStalemateLoss,
            may_fly: true,
            n_move_rule: 100,
            endgame_n_move_rule: 100,
            threefold_repetition_rule: true,
        }
    }
}

fn named(name: &str, rule: Rule) -> Rule {
    Rule {
        name: name.to_string(),
        ..rule
    }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let nine = Rule::default();
    vec![
        nine.clone(),
        named(
            "Twelve Men's Morris",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                ..nine.clone()
            },
        ),
        named(
            "Dooz",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                mill_formation_action_in_placing_phase:
                    MillFormationAction::RemoveOpponentsPieceFromHandThenOpponentsTurn,
                ..nine.clone()
            },
        ),
        named(
            "Morabaraba",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                restrict_repeated_mills_formation: true,
                ..nine.clone()
            },
        ),
        named(
            "Russian Mill",
            Rule {
                one_time_use_mill: true,
                ..nine.clone()
            },
        ),
        named(
            "Lasker Morris",
            Rule {
                piece_count: 10,
                may_move_in_placing_phase: true,
                ..nine.clone()
            },
        ),
        named(
            "Cheng San Qi",
            Rule {
                may_fly: false,
                ..nine.clone()
            },
        ),
        named(
            "Da San Qi",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                mill_formation_action_in_placing_phase:
                    MillFormationAction::MarkAndDelayRemovingPieces,
                is_defender_move_first: true,
                may_remove_from_mills_always: true,
                may_fly: false,
                ..nine.clone()
            },
        ),
        named(
            "Zhi Qi",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                board_full_action: BoardFullAction::FirstAndSecondPlayerRemovePiece,
                stalemate_action: StalemateAction::RemoveOpponentsPieceAndMakeNextMove,
                ..nine.clone()
            },
        ),
        named(
            "El Filja",
            Rule {
                piece_count: 12,
                mill_formation_action_in_placing_phase:
                    MillFormationAction::RemovalBasedOnMillCounts,
                may_remove_from_mills_always: true,
                board_full_action: BoardFullAction::FirstAndSecondPlayerRemovePiece,
                may_fly: false,
                ..nine.clone()
            },
        ),
        named(
            "Experimental",
            Rule {
                piece_count: 12,
                has_diagonal_lines: true,
                is_defender_move_first: true,
                may_remove_from_mills_always: true,
                board_full_action: BoardFullAction::SecondAndFirstPlayerRemovePiece,
                may_fly: false,
                ..nine.clone()
            },
        ),
        named(
            "Six Men's Morris",
            Rule {
                piece_count: 6,
                ..nine
            },
        ),
    ]
});

/// All built-in variants, in record order (`r1` is the first)
pub fn presets() -> &'static [Rule] {
    &RULES
}

impl Rule {
    /// Look up a built-in variant by zero-based index
    ///
    /// # Errors
    ///
    /// Returns `RuleIndexOutOfRange` if `index` does not name a preset.
    pub fn preset(index: usize) -> MillEngineResult<Rule> {
        presets()
            .get(index)
            .cloned()
            .ok_or(MillEngineError::RuleIndexOutOfRange {
                index,
                count: presets().len(),
            })
    }

    /// Check structural constraints
    ///
    /// # Errors
    ///
    /// Returns `InvalidRule` naming the first offending field.
    pub fn validate(&self) -> MillEngineResult<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> MillEngineError {
            MillEngineError::InvalidRule {
                field,
                reason: reason.into(),
            }
        }

        if !(3..=12).contains(&self.piece_count) {
            return Err(invalid("piece_count", "must be between 3 and 12"));
        }
        if self.fly_piece_count < 3 || self.fly_piece_count > self.piece_count {
            return Err(invalid(
                "fly_piece_count",
                "must be at least 3 and at most piece_count",
            ));
        }
        if self.pieces_at_least_count < 2 || self.pieces_at_least_count > self.piece_count {
            return Err(invalid(
                "pieces_at_least_count",
                "must be at least 2 and at most piece_count",
            ));
        }
        if self.n_move_rule == 0 {
            return Err(invalid("n_move_rule", "must be positive"));
        }
        if self.endgame_n_move_rule == 0 || self.endgame_n_move_rule > self.n_move_rule {
            return Err(invalid(
                "endgame_n_move_rule",
                "must be positive and not exceed n_move_rule",
            ));
        }
        Ok(())
    }

    /// Apply one named option, validating the result before committing
    ///
    /// # Arguments
    ///
    /// * `name` - Option name, case-insensitive (`PiecesCount`, `MayFly`, ...)
    /// * `value` - Textual value; enums accept an index or a snake_case name
    ///
    /// # Errors
    ///
    /// `UnknownOption`, `InvalidOptionValue`, or `InvalidRule` if the changed rule
    /// fails validation. On error `self` is unchanged.
    pub fn set_option(&mut self, name: &str, value: &str) -> MillEngineResult<()> {
        let bad_value = || MillEngineError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let parse_u32 = || value.trim().parse::<u32>().map_err(|_| bad_value());
        let parse_bool = || match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Ok(true),
            "false" | "0" | "off" => Ok(false),
            _ => Err(bad_value()),
        };

        let mut next = self.clone();
        match name.trim().to_ascii_lowercase().as_str() {
            "piecescount" => next.piece_count = parse_u32()?,
            "flypiececount" => next.fly_piece_count = parse_u32()?,
            "piecesatleastcount" => next.pieces_at_least_count = parse_u32()?,
            "hasdiagonallines" => next.has_diagonal_lines = parse_bool()?,
            "millformationactioninplacingphase" => {
                next.mill_formation_action_in_placing_phase =
                    parse_choice(value, &MILL_FORMATION_CHOICES).ok_or_else(bad_value)?
            }
            "maymoveinplacingphase" => next.may_move_in_placing_phase = parse_bool()?,
            "isdefendermovefirst" => next.is_defender_move_first = parse_bool()?,
            "mayremovemultiple" => next.may_remove_multiple = parse_bool()?,
            "restrictrepeatedmillsformation" => {
                next.restrict_repeated_mills_formation = parse_bool()?
            }
            "mayremovefrommillsalways" => next.may_remove_from_mills_always = parse_bool()?,
            "onetimeusemill" => next.one_time_use_mill = parse_bool()?,
            "boardfullaction" => {
                next.board_full_action =
                    parse_choice(value, &BOARD_FULL_CHOICES).ok_or_else(bad_value)?
            }
            "stalemateaction" => {
                next.stalemate_action =
                    parse_choice(value, &STALEMATE_CHOICES).ok_or_else(bad_value)?
            }
            "mayfly" => next.may_fly = parse_bool()?,
            "nmoverule" => next.n_move_rule = parse_u32()?,
            "endgamenmoverule" => next.endgame_n_move_rule = parse_u32()?,
            "threefoldrepetitionrule" => next.threefold_repetition_rule = parse_bool()?,
            _ => {
                return Err(MillEngineError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }

        next.validate()?;
        *self = next;
        Ok(())
    }
}
