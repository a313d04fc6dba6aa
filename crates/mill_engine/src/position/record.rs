//! Text records and the command protocol
//!
//! Moves print as `(f,r)` for a placement, `(f1,r1)->(f2,r2)` for a slide and
//! `-(f,r)` for a removal, where `f` is the ring (1..=3) and `r` the point on
//! it (1..=8). Control records cover resignation, time-outs, repetition draws
//! and rule selection.

use std::fmt;
use std::str::FromStr;

use super::Position;
use crate::constants::{FILE_NB, RANK_NB, RECORD_DRAW, RECORD_THREEFOLD_DRAW};
use crate::error::{MillEngineError, MillEngineResult};
use crate::rule::Rule;
use crate::types::{file_of, make_square, rank_of, Color, GameOverReason, Move, MoveKind, Square};

fn write_square(f: &mut fmt::Formatter<'_>, s: Square) -> fmt::Result {
    write!(f, "({},{})", file_of(s), rank_of(s))
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            MoveKind::Place => write_square(f, self.to()),
            MoveKind::Slide => {
                write_square(f, self.from())?;
                f.write_str("->")?;
                write_square(f, self.to())
            }
            MoveKind::Remove => {
                f.write_str("-")?;
                write_square(f, self.to())
            }
        }
    }
}

fn parse_square(text: &str) -> Option<Square> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (file, rank) = inner.split_once(',')?;
    let file: usize = file.trim().parse().ok()?;
    let rank: usize = rank.trim().parse().ok()?;
    if !(1..=FILE_NB).contains(&file) || !(1..=RANK_NB).contains(&rank) {
        return None;
    }
    Some(make_square(file, rank))
}

impl FromStr for Move {
    type Err = MillEngineError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let parsed = if let Some(rest) = text.strip_prefix('-') {
            parse_square(rest).map(Move::remove)
        } else if let Some((from, to)) = text.split_once("->") {
            parse_square(from)
                .zip(parse_square(to))
                .filter(|(from, to)| from != to)
                .map(|(from, to)| Move::slide(from, to))
        } else {
            parse_square(text).map(Move::place)
        };

        parsed.ok_or_else(|| MillEngineError::ParseRecord {
            text: text.to_string(),
        })
    }
}

/// `"Player2 give up!"`
pub fn resign_record(loser: Color) -> String {
    format!("Player{} give up!", loser.player_number())
}

/// `"Time over. Player1 win!"`
pub fn time_over_record(winner: Color) -> String {
    format!("Time over. Player{} win!", winner.player_number())
}

fn parse_player(text: &str, prefix: &str, suffix: &str) -> Option<Color> {
    let digits = text.strip_prefix(prefix)?.strip_suffix(suffix)?;
    Color::from_player_number(digits.parse().ok()?)
}

/// Parse `r<N> s<steps> t<seconds>` into its three numbers
fn parse_rule_record(text: &str) -> Option<(usize, u32, u32)> {
    let mut fields = text.split_whitespace();
    let rule = fields.next()?.strip_prefix('r')?.parse().ok()?;
    let steps = fields.next()?.strip_prefix('s')?.parse().ok()?;
    let time = fields.next()?.strip_prefix('t')?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((rule, steps, time))
}

/// Strip an engine line `info score <v> bestmove <record>` down to the record
fn strip_engine_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("info score ")?;
    let (value, record) = rest.split_once(" bestmove ")?;
    value.trim().parse::<i32>().ok()?;
    Some(record.trim())
}

impl Position {
    /// Apply one protocol record. Returns whether it was accepted.
    ///
    /// Accepted forms:
    ///
    /// - empty text resets the position
    /// - a move record, optionally wrapped in an engine `info score` line
    /// - `PlayerN give up!` and `Time over. PlayerN win!`
    /// - `r<N> s<steps> t<time>` selects preset `N` (1-based) and resets
    /// - `draw` and `Threefold Repetition. Draw!` when repetition draws are enabled
    pub fn command(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.reset();
            return true;
        }

        let body = strip_engine_line(text).unwrap_or(text);

        if let Ok(m) = body.parse::<Move>() {
            return self.apply(m).is_ok();
        }

        if let Some(loser) = parse_player(body, "Player", " give up!") {
            return self.resign(loser).is_ok();
        }

        if let Some(winner) = parse_player(body, "Time over. Player", " win!") {
            return self.time_over(!winner).is_ok();
        }

        if let Some((index, _steps, _time)) = parse_rule_record(body) {
            return index
                .checked_sub(1)
                .ok_or(MillEngineError::RuleIndexOutOfRange {
                    index,
                    count: crate::rule::presets().len(),
                })
                .and_then(Rule::preset)
                .and_then(|rule| self.set_rule(rule))
                .is_ok();
        }

        if self.rule().threefold_repetition_rule {
            if body == RECORD_THREEFOLD_DRAW {
                return true;
            }
            if body == RECORD_DRAW {
                self.declare_threefold_draw();
                return true;
            }
        }

        false
    }

    /// Record of the last accepted move or game-ending event
    pub fn record(&self) -> String {
        if self.is_game_over() {
            match self.game_over_reason() {
                GameOverReason::LoseResign => return resign_record(!self.winner()),
                GameOverReason::LoseTimeOver => return time_over_record(self.winner()),
                GameOverReason::DrawThreefoldRepetition => {
                    return RECORD_THREEFOLD_DRAW.to_string()
                }
                _ => {}
            }
        }
        if self.current_move().is_ok() {
            self.current_move().to_string()
        } else {
            String::new()
        }
    }

    /// Human-readable result line, `None` while the game is running
    pub fn result_text(&self) -> Option<String> {
        if !self.is_game_over() {
            return None;
        }
        let reason = self.game_over_reason();
        Some(match self.winner() {
            Color::White | Color::Black => {
                format!("Player{} win! ({})", self.winner().player_number(), reason)
            }
            _ => format!("Draw! ({})", reason),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Phase};

    #[test]
    fn test_move_display() {
        assert_eq!(Move::place(8).to_string(), "(1,1)");
        assert_eq!(Move::slide(9, 17).to_string(), "(1,2)->(2,2)");
        assert_eq!(Move::remove(31).to_string(), "-(3,8)");
    }

    #[test]
    fn test_move_parse() {
        assert_eq!("(1,1)".parse::<Move>().unwrap(), Move::place(8));
        assert_eq!("(1,2)->(2,2)".parse::<Move>().unwrap(), Move::slide(9, 17));
        assert_eq!(" -(3,8) ".parse::<Move>().unwrap(), Move::remove(31));
        assert!("(4,1)".parse::<Move>().is_err(), "Ring 4 does not exist");
        assert!("(1,9)".parse::<Move>().is_err());
        assert!("(1,1)->(1,1)".parse::<Move>().is_err());
        assert!("hello".parse::<Move>().is_err());
    }

    #[test]
    fn test_command_places_and_rejects_garbage() {
        let mut p = Position::default();
        assert!(p.command("(1,1)"));
        assert_eq!(p.phase(), Phase::Placing);
        assert_eq!(p.record(), "(1,1)");
        assert!(!p.command("(1,1)"), "Occupied point");
        assert!(!p.command("nonsense"));
    }

    #[test]
    fn test_command_accepts_engine_line() {
        let mut p = Position::default();
        assert!(p.command("info score 3 bestmove (2,1)"));
        assert_eq!(p.piece_on(16).color(), Color::White);
    }

    #[test]
    fn test_command_resign() {
        let mut p = Position::default();
        assert!(p.command("(1,1)"));
        assert!(p.command("Player2 give up!"));
        assert!(p.is_game_over());
        assert_eq!(p.winner(), Color::White);
        assert_eq!(p.record(), "Player2 give up!");
        assert!(p.result_text().unwrap().starts_with("Player1 win!"));
    }

    #[test]
    fn test_command_time_over() {
        let mut p = Position::default();
        assert!(p.command("(1,1)"));
        assert!(p.command("Time over. Player2 win!"));
        assert_eq!(p.winner(), Color::Black);
        assert_eq!(p.game_over_reason(), GameOverReason::LoseTimeOver);
    }

    #[test]
    fn test_command_selects_rule() {
        let mut p = Position::default();
        assert!(p.command("r2 s99 t0"));
        assert_eq!(p.rule().piece_count, 12);
        assert!(p.rule().has_diagonal_lines);
        assert!(!p.command("r0 s99 t0"));
        assert!(!p.command("r99 s99 t0"));
        assert_eq!(p.rule().piece_count, 12, "Rejected rule keeps the current one");
    }

    #[test]
    fn test_command_empty_resets() {
        let mut p = Position::default();
        assert!(p.command("(1,1)"));
        assert!(p.command(""));
        assert_eq!(p.phase(), Phase::Ready);
        assert_eq!(p.action(), Action::Place);
    }

    #[test]
    fn test_command_draw_records() {
        let mut p = Position::default();
        assert!(p.command("(1,1)"));
        assert!(p.command(RECORD_THREEFOLD_DRAW));
        assert!(!p.is_game_over());
        assert!(p.command("draw"));
        assert_eq!(p.game_over_reason(), GameOverReason::DrawThreefoldRepetition);
    }
}
