//! Game lifecycle management
//!
//! A [`Game`] owns the position, the list of accepted records, one undo
//! checkpoint per record and the key history used for repetition draws. The
//! key history grows with every slide and is cleared by every placement or
//! removal, since neither can be undone on the board.

use tracing::debug;

use crate::constants::RECORD_THREEFOLD_DRAW;
use crate::error::MillEngineResult;
use crate::position::{Position, Transform};
use crate::rule::Rule;
use crate::types::{Key, MoveKind};

#[derive(Clone, Debug, Default)]
pub struct Game {
    position: Position,
    /// Position before each record, parallel to `records`
    checkpoints: Vec<Position>,
    records: Vec<String>,
    key_history: Vec<Key>,
}

impl Game {
    /// # Errors
    ///
    /// `InvalidRule` if the rule fails validation.
    pub fn new(rule: Rule) -> MillEngineResult<Self> {
        Ok(Self::with_position(Position::new(rule)?))
    }

    pub fn with_position(position: Position) -> Self {
        Self {
            position,
            checkpoints: Vec::new(),
            records: Vec::new(),
            key_history: Vec::new(),
        }
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Keys after each slide since the last placement or removal
    #[inline]
    pub fn key_history(&self) -> &[Key] {
        &self.key_history
    }

    /// Reset to an empty board under the current rule, dropping the history
    pub fn reset(&mut self) {
        self.position.reset();
        self.checkpoints.clear();
        self.records.clear();
        self.key_history.clear();
    }

    /// The current key has been seen three times in the key history
    pub fn has_game_cycle(&self) -> bool {
        let key = self.position.key();
        self.key_history.iter().filter(|&&k| k == key).count() >= 3
    }

    /// Apply one record. Returns whether it was accepted.
    ///
    /// Empty text resets the game. A rule record starts a new game under the
    /// selected preset. Under the threefold rule, a slide that completes a
    /// third repetition ends the game as a draw.
    pub fn command(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.reset();
            return true;
        }

        let before = self.position.clone();
        if !self.position.command(text) {
            return false;
        }

        if before.rule() != self.position.rule() {
            debug!("[GAME] rule changed to {}", self.position.rule().name);
            self.checkpoints.clear();
            self.records.clear();
            self.key_history.clear();
            self.checkpoints.push(before);
            self.records.push(text.to_string());
            return true;
        }

        let changed = self.position.state() != before.state();
        let record = if changed && self.position.game_ply() == before.game_ply() + 1 {
            let record = self.position.current_move().to_string();
            self.note_move_kind(self.position.current_move().kind());
            record
        } else if changed {
            self.position.record()
        } else {
            text.to_string()
        };

        self.checkpoints.push(before);
        self.records.push(record);

        if self.position.rule().threefold_repetition_rule
            && !self.position.is_game_over()
            && self.has_game_cycle()
        {
            debug!("[GAME] threefold repetition after {}", self.records.len());
            self.position.declare_threefold_draw();
        }
        true
    }

    fn note_move_kind(&mut self, kind: MoveKind) {
        match kind {
            MoveKind::Slide => self.key_history.push(self.position.key()),
            MoveKind::Place | MoveKind::Remove => self.key_history.clear(),
        }
    }

    /// Take back the last record
    pub fn undo(&mut self) -> bool {
        match self.records.len() {
            0 => false,
            n => self.step_back_to(n - 1),
        }
    }

    /// Return to the position after the first `n` records
    pub fn step_back_to(&mut self, n: usize) -> bool {
        if n > self.records.len() {
            return false;
        }
        if n == self.records.len() {
            return true;
        }
        self.position = self.checkpoints[n].clone();
        self.checkpoints.truncate(n);
        self.records.truncate(n);
        self.rebuild_key_history();
        true
    }

    /// Recompute the key history from the checkpoints
    fn rebuild_key_history(&mut self) {
        self.key_history.clear();
        for i in 0..self.checkpoints.len() {
            let after = self.checkpoints.get(i + 1).unwrap_or(&self.position);
            let before = &self.checkpoints[i];
            if after.game_ply() != before.game_ply() + 1 || before.rule() != after.rule() {
                continue;
            }
            match after.current_move().kind() {
                MoveKind::Slide => self.key_history.push(after.key()),
                MoveKind::Place | MoveKind::Remove => self.key_history.clear(),
            }
        }
    }

    /// Apply a board symmetry to the position, every checkpoint and every record
    pub fn transform(&mut self, t: Transform) {
        self.position.transform(t);
        for checkpoint in &mut self.checkpoints {
            checkpoint.transform(t);
        }
        for record in &mut self.records {
            *record = t.map_record(record);
        }
        self.rebuild_key_history();
    }

    pub fn mirror(&mut self) {
        self.transform(Transform::Mirror);
    }

    pub fn turn(&mut self) {
        self.transform(Transform::Turn);
    }

    /// Rotate by a multiple of 90 degrees. Returns false for other angles.
    pub fn rotate(&mut self, degrees: i32) -> bool {
        match Transform::rotation(degrees) {
            Some(t) => {
                self.transform(t);
                true
            }
            None => degrees.rem_euclid(360) == 0,
        }
    }

    /// The game ended by repetition and the last record says so
    pub fn is_threefold_draw(&self) -> bool {
        self.position.is_game_over() && self.position.record() == RECORD_THREEFOLD_DRAW
    }
}
