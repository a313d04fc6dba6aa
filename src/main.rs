//! Text front end for the mill engine
//!
//! Reads one command per line from stdin and answers on stdout. Logs go to
//! stderr so stdout carries protocol lines only.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mill_engine::search::Algorithm;
use mill_engine::types::Depth;
use mill_engine::{Engine, EngineOptions, Game, MillEngineError, Rule};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "millgame", about = "Nine Men's Morris family engine")]
struct Args {
    /// Zero-based index of a built-in rule variant
    #[arg(long, default_value_t = 0)]
    rule: usize,

    /// JSON rule file, overlaid on the Nine Men's Morris defaults
    #[arg(long, conflicts_with = "rule")]
    rule_file: Option<PathBuf>,

    /// alphabeta, pvs or mtdf
    #[arg(long, default_value = "mtdf")]
    algorithm: Algorithm,

    /// Maximum search depth
    #[arg(long)]
    depth: Option<Depth>,

    /// Seconds per move, 0 searches to depth only
    #[arg(long)]
    move_time: Option<u64>,

    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Shuffle moves of equal order
    #[arg(long)]
    shuffle: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Search the maximum depth directly
    #[arg(long)]
    no_ids: bool,
}

impl Args {
    fn rule(&self) -> Result<Rule> {
        let Some(path) = &self.rule_file else {
            return Rule::preset(self.rule).context("Selecting rule preset");
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading rule file {}", path.display()))?;
        let rule: Rule = serde_json::from_str(&text)
            .with_context(|| format!("Parsing rule file {}", path.display()))?;
        rule.validate().context("Validating rule file")?;
        Ok(rule)
    }

    fn engine_options(&self) -> EngineOptions {
        let defaults = EngineOptions::default();
        EngineOptions {
            algorithm: self.algorithm,
            max_depth: self.depth.unwrap_or(defaults.max_depth),
            move_time: self.move_time.unwrap_or(defaults.move_time),
            ids: !self.no_ids,
            threads: self.threads.max(1),
            shuffle: self.shuffle,
            seed: self.seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let rule = args.rule()?;
    info!("[CLI] rule {} with {} engine", rule.name, args.algorithm);

    let mut session = Session {
        game: Game::new(rule).context("Starting game")?,
        engine: Engine::new(args.engine_options()),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("Reading stdin")?;
        match session.handle(line.trim(), &mut out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                warn!("[CLI] {:#}", e);
                writeln!(out, "error {:#}", e).context("Writing stdout")?;
            }
        }
        out.flush().context("Flushing stdout")?;
    }
    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    game: Game,
    engine: Engine,
}

impl Session {
    fn handle(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        match word {
            "" => {}
            "quit" => return Ok(Flow::Quit),
            "go" => self.go(out)?,
            "setoption" => self.set_option(rest)?,
            "position" => writeln!(out, "{}", self.game.position())?,
            "undo" => {
                if !self.game.undo() {
                    bail!("Nothing to undo");
                }
            }
            "new" => {
                self.game.reset();
                self.engine.clear();
            }
            _ => {
                if !self.game.command(line) {
                    bail!("Rejected record: {}", line);
                }
                if let Some(result) = self.game.position().result_text() {
                    writeln!(out, "{}", result)?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn go(&mut self, out: &mut impl Write) -> Result<()> {
        let outcome = self
            .engine
            .search(self.game.position(), self.game.key_history())
            .context("Searching")?;
        writeln!(out, "{}", outcome.info_line())?;
        if !self.game.command(&outcome.record) {
            bail!("Engine record was not accepted: {}", outcome.record);
        }
        if let Some(result) = self.game.position().result_text() {
            writeln!(out, "{}", result)?;
        }
        Ok(())
    }

    /// `name <n> value <v>`: engine options first, then rule options
    fn set_option(&mut self, rest: &str) -> Result<()> {
        let rest = rest.trim();
        let Some(rest) = rest.strip_prefix("name ") else {
            bail!("Expected: setoption name <name> value <value>");
        };
        let (name, value) = rest.split_once(" value ").unwrap_or((rest, ""));
        let (name, value) = (name.trim(), value.trim());

        match self.engine.set_option(name, value) {
            Err(MillEngineError::UnknownOption { .. }) => {}
            other => return other.with_context(|| format!("Setting option {}", name)),
        }

        let mut rule = self.game.position().rule().clone();
        rule.set_option(name, value)
            .with_context(|| format!("Setting option {}", name))?;
        let mut game = Game::new(rule).context("Restarting game")?;
        for record in self.game.records() {
            if !game.command(record) {
                warn!("[CLI] record {} no longer legal, history cut", record);
                break;
            }
        }
        self.game = game;
        self.engine.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            game: Game::default(),
            engine: Engine::new(EngineOptions {
                max_depth: 2,
                ..EngineOptions::default()
            }),
        }
    }

    fn run(session: &mut Session, line: &str) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = session.handle(line, &mut out).map(|_| ());
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_go_prints_and_applies() {
        let mut s = session();
        let (result, out) = run(&mut s, "go");
        assert!(result.is_ok());
        assert!(out.starts_with("info score "), "Got {}", out);
        assert_eq!(s.game.records().len(), 1, "Engine move applied");
    }

    #[test]
    fn test_rejected_record_is_error() {
        let mut s = session();
        assert!(run(&mut s, "(1,1)").0.is_ok());
        assert!(run(&mut s, "(1,1)").0.is_err(), "Occupied square");
        assert!(run(&mut s, "undo").0.is_ok());
        assert!(run(&mut s, "undo").0.is_err(), "Nothing left");
    }

    #[test]
    fn test_setoption_routes_engine_then_rule() {
        let mut s = session();
        assert!(run(&mut s, "setoption name Depth value 3").0.is_ok());
        assert_eq!(s.engine.options().max_depth, 3);

        assert!(run(&mut s, "(1,1)").0.is_ok());
        assert!(run(&mut s, "setoption name HasDiagonalLines value true").0.is_ok());
        assert!(s.game.position().rule().has_diagonal_lines);
        assert_eq!(s.game.records(), ["(1,1)"], "History replayed under the new rule");

        assert!(run(&mut s, "setoption name Bogus value 1").0.is_err());
    }

    #[test]
    fn test_quit_stops() {
        let mut s = session();
        assert!(matches!(s.handle("quit", &mut Vec::new()), Ok(Flow::Quit)));
    }
}
