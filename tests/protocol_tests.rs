//! Integration tests for the text record protocol
//!
//! Every record a GUI or a CLI exchanges with the engine: move records,
//! engine result lines, resignation and time-out records, rule selection
//! and the repetition draw records.

use mill_engine::constants::RECORD_THREEFOLD_DRAW;
use mill_engine::rule::presets;
use mill_engine::{Color, Engine, EngineOptions, Game, GameOverReason, Move, Rule};

#[test]
fn test_move_records_round_trip() {
    //! The three move forms print and parse back to the same move

    for record in ["(1,1)", "(3,8)", "(2,4)->(2,5)", "(1,2)->(3,2)", "-(2,7)"] {
        let m: Move = record.parse().unwrap();
        assert_eq!(m.to_string(), record);
    }
    for bad in ["", "(0,1)", "(1,0)", "(2,2)->(2,2)", "-(4,4)", "(1,1)->", "x"] {
        assert!(bad.parse::<Move>().is_err(), "{:?} should not parse", bad);
    }
}

#[test]
fn test_engine_line_feeds_back_into_game() {
    //! The engine's result line is itself an accepted record

    let mut game = Game::default();
    assert!(game.command("(2,1)"));

    let mut engine = Engine::new(EngineOptions {
        max_depth: 2,
        ..EngineOptions::default()
    });
    let outcome = engine.search(game.position(), game.key_history()).unwrap();
    let line = outcome.info_line();
    assert!(line.starts_with("info score "));
    assert!(line.ends_with(&format!("bestmove {}", outcome.record)));

    assert!(game.command(&line));
    assert_eq!(game.records().last().unwrap(), &outcome.record);
    assert_eq!(game.position().side_to_move(), Color::White);
}

#[test]
fn test_rejected_records_leave_the_game_alone() {
    //! Illegal or malformed records return false and change nothing

    let mut game = Game::default();
    assert!(game.command("(1,1)"));
    let before = *game.position().state();

    for record in ["(1,1)", "-(1,1)", "(1,1)->(1,2)", "Player3 give up!", "r0 s1 t0", "hello"] {
        assert!(!game.command(record), "{} should be rejected", record);
    }
    assert_eq!(*game.position().state(), before);
    assert_eq!(game.records(), ["(1,1)"]);
}

#[test]
fn test_give_up_and_time_over() {
    //! Control records end the game with the right winner and echo back

    let mut game = Game::default();
    assert!(game.command("(1,1)"));
    assert!(game.command("Player1 give up!"));
    assert_eq!(game.position().winner(), Color::Black);
    assert_eq!(game.position().game_over_reason(), GameOverReason::LoseResign);
    assert_eq!(game.records().last().unwrap(), "Player1 give up!");
    assert!(!game.command("(1,2)"), "No moves after the game ended");

    let mut game = Game::default();
    assert!(game.command("(1,1)"));
    assert!(game.command("Time over. Player1 win!"));
    assert_eq!(game.position().winner(), Color::White);
    assert_eq!(game.position().game_over_reason(), GameOverReason::LoseTimeOver);
    assert_eq!(game.records().last().unwrap(), "Time over. Player1 win!");
}

#[test]
fn test_rule_records_select_presets() {
    //! `r<N>` is one-based and bounded by the preset list

    let mut game = Game::default();
    let count = presets().len();

    for (i, preset) in presets().iter().enumerate() {
        assert!(game.command(&format!("r{} s100 t0", i + 1)));
        assert_eq!(game.position().rule(), preset);
        assert_eq!(game.records().len(), 1, "A rule record starts a new game");
    }
    assert!(!game.command(&format!("r{} s100 t0", count + 1)));
    assert!(!game.command("r1 s100"), "All three fields are required");
}

#[test]
fn test_draw_records_need_repetition_rule() {
    //! `draw` ends the game only when repetition draws are enabled

    let mut game = Game::default();
    assert!(game.position().rule().threefold_repetition_rule);
    assert!(game.command("(1,1)"));
    assert!(game.command(RECORD_THREEFOLD_DRAW));
    assert!(!game.position().is_game_over(), "The announcement alone is not a draw");
    assert!(game.command("draw"));
    assert_eq!(
        game.position().game_over_reason(),
        GameOverReason::DrawThreefoldRepetition
    );

    let mut game = Game::new(Rule {
        threefold_repetition_rule: false,
        ..Rule::default()
    })
    .unwrap();
    assert!(game.command("(1,1)"));
    assert!(!game.command("draw"));
}

#[test]
fn test_rule_file_overlays_defaults() {
    //! A partial JSON rule keeps the Nine Men's Morris values it omits

    let rule: Rule = serde_json::from_str(r#"{ "piece_count": 12, "has_diagonal_lines": true }"#)
        .unwrap();
    assert!(rule.validate().is_ok());
    assert_eq!(rule.piece_count, 12);
    assert_eq!(rule.fly_piece_count, Rule::default().fly_piece_count);

    let game = Game::new(rule).unwrap();
    assert_eq!(game.position().piece_in_hand_count(Color::Black), 12);

    let bad: Rule = serde_json::from_str(r#"{ "piece_count": 40 }"#).unwrap();
    assert!(Game::new(bad).is_err());
}

#[test]
fn test_set_option_changes_rule() {
    //! Named options validate before they commit

    let mut rule = Rule::default();
    rule.set_option("PiecesCount", "12").unwrap();
    rule.set_option("HasDiagonalLines", "true").unwrap();
    assert_eq!(rule.piece_count, 12);
    assert!(rule.has_diagonal_lines);

    assert!(rule.set_option("PiecesCount", "2").is_err());
    assert_eq!(rule.piece_count, 12, "Rejected value keeps the previous rule");
    assert!(rule.set_option("NoSuchOption", "1").is_err());
}
