//! Integration tests for complete game flows
//!
//! Drives the engine crate through its public API on the standard Nine Men's
//! Morris board: opening placements, mills and removals, flying, the
//! insufficient-pieces loss and threefold repetition.

use mill_engine::move_gen::generate_legal;
use mill_engine::position::StateStack;
use mill_engine::{
    Action, Color, Engine, EngineOptions, Game, GameOverReason, Move, MoveKind, OutcomeKind,
    Phase, Position, Rule,
};

/// Apply every record, failing the test on the first rejection
fn play(game: &mut Game, records: &[&str]) {
    for record in records {
        assert!(game.command(record), "{} should be accepted", record);
    }
}

/// Four pieces each, placed without closing a mill
fn moving_game() -> Game {
    let mut game = Game::new(Rule {
        piece_count: 4,
        ..Rule::default()
    })
    .unwrap();
    play(
        &mut game,
        &["(1,1)", "(1,3)", "(2,2)", "(2,4)", "(3,5)", "(3,7)", "(1,6)", "(2,8)"],
    );
    game
}

const SHUFFLE: [&str; 4] = ["(1,1)->(1,2)", "(1,3)->(1,4)", "(1,2)->(1,1)", "(1,4)->(1,3)"];

#[test]
fn test_empty_board_offers_every_point() {
    //! White to place on an empty standard board may use all 24 points

    let pos = Position::default();
    let moves = generate_legal(&pos);
    assert_eq!(moves.len(), 24);
    assert!(moves.iter().all(|m| m.mv.kind() == MoveKind::Place));
}

#[test]
fn test_third_piece_on_a_line_enters_removal() {
    //! Closing a mill during placing hands White exactly one removal

    let mut game = Game::default();
    play(&mut game, &["(1,8)", "(3,1)", "(1,1)", "(3,3)", "(1,2)"]);

    let pos = game.position();
    assert_eq!(pos.action(), Action::Remove);
    assert_eq!(pos.side_to_move(), Color::White, "The mill owner removes");
    assert_eq!(pos.piece_to_remove_count(Color::White), 1);
    assert_eq!(pos.mills_count(9), 1);

    play(&mut game, &["-(3,1)"]);
    assert_eq!(game.position().side_to_move(), Color::Black);
    assert_eq!(game.position().piece_on_board_count(Color::Black), 1);
}

#[test]
fn test_three_pieces_fly_to_any_empty_point() {
    //! With exactly three pieces on board and flying enabled, every own piece
    //! may jump to every empty point

    let mut game = Game::new(Rule {
        piece_count: 3,
        may_fly: true,
        ..Rule::default()
    })
    .unwrap();
    play(&mut game, &["(1,1)", "(1,2)", "(2,3)", "(2,4)", "(3,5)", "(3,6)"]);

    let pos = game.position();
    assert_eq!(pos.phase(), Phase::Moving);
    assert_eq!(pos.piece_on_board_count(Color::White), 3);

    let moves = generate_legal(pos);
    let empty: Vec<_> = (8..32).filter(|&s| pos.piece_on(s).is_empty()).collect();
    for from in (8..32).filter(|&s| pos.color_on(s) == Color::White) {
        for &to in &empty {
            assert!(
                moves.iter().any(|m| m.mv == Move::slide(from, to)),
                "{} should be listed",
                Move::slide(from, to)
            );
        }
    }
}

#[test]
fn test_insufficient_pieces_loses() {
    //! Dropping below the minimum piece count ends the game for that side

    let mut game = Game::new(Rule {
        piece_count: 3,
        ..Rule::default()
    })
    .unwrap();
    play(&mut game, &["(1,8)", "(3,1)", "(1,1)", "(3,3)", "(1,2)", "-(3,1)"]);

    let mut pos = game.position().clone();
    assert!(
        pos.piece_on_board_count(Color::Black) + pos.piece_in_hand_count(Color::Black)
            < pos.rule().pieces_at_least_count
    );
    assert!(pos.check_if_game_is_over());
    assert_eq!(pos.winner(), Color::White);
    assert_eq!(pos.game_over_reason(), GameOverReason::LoseFewerThanThree);
    assert!(pos.result_text().unwrap().starts_with("Player1 win!"));
}

#[test]
fn test_stack_detects_repetition_inside_search_line() {
    //! `has_repeated` looks back through the undo stack for the current key

    let game = moving_game();
    let mut pos = game.position().clone();
    let mut stack = StateStack::new();

    for record in &SHUFFLE[..3] {
        pos.do_move(record.parse().unwrap(), &mut stack).unwrap();
        assert!(!pos.has_repeated(&stack), "{} is a new position", record);
    }
    pos.do_move(SHUFFLE[3].parse().unwrap(), &mut stack).unwrap();
    assert!(pos.has_repeated(&stack), "Back at the start of the shuffle");
    assert_eq!(pos.key(), game.position().key());
}

#[test]
fn test_threefold_repetition_is_a_draw() {
    //! The third occurrence of a position ends the game and the engine
    //! reports the draw instead of a move

    let mut game = moving_game();
    play(&mut game, &SHUFFLE);
    play(&mut game, &SHUFFLE);
    assert!(!game.position().is_game_over());

    // The shuffle start has been seen three times, two of them after slides
    let mut history = vec![game.position().key()];
    history.extend_from_slice(game.key_history());
    let mut engine = Engine::new(EngineOptions {
        max_depth: 3,
        ..EngineOptions::default()
    });
    let outcome = engine.search(game.position(), &history).unwrap();
    assert_eq!(
        outcome.kind,
        OutcomeKind::Draw(GameOverReason::DrawThreefoldRepetition)
    );
    assert_eq!(outcome.info_line(), "info score 0 bestmove draw");

    play(&mut game, &SHUFFLE[..1]);
    assert!(game.has_game_cycle());
    assert!(game.is_threefold_draw());
    assert!(engine.search(game.position(), game.key_history()).is_err());
}

#[test]
fn test_repetition_ignored_without_the_rule() {
    //! With repetition draws disabled the same shuffle keeps the game going

    let mut game = Game::new(Rule {
        piece_count: 4,
        threefold_repetition_rule: false,
        ..Rule::default()
    })
    .unwrap();
    play(
        &mut game,
        &["(1,1)", "(1,3)", "(2,2)", "(2,4)", "(3,5)", "(3,7)", "(1,6)", "(2,8)"],
    );
    for _ in 0..3 {
        play(&mut game, &SHUFFLE);
    }
    assert!(!game.position().is_game_over());
    assert!(!game.command("draw"), "Draw records need the repetition rule");
}
