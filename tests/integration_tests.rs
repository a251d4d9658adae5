//! Integration tests for backgammon-engine
//!
//! These drive the public API the way a front end would: set up a position,
//! roll, move, end the turn, and check the board and player bookkeeping
//! afterwards.

use std::collections::HashSet;

use backgammon_engine::board::{Board, Checker, Color, Move};
use backgammon_engine::constants::{BAR, DICE_OUTCOMES, OFF, TOTAL_CHECKERS};
use backgammon_engine::eval::Evaluator;
use backgammon_engine::game::{Game, GameError, SideConfig, TurnState};
use backgammon_engine::movegen::{generate_moves, generate_unique_states, roll_values};
use backgammon_engine::protocol::ProtocolEngine;
use backgammon_engine::rules;
use backgammon_engine::search::{Agent, SearchConfig, WindowMode};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Total checkers on points, bars and borne off for both colors.
fn total_checkers(game: &Game) -> usize {
    game.checker_totals().iter().sum()
}

/// Build a board from `(index, count, color)` entries.
fn layout(entries: &[(i32, usize, Color)]) -> Board {
    let mut board = Board::new();
    for &(index, count, color) in entries {
        board.place(color, index, count);
    }
    board
}

/// Play one turn choosing uniformly among the legal atomic moves.
fn play_random_turn(game: &mut Game, rng: &mut fastrand::Rng) {
    game.roll_dice().unwrap();
    loop {
        let moves = game.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.usize(..moves.len())];
        assert!(game.make_move(mv.from, mv.to), "generated move {mv} rejected");
    }
    assert_ne!(game.state(), TurnState::MakingMove);
    game.end_turn();
}

// =============================================================================
// Opening layout
// =============================================================================

#[test]
fn test_opening_layout() {
    let game = Game::with_seed(1);
    let board = game.board();
    for (index, count) in [(1, 2), (12, 5), (17, 3), (19, 5)] {
        assert_eq!(board.owner_at(index), Some(Color::White));
        assert_eq!(board.count_at(index), count);
    }
    for (index, count) in [(24, 2), (13, 5), (8, 3), (6, 5)] {
        assert_eq!(board.owner_at(index), Some(Color::Black));
        assert_eq!(board.count_at(index), count);
    }
    assert!(!rules::can_bear_off(board, Color::White, &[6, 5]));
    assert!(!rules::can_bear_off(board, Color::Black, &[6, 5]));
    assert_eq!(total_checkers(&game), TOTAL_CHECKERS);
}

// =============================================================================
// Board copies and state keys
// =============================================================================

#[test]
fn test_clone_is_independent() {
    let board = Board::starting();
    let mut copy = board.clone();
    assert_eq!(copy.state_key(), board.state_key());

    copy.move_checker(Color::White, Color::Black, 1, 3);
    copy.add_to_bar(Checker::new(Color::Black, 6));
    assert_ne!(copy.state_key(), board.state_key());
    assert_eq!(board, Board::starting());
}

#[test]
fn test_unique_states_never_repeat() {
    let mut board = Board::starting();
    board.move_checker(Color::White, Color::Black, 12, 16);
    board.move_checker(Color::Black, Color::White, 6, 4);
    for color in [Color::White, Color::Black] {
        for &(d1, d2, _) in DICE_OUTCOMES.iter() {
            let states = generate_unique_states(&board, color, &roll_values(d1, d2));
            let keys: HashSet<&str> = states.iter().map(|c| c.key.as_str()).collect();
            assert_eq!(keys.len(), states.len(), "{color} {d1}-{d2}");
        }
    }
}

// =============================================================================
// Bar and hitting
// =============================================================================

#[test]
fn test_bar_priority() {
    let mut board = Board::starting();
    board.add_to_bar(Checker::new(Color::White, 0));
    for &(d1, d2, _) in DICE_OUTCOMES.iter() {
        let moves = generate_moves(&board, Color::White, &roll_values(d1, d2));
        assert!(moves.iter().all(|m| m.from == BAR), "{d1}-{d2}: {moves:?}");
    }
}

#[test]
fn test_bar_blocks_other_moves_in_game() {
    let mut board = Board::new();
    board.place(Color::White, 1, 2);
    board.place(Color::White, 12, 4);
    board.place(Color::White, 17, 3);
    board.place(Color::White, 19, 5);
    board.add_to_bar(Checker::new(Color::White, 0));
    board.place(Color::Black, 6, 15);

    let mut game = Game::from_position(board, Color::White, 8);
    assert!(game.is_consistent());
    game.roll_dice_with(3, 4).unwrap();
    assert!(!game.make_move(12, 15), "bar checker must enter first");
    assert_eq!(game.get_available_end_points(12), Vec::<i32>::new());
    assert_eq!(game.get_available_end_points(BAR), vec![3, 4]);
    assert!(game.make_move(BAR, 3));
    assert!(game.make_move(12, 16));
    assert_eq!(game.state(), TurnState::EndTurn);
    assert!(game.is_consistent());
}

#[test]
fn test_hit_sends_blot_to_bar() {
    let board = layout(&[
        (3, 2, Color::White),
        (5, 1, Color::Black),
        (10, 2, Color::Black),
    ]);
    let mut game = Game::from_position(board, Color::White, 4);
    game.roll_dice_with(2, 6).unwrap();

    assert!(game.make_move(3, 5));
    let board = game.board();
    assert_eq!(board.count_at(5), 1);
    assert_eq!(board.owner_at(5), Some(Color::White));
    assert_eq!(board.bar_count(Color::Black), 1);
    assert!(game.is_consistent());
}

#[test]
fn test_bar_entry_against_closed_board() {
    let mut board = Board::new();
    for index in 19..=24 {
        board.place(Color::White, index, 2);
    }
    board.add_to_bar(Checker::new(Color::Black, 0));
    let mut game = Game::from_position(board, Color::Black, 6);
    game.roll_dice_with(6, 6).unwrap();
    assert_eq!(game.state(), TurnState::EndTurn);
    assert!(game.get_available_end_points(BAR).is_empty());
    game.end_turn();
    assert_eq!(game.current_color(), Color::White);
}

// =============================================================================
// Bearing off
// =============================================================================

#[test]
fn test_bear_off_overage() {
    let mut board = layout(&[(2, 3, Color::Black), (24, 15, Color::White)]);
    assert!(rules::can_bear_off_from_index(&board, Color::Black, 2, &[6]));
    assert!(!rules::can_bear_off_from_index(&board, Color::Black, 3, &[6]));

    // A checker farther out forbids the larger die
    board.place(Color::Black, 4, 1);
    assert!(!rules::can_bear_off_from_index(&board, Color::Black, 2, &[6]));
    assert!(rules::can_bear_off_from_index(&board, Color::Black, 4, &[6]));
}

#[test]
fn test_bear_off_requires_all_home() {
    let board = layout(&[
        (20, 14, Color::White),
        (18, 1, Color::White),
        (6, 15, Color::Black),
    ]);
    let mut game = Game::from_position(board, Color::White, 2);
    game.roll_dice_with(5, 1).unwrap();
    assert!(!game.can_bear_off());
    assert!(!game.bear_off_checker(20));
    assert!(game.make_move(18, 19));
    assert!(game.can_bear_off());
    assert!(game.make_move(20, OFF));
    assert_eq!(game.player(Color::White).borne_off(), 1);
    assert!(game.is_consistent());
}

#[test]
fn test_win_detection() {
    let board = layout(&[
        (24, 1, Color::White),
        (22, 1, Color::White),
        (13, 15, Color::Black),
    ]);
    let mut game = Game::from_position(board, Color::White, 12);
    game.roll_dice_with(3, 1).unwrap();
    assert!(game.bear_off_checker(22));
    assert!(game.bear_off_checker(24));
    assert!(game.player(Color::White).has_won());
    game.end_turn();
    assert!(game.is_game_over());
    assert_eq!(game.current_color(), Color::White);
    assert_eq!(game.winner(), Some(Color::White));
    assert_eq!(game.roll_dice_with(1, 2), Err(GameError::GameOver));
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn test_depth_zero_is_static_eval() {
    let mut board = Board::starting();
    board.move_checker(Color::White, Color::Black, 1, 7);
    board.move_checker(Color::Black, Color::White, 13, 7);
    for codes in ["", "0", "01234"] {
        let evaluator = Evaluator::from_codes(codes);
        let agent = Agent::new(Color::White, evaluator.clone(), SearchConfig::default());
        for maximizing in [true, false] {
            assert_eq!(
                agent.expectiminimax(&board, 0, maximizing, Color::Black),
                evaluator.evaluate(&board, Color::White)
            );
        }
    }
}

#[test]
fn test_agent_returns_playable_sequence() {
    let mut game = Game::with_seed(21);
    game.set_side(Color::White, SideConfig::ai("02", 1));
    game.roll_dice_with(4, 2).unwrap();
    let moves = game.get_best_move_for_current_player();
    assert_eq!(moves.len(), 2);
    assert_eq!(game.execute_ai_moves(&moves), 2);
    assert_eq!(game.state(), TurnState::EndTurn);
}

#[test]
fn test_every_window_mode_plays_a_full_roll() {
    let board = Board::starting();
    let mut exhaustive = Agent::new(
        Color::Black,
        Evaluator::from_codes("1"),
        SearchConfig::default().with_window(WindowMode::Exhaustive),
    );
    let full = exhaustive.best_move(&board, &[3, 1]);
    assert_eq!(full.len(), 2);

    for mode in [WindowMode::Shared, WindowMode::PerOutcome] {
        let config = SearchConfig::default().with_window(mode);
        let mut agent = Agent::new(Color::Black, Evaluator::from_codes("1"), config);
        let moves = agent.best_move(&board, &[3, 1]);
        assert_eq!(moves.len(), 2, "{mode:?}");
        assert!(agent.last_stats().nodes <= exhaustive.last_stats().nodes);
        assert_eq!(agent.last_stats().candidates, exhaustive.last_stats().candidates);
    }
}

#[test]
fn test_no_legal_move_means_empty_sequence() {
    let mut board = Board::new();
    for index in 1..=6 {
        board.place(Color::Black, index, 2);
    }
    board.add_to_bar(Checker::new(Color::White, 0));
    let mut agent = Agent::new(Color::White, Evaluator::new(), SearchConfig::default());
    assert_eq!(agent.best_move(&board, &[4, 4, 4, 4]), Vec::<Move>::new());
    assert_eq!(agent.last_stats().best_score, None);
}

// =============================================================================
// Whole games
// =============================================================================

#[test]
fn test_random_games_conserve_checkers() {
    for seed in 0..5u64 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut game = Game::with_seed(seed + 100);
        while !game.is_game_over() {
            play_random_turn(&mut game, &mut rng);
            assert_eq!(total_checkers(&game), TOTAL_CHECKERS, "seed {seed}");
            assert!(game.is_consistent(), "seed {seed}: {:?}", game.checker_totals());
            assert!(game.turns() < 10_000, "seed {seed}: game did not finish");
        }
        let winner = game.winner().unwrap();
        assert!(game.player(winner).has_won());
        assert_eq!(game.board().checkers_in_play(winner), 0);
    }
}

#[test]
fn test_seeded_ai_games_are_reproducible() {
    let play = |seed| {
        let mut game = Game::with_seed(seed);
        game.set_side(Color::White, SideConfig::ai("0", 0));
        game.set_side(Color::Black, SideConfig::ai("2", 0));
        let mut history = Vec::new();
        for _ in 0..20 {
            history.push(game.play_ai_turn().unwrap());
        }
        (history, game.board().state_key())
    };
    assert_eq!(play(77), play(77));
}

#[test]
fn test_protocol_session() {
    let mut engine =
        ProtocolEngine::with_sides(SideConfig::ai("", 0), SideConfig::ai("", 0), Some(3));
    let input = "\
1 roll 6 5
2 move 1 7
3 move 7 12
4 state
5 end_turn
6 state
7 move 24 18
";
    let mut out = Vec::new();
    engine.serve(input.as_bytes(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let responses: Vec<&str> = text.split("\n\n").filter(|r| !r.is_empty()).collect();
    assert_eq!(
        responses,
        vec![
            "=1 6 5",
            "=2 5",
            "=3 ",
            "=4 White end-turn",
            "=5 ",
            "=6 Black rolling",
            "?7 illegal move",
        ]
    );
    assert!(engine.game().is_consistent());
}
