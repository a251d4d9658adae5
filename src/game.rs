//! Turn coordinator.
//!
//! A [`Game`] owns the canonical board, both players and the dice, and runs
//! each turn through `RollingDice -> MakingMove -> EndTurn`. Illegal moves are
//! answered with `false`; rolling out of turn is a [`GameError`].

use std::fmt;

use log::{debug, info, warn};

use crate::board::{Board, Color, Move};
use crate::constants::{BAR, CHECKERS_PER_SIDE, OFF};
use crate::dice::Dice;
use crate::eval::Evaluator;
use crate::movegen::{apply_move, die_for_move, generate_moves};
use crate::player::Player;
use crate::rules;
use crate::search::{Agent, SearchConfig, SearchGuard, SearchRequest};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnState {
    RollingDice,
    MakingMove,
    EndTurn,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnState::RollingDice => write!(f, "rolling"),
            TurnState::MakingMove => write!(f, "moving"),
            TurnState::EndTurn => write!(f, "end-turn"),
        }
    }
}

/// Turn-order violations by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// An action was attempted in the wrong turn state.
    WrongState { expected: TurnState, actual: TurnState },
    /// The game has already been won.
    GameOver,
    /// The side to move is not computer-controlled.
    NotComputerSide(Color),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::WrongState { expected, actual } => {
                write!(f, "turn state is {actual}, expected {expected}")
            }
            GameError::GameOver => write!(f, "game is over"),
            GameError::NotComputerSide(color) => write!(f, "{color} is not computer-controlled"),
        }
    }
}

impl std::error::Error for GameError {}

/// How one side chooses its moves.
#[derive(Clone, Debug)]
pub struct SideConfig {
    /// Moves are chosen by the search agent when true.
    pub ai: bool,
    /// Evaluation factor codes, e.g. `"024"`.
    pub factors: String,
    pub search: SearchConfig,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            ai: false,
            factors: String::new(),
            search: SearchConfig::default(),
        }
    }
}

impl SideConfig {
    pub fn ai(factors: &str, depth: u32) -> Self {
        Self {
            ai: true,
            factors: factors.to_string(),
            search: SearchConfig::default().with_depth(depth),
        }
    }
}

pub struct Game {
    players: [Player; 2],
    current: usize,
    board: Board,
    dice: Dice,
    state: TurnState,
    game_over: bool,
    sides: [SideConfig; 2],
    guard: SearchGuard,
    turns: usize,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// New game with the standard layout; White moves first.
    pub fn new() -> Self {
        Self::with_dice(Dice::new())
    }

    /// New game whose dice follow a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_dice(Dice::with_seed(seed))
    }

    fn with_dice(dice: Dice) -> Self {
        Self {
            players: [Player::new(Color::White), Player::new(Color::Black)],
            current: 0,
            board: Board::starting(),
            dice,
            state: TurnState::RollingDice,
            game_over: false,
            sides: [SideConfig::default(), SideConfig::default()],
            guard: SearchGuard::new(),
            turns: 0,
        }
    }

    /// Start from an arbitrary position with `to_move` rolling next.
    ///
    /// Checkers missing from `board` count as borne off.
    pub fn from_position(board: Board, to_move: Color, seed: u64) -> Self {
        let mut game = Self::with_seed(seed);
        for player in &mut game.players {
            for _ in 0..board.borne_off(player.color) {
                player.bear_off();
            }
        }
        game.board = board;
        game.current = to_move.index();
        game
    }

    pub fn set_side(&mut self, color: Color, side: SideConfig) {
        self.sides[color.index()] = side;
    }

    pub fn side(&self, color: Color) -> &SideConfig {
        &self.sides[color.index()]
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current]
    }

    pub fn current_color(&self) -> Color {
        self.players[self.current].color
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The winner once the game is over.
    pub fn winner(&self) -> Option<Color> {
        self.game_over.then(|| self.current_color())
    }

    /// Completed turns so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn dice_values(&self) -> Vec<u8> {
        self.dice.values().collect()
    }

    // =========================================================================
    // Turn flow
    // =========================================================================

    fn expect_state(&self, expected: TurnState) -> Result<(), GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if self.state != expected {
            return Err(GameError::WrongState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// Roll both dice. Only legal at the start of a turn.
    pub fn roll_dice(&mut self) -> Result<(), GameError> {
        self.expect_state(TurnState::RollingDice)?;
        self.dice.roll();
        self.after_roll();
        Ok(())
    }

    /// Roll with fixed values, e.g. when dice are thrown outside the engine.
    pub fn roll_dice_with(&mut self, die1: u8, die2: u8) -> Result<(), GameError> {
        self.expect_state(TurnState::RollingDice)?;
        self.dice.set(die1, die2);
        self.after_roll();
        Ok(())
    }

    fn after_roll(&mut self) {
        self.state = TurnState::MakingMove;
        self.check_remaining_moves();
    }

    fn check_remaining_moves(&mut self) {
        if !self.has_available_moves() {
            self.state = TurnState::EndTurn;
        }
    }

    /// True if the current player can make at least one move with the
    /// unused dice.
    pub fn has_available_moves(&self) -> bool {
        if self.game_over || self.state != TurnState::MakingMove {
            return false;
        }
        !generate_moves(&self.board, self.current_color(), &self.dice_values()).is_empty()
    }

    /// All atomic moves currently legal.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.game_over || self.state != TurnState::MakingMove {
            return Vec::new();
        }
        generate_moves(&self.board, self.current_color(), &self.dice_values())
    }

    /// Points reachable from `from` with one unused die. `from == 0` asks
    /// about bar entries.
    pub fn get_available_end_points(&self, from: i32) -> Vec<i32> {
        let mut ends = Vec::new();
        for mv in self.legal_moves() {
            if mv.from == from && mv.to != OFF && !ends.contains(&mv.to) {
                ends.push(mv.to);
            }
        }
        ends
    }

    /// Move a checker from `from` to `to` (use `0` for the bar and `-1` to
    /// bear off). Returns `false` and changes nothing if the move is illegal.
    pub fn make_move(&mut self, from: i32, to: i32) -> bool {
        if to == OFF {
            return self.bear_off_checker(from);
        }
        if self.game_over || self.state != TurnState::MakingMove {
            return false;
        }
        let color = self.current_color();
        let mv = Move::new(from, to);
        if from != BAR && self.board.bar_count(color) > 0 {
            return false;
        }
        let Some(die) = die_for_move(&self.board, color, mv, &self.dice_values()) else {
            return false;
        };
        if !apply_move(&mut self.board, color, mv) {
            return false;
        }
        self.dice.use_die(die);
        self.check_remaining_moves();
        true
    }

    /// Bear a checker off from `from` if the rules allow it.
    pub fn bear_off_checker(&mut self, from: i32) -> bool {
        if self.game_over || self.state != TurnState::MakingMove {
            return false;
        }
        let color = self.current_color();
        let Some(die) = rules::bear_off_die(&self.board, color, from, &self.dice_values()) else {
            return false;
        };
        if !apply_move(&mut self.board, color, Move::new(from, OFF)) {
            return false;
        }
        self.players[self.current].bear_off();
        self.dice.use_die(die);
        self.check_remaining_moves();
        true
    }

    /// True if the current player has every checker home and a die to use.
    pub fn can_bear_off(&self) -> bool {
        rules::can_bear_off(&self.board, self.current_color(), &self.dice_values())
    }

    pub fn can_bear_off_from_index(&self, index: i32) -> bool {
        let color = self.current_color();
        rules::can_bear_off_from_index(&self.board, color, index, &self.dice_values())
    }

    /// Finish the turn: detect a win, otherwise clear the dice and pass play
    /// to the other side. Does nothing once the game is over.
    pub fn end_turn(&mut self) {
        if self.game_over {
            return;
        }
        self.turns += 1;
        if self.current_player().has_won() {
            self.game_over = true;
            info!("{} wins after {} turns", self.current_color(), self.turns);
            return;
        }
        self.dice.reset();
        self.current = 1 - self.current;
        self.state = TurnState::RollingDice;
    }

    // =========================================================================
    // Search agent
    // =========================================================================

    fn agent_for(&self, color: Color) -> Agent {
        let side = &self.sides[color.index()];
        Agent::new(color, Evaluator::from_codes(&side.factors), side.search.clone())
    }

    /// Package a search for the current player that can run on another
    /// thread. `None` if the side to move is not computer-controlled, a
    /// search is already in progress, or there is nothing to decide.
    pub fn search_request(&self) -> Option<SearchRequest> {
        if self.game_over || self.state != TurnState::MakingMove {
            return None;
        }
        if !self.sides[self.current].ai {
            debug!("{} is not computer-controlled, no search", self.current_color());
            return None;
        }
        let Some(permit) = self.guard.try_acquire() else {
            warn!("search already in progress, request ignored");
            return None;
        };
        Some(SearchRequest {
            agent: self.agent_for(self.current_color()),
            board: self.board.clone(),
            dice: self.dice_values(),
            permit,
        })
    }

    /// True while a search started from this game is running.
    pub fn is_searching(&self) -> bool {
        self.guard.is_busy()
    }

    /// The agent's chosen move sequence for the current roll. Empty for a
    /// side that is not computer-controlled.
    pub fn get_best_move_for_current_player(&self) -> Vec<Move> {
        self.search_request()
            .map(SearchRequest::run)
            .unwrap_or_default()
    }

    /// Play a move sequence in order, stopping at the first illegal move.
    /// Returns the number of moves applied.
    pub fn execute_ai_moves(&mut self, moves: &[Move]) -> usize {
        let mut applied = 0;
        for mv in moves {
            if !self.make_move(mv.from, mv.to) {
                warn!("{} rejected move {mv}", self.current_color());
                break;
            }
            applied += 1;
        }
        applied
    }

    /// Roll, search, play and end one turn for the current player.
    /// Returns the moves played.
    pub fn play_ai_turn(&mut self) -> Result<Vec<Move>, GameError> {
        self.expect_state(TurnState::RollingDice)?;
        if !self.sides[self.current].ai {
            return Err(GameError::NotComputerSide(self.current_color()));
        }
        self.roll_dice()?;
        let moves = self.get_best_move_for_current_player();
        let applied = self.execute_ai_moves(&moves);
        self.end_turn();
        Ok(moves[..applied].to_vec())
    }

    /// Checkers of each color on the board, on the bar and borne off.
    /// Always 15 per color when the game is consistent.
    pub fn checker_totals(&self) -> [usize; 2] {
        [Color::White, Color::Black].map(|c| {
            self.board.checkers_in_play(c) + self.players[c.index()].borne_off()
        })
    }

    /// True if board and players agree on the checker count for both colors.
    pub fn is_consistent(&self) -> bool {
        self.checker_totals() == [CHECKERS_PER_SIDE; 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Checker;

    #[test]
    fn test_new_game() {
        let game = Game::with_seed(1);
        assert_eq!(game.current_color(), Color::White);
        assert_eq!(game.state(), TurnState::RollingDice);
        assert!(!game.can_bear_off());
        assert!(game.is_consistent());
    }

    #[test]
    fn test_roll_out_of_turn_is_error() {
        let mut game = Game::with_seed(1);
        game.roll_dice_with(3, 1).unwrap();
        assert_eq!(
            game.roll_dice(),
            Err(GameError::WrongState {
                expected: TurnState::RollingDice,
                actual: TurnState::MakingMove
            })
        );
    }

    #[test]
    fn test_make_move_consumes_die() {
        let mut game = Game::with_seed(1);
        game.roll_dice_with(3, 1).unwrap();
        assert!(game.make_move(17, 20));
        assert_eq!(game.dice_values(), vec![1]);
        assert!(!game.make_move(17, 20), "3 already used");
        assert!(game.make_move(19, 20));
        assert_eq!(game.state(), TurnState::EndTurn);
        game.end_turn();
        assert_eq!(game.current_color(), Color::Black);
        assert_eq!(game.state(), TurnState::RollingDice);
        assert!(game.is_consistent());
    }

    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut game = Game::with_seed(1);
        game.roll_dice_with(5, 2).unwrap();
        let before = game.board().clone();
        assert!(!game.make_move(1, 6), "Black holds 6");
        assert!(!game.make_move(12, 10), "backwards");
        assert!(!game.make_move(30, 35));
        assert_eq!(game.board(), &before);
        assert_eq!(game.dice_values(), vec![5, 2]);
    }

    #[test]
    fn test_available_end_points() {
        let mut game = Game::with_seed(1);
        game.roll_dice_with(6, 4).unwrap();
        let ends = game.get_available_end_points(1);
        // 1+6 = 7 is empty, 1+4 = 5 is empty
        assert_eq!(ends, vec![7, 5]);
        assert!(game.get_available_end_points(6).is_empty());
    }

    #[test]
    fn test_auto_end_turn_when_blocked() {
        let mut board = Board::new();
        for index in 1..=6 {
            board.place(Color::Black, index, 2);
        }
        board.place(Color::Black, 10, 3);
        board.add_to_bar(Checker::new(Color::White, 0));
        board.place(Color::White, 20, 14);
        let mut game = Game::from_position(board, Color::White, 3);
        game.roll_dice_with(2, 5).unwrap();
        assert_eq!(game.state(), TurnState::EndTurn);
        assert!(!game.has_available_moves());
        assert!(game.is_consistent());
    }

    #[test]
    fn test_win_detection() {
        let mut board = Board::new();
        board.place(Color::Black, 1, 1);
        board.place(Color::White, 20, 15);
        let mut game = Game::from_position(board, Color::Black, 5);
        assert_eq!(game.player(Color::Black).active_count(), 1);
        game.roll_dice_with(1, 2).unwrap();
        assert!(game.bear_off_checker(1));
        assert_eq!(game.state(), TurnState::EndTurn);
        game.end_turn();
        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(Color::Black));
        assert_eq!(game.current_color(), Color::Black);
        assert_eq!(game.roll_dice(), Err(GameError::GameOver));
    }

    #[test]
    fn test_ai_turn_keeps_invariant() {
        let mut game = Game::with_seed(11);
        game.set_side(Color::White, SideConfig::ai("02", 0));
        game.set_side(Color::Black, SideConfig::ai("13", 0));
        for _ in 0..10 {
            game.play_ai_turn().unwrap();
            assert!(game.is_consistent());
        }
        assert_eq!(game.turns(), 10);
    }

    #[test]
    fn test_human_side_is_not_searched() {
        let mut game = Game::with_seed(6);
        game.set_side(Color::Black, SideConfig::ai("0", 0));
        assert!(!game.side(Color::White).ai);
        assert_eq!(game.play_ai_turn(), Err(GameError::NotComputerSide(Color::White)));
        assert_eq!(game.state(), TurnState::RollingDice, "dice stay unrolled");

        game.roll_dice_with(6, 5).unwrap();
        assert!(game.search_request().is_none());
        assert!(game.get_best_move_for_current_player().is_empty());
        assert!(game.make_move(1, 7));
        assert!(game.make_move(7, 12));
        game.end_turn();

        // Black is computer-controlled
        assert_eq!(game.current_color(), Color::Black);
        assert!(!game.play_ai_turn().unwrap().is_empty());
        assert_eq!(game.current_color(), Color::White);
    }

    #[test]
    fn test_concurrent_search_rejected() {
        let mut game = Game::with_seed(2);
        game.set_side(Color::White, SideConfig::ai("", 1));
        game.roll_dice_with(4, 2).unwrap();
        let request = game.search_request().expect("first request");
        assert!(game.is_searching());
        assert!(game.get_best_move_for_current_player().is_empty());
        let moves = request.run();
        assert!(!moves.is_empty());
        assert!(!game.is_searching());
        assert_eq!(game.execute_ai_moves(&moves), moves.len());
    }
}
