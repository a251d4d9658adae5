//! Backgammon-Engine: a two-player backgammon rules engine with an
//! expectiminimax search agent.
//!
//! The engine validates and applies moves for both colors, runs the turn
//! cycle, and lets a computer player choose a full move sequence by searching
//! over the 21 distinct dice outcomes.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, dice table and evaluation weights
//! - [`board`] - Points, bars, checkers and the canonical position key
//! - [`player`] - Per-color borne-off bookkeeping
//! - [`dice`] - Seedable dice with per-roll usage tracking
//! - [`rules`] - Move legality, bar entry and bearing off
//! - [`movegen`] - Atomic moves and unique resulting positions per roll
//! - [`eval`] - Pip-count evaluation with optional positional factors
//! - [`search`] - Expectiminimax agent
//! - [`game`] - Turn state machine
//! - [`protocol`] - Line-oriented text protocol
//!
//! ## Example
//!
//! ```
//! use backgammon_engine::board::Color;
//! use backgammon_engine::game::{Game, SideConfig};
//!
//! let mut game = Game::with_seed(7);
//! game.set_side(Color::White, SideConfig::ai("02", 0));
//! game.set_side(Color::Black, SideConfig::ai("", 0));
//!
//! // Let the agents play a few turns
//! for _ in 0..4 {
//!     let moves = game.play_ai_turn().unwrap();
//!     println!("played {} moves", moves.len());
//! }
//! assert!(game.is_consistent());
//! ```

pub mod board;
pub mod constants;
pub mod dice;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod player;
pub mod protocol;
pub mod rules;
pub mod search;
