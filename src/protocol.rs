//! Line-oriented text protocol for driving a [`Game`] from another process.
//!
//! The framing follows the Go Text Protocol: each request is one line with an
//! optional numeric id, each response starts with `=` (success) or `?`
//! (failure), echoes the id, and ends with a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `new_game` - Reset to the opening position
//! - `roll [d1 d2]` - Roll the dice, or set them to the given values
//! - `dice` - Show the unused die values
//! - `endpoints <from>` - Points reachable from `from` (`0` or `bar` for the bar)
//! - `move <from> <to>` - Move a checker (`bar` and `off` are accepted)
//! - `bearoff <from>` - Bear a checker off
//! - `can_bear_off [from]` - Bear-off eligibility
//! - `end_turn` - Pass play to the other side
//! - `hint` - Show the agent's move sequence without playing it
//!   (`(none)` for a side that is not computer-controlled)
//! - `genmove` - Let the agent play the whole turn for a computer-controlled side,
//!   rolling first if the dice have not been thrown
//! - `state` - Side to move, turn state and winner
//! - `showboard` - Draw the board
//! - `pips` - Pip counts for both sides
//!
//! ## Example
//!
//! ```ignore
//! use backgammon_engine::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use crate::board::Color;
use crate::constants::{BAR, OFF};
use crate::game::{Game, GameError, SideConfig, TurnState};
use crate::search::format_moves;

/// The list of known protocol commands.
const KNOWN_COMMANDS: &[&str] = &[
    "bearoff",
    "can_bear_off",
    "dice",
    "end_turn",
    "endpoints",
    "genmove",
    "hint",
    "known_command",
    "list_commands",
    "move",
    "name",
    "new_game",
    "pips",
    "protocol_version",
    "quit",
    "roll",
    "showboard",
    "state",
    "version",
];

pub struct ProtocolEngine {
    game: Game,
    sides: [SideConfig; 2],
    seed: Option<u64>,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    pub fn new() -> Self {
        Self::with_sides(SideConfig::default(), SideConfig::default(), None)
    }

    /// Engine whose `hint`/`genmove` use the given per-side settings.
    pub fn with_sides(white: SideConfig, black: SideConfig, seed: Option<u64>) -> Self {
        let sides = [white, black];
        let game = Self::fresh_game(&sides, seed);
        Self { game, sides, seed }
    }

    fn fresh_game(sides: &[SideConfig; 2], seed: Option<u64>) -> Game {
        let mut game = match seed {
            Some(seed) => Game::with_seed(seed),
            None => Game::new(),
        };
        game.set_side(Color::White, sides[0].clone());
        game.set_side(Color::Black, sides[1].clone());
        game
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop on stdin/stdout until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary reader and writer.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Parse a point argument. `bar` maps to 0 and `off` to -1.
    fn parse_point(arg: &str) -> Option<i32> {
        match arg.to_lowercase().as_str() {
            "bar" => Some(BAR),
            "off" => Some(OFF),
            other => other.parse::<i32>().ok(),
        }
    }

    fn format_points(points: &[i32]) -> String {
        points
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn format_dice(&self) -> String {
        self.game
            .dice_values()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, "backgammon-engine".to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "1".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "new_game" => {
                self.game = Self::fresh_game(&self.sides, self.seed);
                (true, String::new())
            }

            "roll" => {
                let result = match args {
                    [] => self.game.roll_dice(),
                    [d1, d2] => match (d1.parse::<u8>(), d2.parse::<u8>()) {
                        (Ok(d1), Ok(d2)) if (1..=6).contains(&d1) && (1..=6).contains(&d2) => {
                            self.game.roll_dice_with(d1, d2)
                        }
                        _ => return (false, "invalid dice".to_string()),
                    },
                    _ => return (false, "expected zero or two dice".to_string()),
                };
                match result {
                    Ok(()) => (true, self.format_dice()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "dice" => (true, self.format_dice()),

            "endpoints" => {
                let Some(from) = args.first().and_then(|a| Self::parse_point(a)) else {
                    return (false, "missing or invalid point".to_string());
                };
                (true, Self::format_points(&self.game.get_available_end_points(from)))
            }

            "move" => {
                let (Some(from), Some(to)) = (
                    args.first().and_then(|a| Self::parse_point(a)),
                    args.get(1).and_then(|a| Self::parse_point(a)),
                ) else {
                    return (false, "missing or invalid points".to_string());
                };
                if self.game.make_move(from, to) {
                    (true, self.format_dice())
                } else {
                    (false, "illegal move".to_string())
                }
            }

            "bearoff" => {
                let Some(from) = args.first().and_then(|a| Self::parse_point(a)) else {
                    return (false, "missing or invalid point".to_string());
                };
                if self.game.bear_off_checker(from) {
                    (true, self.format_dice())
                } else {
                    (false, "cannot bear off".to_string())
                }
            }

            "can_bear_off" => match args.first() {
                None => (true, self.game.can_bear_off().to_string()),
                Some(arg) => match Self::parse_point(arg) {
                    Some(index) => (true, self.game.can_bear_off_from_index(index).to_string()),
                    None => (false, "invalid point".to_string()),
                },
            },

            "end_turn" => {
                self.game.end_turn();
                (true, String::new())
            }

            "hint" => {
                let moves = self.game.get_best_move_for_current_player();
                (true, format_moves(&moves))
            }

            "genmove" => {
                if self.game.is_game_over() {
                    return (false, "game is over".to_string());
                }
                let color = self.game.current_color();
                if !self.game.side(color).ai {
                    return (false, GameError::NotComputerSide(color).to_string());
                }
                if self.game.state() == TurnState::RollingDice {
                    if let Err(e) = self.game.roll_dice() {
                        return (false, e.to_string());
                    }
                }
                let moves = self.game.get_best_move_for_current_player();
                let applied = self.game.execute_ai_moves(&moves);
                self.game.end_turn();
                (true, format_moves(&moves[..applied]))
            }

            "state" => {
                let winner = self
                    .game
                    .winner()
                    .map(|c| format!(" winner {c}"))
                    .unwrap_or_default();
                (
                    true,
                    format!("{} {}{winner}", self.game.current_color(), self.game.state()),
                )
            }

            "showboard" => (true, format!("\n{}", self.game.board())),

            "pips" => {
                let board = self.game.board();
                (
                    true,
                    format!(
                        "White {} Black {}",
                        board.pip_count(Color::White),
                        board.pip_count(Color::Black)
                    ),
                )
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ProtocolEngine {
        ProtocolEngine::with_sides(SideConfig::default(), SideConfig::default(), Some(9))
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_known_command() {
        let mut engine = engine();
        assert_eq!(engine.execute("known_command", &["roll"]), (true, "true".to_string()));
        assert_eq!(engine.execute("known_command", &["resign"]), (true, "false".to_string()));
    }

    #[test]
    fn test_roll_and_move() {
        let mut engine = engine();
        assert_eq!(engine.execute("roll", &["3", "1"]), (true, "3 1".to_string()));
        let (ok, _) = engine.execute("roll", &[]);
        assert!(!ok, "second roll in the same turn must fail");
        assert_eq!(engine.execute("endpoints", &["17"]), (true, "20 18".to_string()));
        assert_eq!(engine.execute("move", &["17", "20"]), (true, "1".to_string()));
        assert!(!engine.execute("move", &["17", "20"]).0);
    }

    #[test]
    fn test_invalid_dice_rejected() {
        let mut engine = engine();
        assert!(!engine.execute("roll", &["0", "7"]).0);
        assert!(!engine.execute("roll", &["3"]).0);
    }

    #[test]
    fn test_genmove_passes_turn() {
        let mut engine = ProtocolEngine::with_sides(
            SideConfig::ai("", 0),
            SideConfig::ai("", 0),
            Some(4),
        );
        engine.execute("roll", &["6", "5"]);
        let (ok, moves) = engine.execute("genmove", &[]);
        assert!(ok);
        assert_ne!(moves, "(none)");
        assert_eq!(engine.execute("state", &[]), (true, "Black rolling".to_string()));
    }

    #[test]
    fn test_genmove_refuses_human_side() {
        let mut engine = engine();
        assert_eq!(
            engine.execute("genmove", &[]),
            (false, "White is not computer-controlled".to_string())
        );
        assert_eq!(engine.execute("state", &[]), (true, "White rolling".to_string()));
        engine.execute("roll", &["3", "1"]);
        assert_eq!(engine.execute("hint", &[]), (true, "(none)".to_string()));
    }

    #[test]
    fn test_serve_formats_responses() {
        let mut engine = engine();
        let input = "1 name\n# comment\n\npips\nquit\nname\n";
        let mut out = Vec::new();
        engine.serve(input.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "=1 backgammon-engine\n\n= White 167 Black 167\n\n= \n\n"
        );
    }
}
