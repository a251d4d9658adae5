//! Move generation and unique-state exploration.
//!
//! [`generate_moves`] lists the atomic moves available for the unused dice.
//! [`generate_unique_states`] plays every ordering of the dice on cloned boards
//! and collapses the results by [`Board::state_key`], so a roll expands into
//! one child per distinct resulting position rather than one per move order.

use std::collections::{HashMap, HashSet};

use crate::board::{Board, Color, Move};
use crate::constants::{BAR, OFF};
use crate::rules::{
    bar_entry_die, bear_off_die, can_bear_off_from_index, entry_point, is_move_valid,
    is_valid_bar_move, point_move_die, target_point,
};

/// A distinct position reachable with one roll, with one move sequence that
/// reaches it.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub board: Board,
    pub key: String,
    pub moves: Vec<Move>,
}

fn push_unique(moves: &mut Vec<Move>, mv: Move) {
    if !moves.contains(&mv) {
        moves.push(mv);
    }
}

/// Every atomic legal move for `color` with the unused `dice`.
///
/// Checkers on the bar must re-enter before anything else moves, so a
/// non-empty bar yields only bar entries.
pub fn generate_moves(board: &Board, color: Color, dice: &[u8]) -> Vec<Move> {
    let mut moves = Vec::new();

    if board.bar_count(color) > 0 {
        for &die in dice {
            let to = entry_point(color, die);
            if is_valid_bar_move(board, color, to, die) {
                push_unique(&mut moves, Move::new(BAR, to));
            }
        }
        return moves;
    }

    for point in board.points().iter().filter(|p| p.owner() == Some(color)) {
        let from = point.index;
        for &die in dice {
            let to = target_point(color, from, die);
            if is_move_valid(board, color, from, to, die) {
                push_unique(&mut moves, Move::new(from, to));
            }
        }
        if can_bear_off_from_index(board, color, from, dice) {
            push_unique(&mut moves, Move::new(from, OFF));
        }
    }
    moves
}

/// The die value a legal move consumes, or `None` if no die allows it.
pub fn die_for_move(board: &Board, color: Color, mv: Move, dice: &[u8]) -> Option<u8> {
    if mv.is_bar_entry() {
        bar_entry_die(board, color, mv.to, dice)
    } else if mv.is_bear_off() {
        bear_off_die(board, color, mv.from, dice)
    } else {
        point_move_die(board, color, mv.from, mv.to, dice)
    }
}

/// Apply `mv` for `color` on `board` without checking dice.
///
/// Hits are resolved; a borne-off checker simply leaves the board. Returns
/// `false` and leaves the board untouched if there is no checker to move.
pub fn apply_move(board: &mut Board, color: Color, mv: Move) -> bool {
    let opponent = color.opponent();
    if mv.is_bar_entry() {
        match board.remove_from_bar(color) {
            Some(checker) => {
                board.land(color, opponent, mv.to, checker);
                true
            }
            None => false,
        }
    } else if mv.is_bear_off() {
        board.owner_at(mv.from) == Some(color) && board.lift(mv.from).is_some()
    } else {
        if board.owner_at(mv.from) != Some(color) {
            return false;
        }
        board.move_checker(color, opponent, mv.from, mv.to);
        true
    }
}

/// Apply `mv` to a copy of `board`, leaving the original untouched.
pub fn simulate_move(board: &Board, color: Color, mv: Move) -> Board {
    let mut next = board.clone();
    apply_move(&mut next, color, mv);
    next
}

/// Remove one occurrence of `value` from `dice`.
pub fn remove_die(dice: &[u8], value: u8) -> Vec<u8> {
    let mut rest = dice.to_vec();
    if let Some(i) = rest.iter().position(|&d| d == value) {
        rest.remove(i);
    }
    rest
}

struct Explorer {
    color: Color,
    /// Intermediate (position, remaining dice) pairs already expanded.
    seen: HashSet<String>,
    /// Position key -> index into `found`.
    index: HashMap<String, usize>,
    found: Vec<Candidate>,
    path: Vec<Move>,
}

impl Explorer {
    fn explore(&mut self, board: &Board, dice: &[u8]) {
        let moves = generate_moves(board, self.color, dice);
        if moves.is_empty() {
            if !self.path.is_empty() {
                self.record(board);
            }
            return;
        }

        for mv in moves {
            let Some(die) = die_for_move(board, self.color, mv, dice) else {
                continue;
            };
            let next = simulate_move(board, self.color, mv);
            let rest = remove_die(dice, die);

            let mut sorted = rest.clone();
            sorted.sort_unstable();
            let node_key = format!("{}#{:?}", next.state_key(), sorted);
            if !self.seen.insert(node_key) {
                continue;
            }

            self.path.push(mv);
            self.explore(&next, &rest);
            self.path.pop();
        }
    }

    fn record(&mut self, board: &Board) {
        let key = board.state_key();
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key.clone(), self.found.len());
        self.found.push(Candidate {
            board: board.clone(),
            key,
            moves: self.path.clone(),
        });
    }
}

/// Every distinct position `color` can reach by playing out `dice`.
///
/// Each candidate carries the move sequence that first reached it. Positions
/// are terminal: no further move is legal with the dice left at that point.
/// Returns an empty list when `color` has no legal move at all.
pub fn generate_unique_states(board: &Board, color: Color, dice: &[u8]) -> Vec<Candidate> {
    let mut explorer = Explorer {
        color,
        seen: HashSet::new(),
        index: HashMap::new(),
        found: Vec::new(),
        path: Vec::new(),
    };
    explorer.explore(board, dice);
    explorer.found
}

/// Dice list for a roll: two values, or four copies of a double.
pub fn roll_values(die1: u8, die2: u8) -> Vec<u8> {
    if die1 == die2 {
        vec![die1; 4]
    } else {
        vec![die1, die2]
    }
}
