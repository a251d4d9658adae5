//! Rules engine: move legality, bar re-entry and bear-off eligibility.
//!
//! Every function here is a pure query over a [`Board`], the color to move and
//! the unused die values. Nothing is mutated; illegal inputs answer `false` or
//! `None`.

use std::ops::RangeInclusive;

use crate::board::{Board, Color, distance_to_off, on_board};
use crate::constants::BAR;

/// The six points nearest `color`'s bear-off edge.
pub fn home_range(color: Color) -> RangeInclusive<i32> {
    match color {
        Color::White => 19..=24,
        Color::Black => 1..=6,
    }
}

/// The opponent's home quadrant, where `color` re-enters from the bar.
pub fn entry_range(color: Color) -> RangeInclusive<i32> {
    home_range(color.opponent())
}

/// Point where a checker of `color` enters from the bar with `die`.
#[inline]
pub fn entry_point(color: Color, die: u8) -> i32 {
    match color {
        Color::White => i32::from(die),
        Color::Black => 25 - i32::from(die),
    }
}

/// Destination reached by moving `die` pips from `from` in `color`'s direction.
#[inline]
pub fn target_point(color: Color, from: i32, die: u8) -> i32 {
    match color {
        Color::White => from + i32::from(die),
        Color::Black => from - i32::from(die),
    }
}

/// White moves to higher indices, Black to lower ones.
#[inline]
pub fn is_forward(color: Color, from: i32, to: i32) -> bool {
    match color {
        Color::White => to > from,
        Color::Black => to < from,
    }
}

/// Re-entry from the bar onto `to` using `die`.
///
/// The destination must be in the opponent's home quadrant, correspond to the
/// die value, and not be held by two or more opponent checkers.
pub fn is_valid_bar_move(board: &Board, color: Color, to: i32, die: u8) -> bool {
    if !entry_range(color).contains(&to) || entry_point(color, die) != to {
        return false;
    }
    let opponent_held =
        board.owner_at(to) == Some(color.opponent()) && board.count_at(to) >= 2;
    !opponent_held
}

/// Full legality of a single point-to-point or bar move for one die.
///
/// While `color` has checkers on the bar only re-entries are legal.
pub fn is_move_valid(board: &Board, color: Color, from: i32, to: i32, die: u8) -> bool {
    if board.bar_count(color) > 0 {
        return from == BAR && is_valid_bar_move(board, color, to, die);
    }
    if from == BAR || !is_forward(color, from, to) {
        return false;
    }
    board.is_move_valid(color, from, to, die)
}

/// True if every checker of `color` is home and a die value remains.
pub fn can_bear_off(board: &Board, color: Color, dice: &[u8]) -> bool {
    if board.bar_count(color) > 0 || !dice.iter().any(|&d| d != 0) {
        return false;
    }
    let home = home_range(color);
    board
        .points()
        .iter()
        .filter(|p| p.owner() == Some(color))
        .all(|p| home.contains(&p.index))
}

/// True if no checker of `color` sits farther from home than `index`.
fn is_farthest_occupied(board: &Board, color: Color, index: i32) -> bool {
    let own = distance_to_off(color, index);
    board
        .points()
        .iter()
        .filter(|p| p.owner() == Some(color))
        .all(|p| distance_to_off(color, p.index) <= own)
}

/// The die that bears a checker of `color` off from `index`.
///
/// Prefers an exact match; otherwise the smallest larger die, but only when
/// `index` is the farthest occupied point. Returns `None` when bearing off
/// from `index` is not allowed.
pub fn bear_off_die(board: &Board, color: Color, index: i32, dice: &[u8]) -> Option<u8> {
    if !can_bear_off(board, color, dice)
        || !home_range(color).contains(&index)
        || board.owner_at(index) != Some(color)
    {
        return None;
    }
    let needed = distance_to_off(color, index);
    if let Some(&exact) = dice.iter().find(|&&d| i32::from(d) == needed) {
        return Some(exact);
    }
    if !is_farthest_occupied(board, color, index) {
        return None;
    }
    dice.iter()
        .copied()
        .filter(|&d| i32::from(d) > needed)
        .min()
}

/// True if a checker of `color` can be borne off from `index`.
pub fn can_bear_off_from_index(board: &Board, color: Color, index: i32, dice: &[u8]) -> bool {
    bear_off_die(board, color, index, dice).is_some()
}

/// The die consumed by re-entering on `to`, if any die allows it.
pub fn bar_entry_die(board: &Board, color: Color, to: i32, dice: &[u8]) -> Option<u8> {
    dice.iter()
        .copied()
        .find(|&d| is_valid_bar_move(board, color, to, d))
}

/// The die consumed by a point-to-point move, if legal.
pub fn point_move_die(board: &Board, color: Color, from: i32, to: i32, dice: &[u8]) -> Option<u8> {
    if !on_board(from) || !on_board(to) {
        return None;
    }
    dice.iter()
        .copied()
        .find(|&d| is_move_valid(board, color, from, to, d))
}
