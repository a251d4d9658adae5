//! Static evaluation: pip-count race plus optional positional factors.
//!
//! Each side's raw distance to bearing off is scaled by the enabled factors,
//! computed from that side's own checker layout, and the two adjusted
//! distances are differenced. Higher scores are better for the evaluating
//! color.
//!
//! Factors are chosen with a compact code string, one character per factor:
//!
//! | Code | Factor |
//! |------|--------|
//! | `0`  | [`Factor::BlotExposure`] |
//! | `1`  | [`Factor::Prime`] |
//! | `2`  | [`Factor::HomeConcentration`] |
//! | `3`  | [`Factor::StackPenalty`] |
//! | `4`  | [`Factor::DeadCheckers`] |

use crate::board::{Board, Color};
use crate::constants::{
    BLOT_WEIGHT, DEAD_LIMIT, DEAD_WEIGHT, HOME_WEIGHT, PRIME_WEIGHT, STACK_LIMIT, STACK_WEIGHT,
};
use crate::rules::home_range;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Factor {
    /// Penalize single-checker points.
    BlotExposure,
    /// Reward consecutive made points.
    Prime,
    /// Reward checkers already home.
    HomeConcentration,
    /// Penalize more than five checkers on a point.
    StackPenalty,
    /// Penalize checkers buried on the two deepest home points.
    DeadCheckers,
}

impl Factor {
    pub fn from_code(code: char) -> Option<Factor> {
        match code {
            '0' => Some(Factor::BlotExposure),
            '1' => Some(Factor::Prime),
            '2' => Some(Factor::HomeConcentration),
            '3' => Some(Factor::StackPenalty),
            '4' => Some(Factor::DeadCheckers),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Factor::BlotExposure => '0',
            Factor::Prime => '1',
            Factor::HomeConcentration => '2',
            Factor::StackPenalty => '3',
            Factor::DeadCheckers => '4',
        }
    }

    /// Multiplier this factor applies to `color`'s distance on `board`.
    pub fn multiplier(self, board: &Board, color: Color) -> f64 {
        match self {
            Factor::BlotExposure => 1.0 + BLOT_WEIGHT * blot_count(board, color) as f64,
            Factor::Prime => {
                let run = longest_prime(board, color);
                if run >= 2 {
                    1.0 - PRIME_WEIGHT * (run - 1) as f64
                } else {
                    1.0
                }
            }
            Factor::HomeConcentration => 1.0 - HOME_WEIGHT * home_checkers(board, color) as f64,
            Factor::StackPenalty => 1.0 + STACK_WEIGHT * stacked_excess(board, color) as f64,
            Factor::DeadCheckers => 1.0 + DEAD_WEIGHT * dead_checkers(board, color) as f64,
        }
    }
}

/// Parse a factor-code string. Unknown characters are ignored and repeated
/// codes enable their factor once.
pub fn parse_factors(codes: &str) -> Vec<Factor> {
    let mut factors = Vec::new();
    for factor in codes.chars().filter_map(Factor::from_code) {
        if !factors.contains(&factor) {
            factors.push(factor);
        }
    }
    factors
}

fn own_points(board: &Board, color: Color) -> impl Iterator<Item = &crate::board::Point> {
    board
        .points()
        .iter()
        .filter(move |p| p.owner() == Some(color))
}

fn blot_count(board: &Board, color: Color) -> usize {
    own_points(board, color).filter(|p| p.count() == 1).count()
}

fn longest_prime(board: &Board, color: Color) -> usize {
    let mut best = 0;
    let mut run = 0;
    for point in board.points() {
        if point.owner() == Some(color) && point.count() >= 2 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

fn home_checkers(board: &Board, color: Color) -> usize {
    let home = home_range(color);
    own_points(board, color)
        .filter(|p| home.contains(&p.index))
        .map(|p| p.count())
        .sum()
}

fn stacked_excess(board: &Board, color: Color) -> usize {
    own_points(board, color)
        .map(|p| p.count().saturating_sub(STACK_LIMIT))
        .sum()
}

fn dead_checkers(board: &Board, color: Color) -> usize {
    let deepest = match color {
        Color::White => [24, 23],
        Color::Black => [1, 2],
    };
    let buried: usize = deepest
        .iter()
        .filter(|&&i| board.owner_at(i) == Some(color))
        .map(|&i| board.count_at(i))
        .sum();
    buried.saturating_sub(DEAD_LIMIT)
}

/// Position evaluator configured with an ordered set of factors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluator {
    factors: Vec<Factor>,
}

impl Evaluator {
    /// Pure pip-count evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factors(factors: Vec<Factor>) -> Self {
        Self { factors }
    }

    pub fn from_codes(codes: &str) -> Self {
        Self::with_factors(parse_factors(codes))
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Factor codes as a string, e.g. `"024"`.
    pub fn codes(&self) -> String {
        self.factors.iter().map(|f| f.code()).collect()
    }

    /// `color`'s pip distance scaled by every enabled factor.
    pub fn adjusted_distance(&self, board: &Board, color: Color) -> f64 {
        self.factors
            .iter()
            .fold(f64::from(board.pip_count(color)), |score, factor| {
                score * factor.multiplier(board, color)
            })
    }

    /// Score `board` for `color`: opponent distance minus own distance.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        let own = self.adjusted_distance(board, color);
        let opp = self.adjusted_distance(board, color.opponent());
        (opp - own) as i32
    }
}
