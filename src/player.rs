//! Per-color player state.
//!
//! A player's active checkers are exactly the checkers of its color on the
//! board and on its bar, so the board is the single source of truth for them.
//! The player only records how many checkers it has borne off.

use crate::board::{Board, Checker, Color};
use crate::constants::CHECKERS_PER_SIDE;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub color: Color,
    borne_off: usize,
}

impl Player {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            borne_off: 0,
        }
    }

    /// Record that one checker left play. Saturates at 15.
    pub fn bear_off(&mut self) {
        if self.borne_off < CHECKERS_PER_SIDE {
            self.borne_off += 1;
        }
    }

    pub fn borne_off(&self) -> usize {
        self.borne_off
    }

    /// Checkers still on the board or bar.
    pub fn active_count(&self) -> usize {
        CHECKERS_PER_SIDE - self.borne_off
    }

    pub fn has_won(&self) -> bool {
        self.active_count() == 0
    }

    /// The active checkers of this player on `board`, bar checkers first.
    pub fn active_checkers<'a>(&self, board: &'a Board) -> impl Iterator<Item = Checker> + 'a {
        let color = self.color;
        board.bar(color).iter().copied().chain(
            board
                .points()
                .iter()
                .filter(move |p| p.owner() == Some(color))
                .flat_map(|p| p.checkers().iter().copied()),
        )
    }

    /// True if every active checker lies on one of `indices`.
    pub fn all_checkers_in(&self, board: &Board, indices: std::ops::RangeInclusive<i32>) -> bool {
        self.active_checkers(board)
            .all(|c| indices.contains(&c.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_has_fifteen_active() {
        let player = Player::new(Color::White);
        assert_eq!(player.active_count(), 15);
        assert_eq!(player.borne_off(), 0);
        assert!(!player.has_won());
    }

    #[test]
    fn test_bear_off_saturates() {
        let mut player = Player::new(Color::Black);
        for _ in 0..20 {
            player.bear_off();
        }
        assert_eq!(player.borne_off(), 15);
        assert!(player.has_won());
    }

    #[test]
    fn test_active_checkers_reads_board() {
        let board = Board::starting();
        let white = Player::new(Color::White);
        assert_eq!(white.active_checkers(&board).count(), 15);
        assert!(white.active_checkers(&board).all(|c| c.color == Color::White));
        assert!(!white.all_checkers_in(&board, 19..=24));
    }
}
