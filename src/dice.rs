//! Two-die roller with double-usage counting.
//!
//! A normal roll grants each die value once. A double grants the same value
//! four times; each use decrements the remaining budget.

use crate::constants::{DIE_FACES, DOUBLE_USES};

#[derive(Clone, Debug)]
pub struct Dice {
    die1: u8,
    die2: u8,
    is_double: bool,
    double_used: usize,
    rng: fastrand::Rng,
}

impl Default for Dice {
    fn default() -> Self {
        Self::new()
    }
}

impl Dice {
    /// Create unrolled dice seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Create unrolled dice with a deterministic sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            die1: 0,
            die2: 0,
            is_double: false,
            double_used: 0,
            rng,
        }
    }

    /// Draw two independent values in `1..=6`.
    pub fn roll(&mut self) {
        let d1 = self.rng.u8(1..=DIE_FACES);
        let d2 = self.rng.u8(1..=DIE_FACES);
        self.set(d1, d2);
    }

    /// Force a specific roll. Values outside `1..=6` are stored as used.
    pub fn set(&mut self, die1: u8, die2: u8) {
        let clamp = |d: u8| if (1..=DIE_FACES).contains(&d) { d } else { 0 };
        self.die1 = clamp(die1);
        self.die2 = clamp(die2);
        self.is_double = self.die1 != 0 && self.die1 == self.die2;
        self.double_used = 0;
    }

    /// Mark every die as used.
    pub fn reset(&mut self) {
        self.die1 = 0;
        self.die2 = 0;
        self.is_double = false;
        self.double_used = 0;
    }

    pub fn die1(&self) -> u8 {
        self.die1
    }

    pub fn die2(&self) -> u8 {
        self.die2
    }

    pub fn is_double(&self) -> bool {
        self.is_double
    }

    /// Unused die values: the two dice, or the double value once per
    /// remaining use.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        let (first, second, repeat) = if self.is_double {
            (0, 0, DOUBLE_USES.saturating_sub(self.double_used))
        } else {
            (self.die1, self.die2, 0)
        };
        [first, second]
            .into_iter()
            .chain(std::iter::repeat_n(self.die1, repeat))
            .filter(|&d| d != 0)
    }

    /// Consume one occurrence of `value`. Unavailable values are ignored.
    pub fn use_die(&mut self, value: u8) {
        if value == 0 {
            return;
        }
        if self.is_double {
            if value == self.die1 && self.double_used < DOUBLE_USES {
                self.double_used += 1;
                if self.double_used == DOUBLE_USES {
                    self.die1 = 0;
                    self.die2 = 0;
                }
            }
        } else if self.die1 == value {
            self.die1 = 0;
        } else if self.die2 == value {
            self.die2 = 0;
        }
    }

    pub fn has_moves_left(&self) -> bool {
        self.values().next().is_some()
    }
}
