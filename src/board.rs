//! Board representation: points, bars and checker movement.
//!
//! The board stores 24 [`Point`] stacks and one bar per color. Checkers are
//! plain values, so cloning a board never aliases checkers between copies and
//! a simulated board can be mutated freely by the search.
//!
//! Bear-off is not tracked here: a checker that leaves the board simply stops
//! existing on it, and the owning [`Player`](crate::player::Player) counts it.

use std::fmt;

use crate::constants::{
    BAR, BAR_DISTANCE, CHECKERS_PER_SIDE, FIRST_POINT, LAST_POINT, NUM_POINTS, OFF, WHITE_START,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Index into per-color arrays (White = 0, Black = 1).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Single-letter tag used in board keys and drawings.
    pub fn tag(self) -> char {
        match self {
            Color::White => 'W',
            Color::Black => 'B',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A single checker. `position` is 0 on the bar, otherwise the point index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checker {
    pub color: Color,
    pub position: i32,
}

impl Checker {
    pub fn new(color: Color, position: i32) -> Self {
        Self { color, position }
    }
}

/// One of the 24 points. Checkers are pushed and popped LIFO.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub index: i32,
    checkers: Vec<Checker>,
}

impl Point {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            checkers: Vec::new(),
        }
    }

    pub fn checkers(&self) -> &[Checker] {
        &self.checkers
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Color of the checkers on this point, if any.
    #[inline]
    pub fn owner(&self) -> Option<Color> {
        self.checkers.first().map(|c| c.color)
    }

    /// True if the point holds exactly one checker not of `mover`'s color.
    #[inline]
    pub fn is_blot(&self, mover: Color) -> bool {
        self.checkers.len() == 1 && self.checkers[0].color != mover
    }

    pub fn push(&mut self, mut checker: Checker) {
        checker.position = self.index;
        self.checkers.push(checker);
    }

    pub fn pop(&mut self) -> Option<Checker> {
        self.checkers.pop()
    }
}

/// An atomic move. `from == BAR` re-enters from the bar, `to == OFF` bears off.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: i32,
    pub to: i32,
}

impl Move {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    pub fn is_bar_entry(&self) -> bool {
        self.from == BAR
    }

    pub fn is_bear_off(&self) -> bool {
        self.to == OFF
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = if self.from == BAR {
            "bar".to_string()
        } else {
            self.from.to_string()
        };
        let to = if self.to == OFF {
            "off".to_string()
        } else {
            self.to.to_string()
        };
        write!(f, "{from}/{to}")
    }
}

/// Returns true if `index` names one of the 24 board points.
#[inline]
pub fn on_board(index: i32) -> bool {
    (FIRST_POINT..=LAST_POINT).contains(&index)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    points: Vec<Point>,
    bars: [Vec<Checker>; 2],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            points: (FIRST_POINT..=LAST_POINT).map(Point::new).collect(),
            bars: [Vec::new(), Vec::new()],
        }
    }

    /// Create a board with the standard opening layout.
    pub fn starting() -> Self {
        let mut board = Self::new();
        for &(index, count) in &WHITE_START {
            board.place(Color::White, index, count);
            board.place(Color::Black, 25 - index, count);
        }
        board
    }

    /// Put `count` fresh checkers of `color` on point `index`.
    /// Out-of-range indices are ignored.
    pub fn place(&mut self, color: Color, index: i32, count: usize) {
        if let Some(point) = self.point_mut(index) {
            for _ in 0..count {
                point.push(Checker::new(color, index));
            }
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The point with the given 1-based index.
    pub fn point(&self, index: i32) -> Option<&Point> {
        if on_board(index) {
            Some(&self.points[(index - 1) as usize])
        } else {
            None
        }
    }

    fn point_mut(&mut self, index: i32) -> Option<&mut Point> {
        if on_board(index) {
            Some(&mut self.points[(index - 1) as usize])
        } else {
            None
        }
    }

    /// Number of checkers on point `index` (0 when out of range).
    #[inline]
    pub fn count_at(&self, index: i32) -> usize {
        self.point(index).map_or(0, Point::count)
    }

    /// Owner of point `index`, if occupied.
    #[inline]
    pub fn owner_at(&self, index: i32) -> Option<Color> {
        self.point(index).and_then(Point::owner)
    }

    pub fn bar(&self, color: Color) -> &[Checker] {
        &self.bars[color.index()]
    }

    #[inline]
    pub fn bar_count(&self, color: Color) -> usize {
        self.bars[color.index()].len()
    }

    pub fn add_to_bar(&mut self, mut checker: Checker) {
        checker.position = BAR;
        self.bars[checker.color.index()].push(checker);
    }

    pub fn remove_from_bar(&mut self, color: Color) -> Option<Checker> {
        self.bars[color.index()].pop()
    }

    /// Checkers of `color` on the board or the bar.
    pub fn checkers_in_play(&self, color: Color) -> usize {
        self.bar_count(color)
            + self
                .points
                .iter()
                .filter(|p| p.owner() == Some(color))
                .map(Point::count)
                .sum::<usize>()
    }

    /// Checkers of `color` no longer on the board or bar.
    pub fn borne_off(&self, color: Color) -> usize {
        CHECKERS_PER_SIDE.saturating_sub(self.checkers_in_play(color))
    }

    /// Move the top checker of `from` to `to`, hitting an opponent blot.
    ///
    /// A hit checker goes to `opponent`'s bar. Indices outside `1..=24` and
    /// empty source points make this a no-op.
    pub fn move_checker(&mut self, mover: Color, opponent: Color, from: i32, to: i32) {
        if !on_board(from) || !on_board(to) || self.count_at(from) == 0 {
            return;
        }
        let Some(checker) = self.point_mut(from).and_then(Point::pop) else {
            return;
        };
        self.land(mover, opponent, to, checker);
    }

    /// Put a checker on `to`, first sending an opponent blot there to the bar.
    pub(crate) fn land(&mut self, mover: Color, opponent: Color, to: i32, checker: Checker) {
        let hit = match self.point_mut(to) {
            Some(point) if point.is_blot(mover) => point.pop(),
            Some(_) => None,
            None => return,
        };
        if let Some(hit) = hit {
            debug_assert_eq!(hit.color, opponent);
            self.add_to_bar(hit);
        }
        if let Some(point) = self.point_mut(to) {
            point.push(checker);
        }
    }

    /// Remove the top checker of point `from`, as when bearing off.
    pub(crate) fn lift(&mut self, from: i32) -> Option<Checker> {
        self.point_mut(from).and_then(Point::pop)
    }

    /// Occupancy check for a point-to-point move, ignoring direction.
    ///
    /// True iff `from` is owned by `mover`, `to` is empty, owned by `mover`
    /// or a blot, and the distance equals `die`.
    pub fn is_move_valid(&self, mover: Color, from: i32, to: i32, die: u8) -> bool {
        let (Some(src), Some(dst)) = (self.point(from), self.point(to)) else {
            return false;
        };
        src.owner() == Some(mover)
            && (dst.owner().is_none() || dst.owner() == Some(mover) || dst.is_blot(mover))
            && (to - from).abs() == i32::from(die)
    }

    /// Total pip distance for `color`, counting bar checkers as 25 pips each.
    pub fn pip_count(&self, color: Color) -> i32 {
        let on_points: i32 = self
            .points
            .iter()
            .filter(|p| p.owner() == Some(color))
            .map(|p| distance_to_off(color, p.index) * p.count() as i32)
            .sum();
        on_points + BAR_DISTANCE * self.bar_count(color) as i32
    }

    /// Key identifying this position: `index:count:color` for each occupied
    /// point followed by both bar counts. Two boards with equal keys are
    /// indistinguishable to the rules.
    pub fn state_key(&self) -> String {
        let mut key = String::with_capacity(96);
        for point in &self.points {
            if let Some(owner) = point.owner() {
                key.push_str(&format!("{}:{}:{}|", point.index, point.count(), owner.tag()));
            }
        }
        key.push_str(&format!(
            "bar:{}:{}",
            self.bar_count(Color::White),
            self.bar_count(Color::Black)
        ));
        key
    }
}

/// Pips a checker of `color` on point `index` must travel to bear off.
#[inline]
pub fn distance_to_off(color: Color, index: i32) -> i32 {
    match color {
        Color::White => 25 - index,
        Color::Black => index,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |index: i32| match self.owner_at(index) {
            Some(color) => format!("{}{:<2}", color.tag(), self.count_at(index)),
            None => " . ".to_string(),
        };

        for index in 13..=24 {
            write!(f, "{index:>4}")?;
        }
        writeln!(f)?;
        for index in 13..=24 {
            write!(f, " {}", cell(index))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  bar: W{} B{}   off: W{} B{}",
            self.bar_count(Color::White),
            self.bar_count(Color::Black),
            self.borne_off(Color::White),
            self.borne_off(Color::Black)
        )?;
        for index in (1..=12).rev() {
            write!(f, " {}", cell(index))?;
        }
        writeln!(f)?;
        for index in (1..=12).rev() {
            write!(f, "{index:>4}")?;
        }
        writeln!(f)
    }
}
