//! Constants for board geometry, dice outcomes, search and evaluation.
//!
//! Point indices follow the usual backgammon numbering: `1..=24` are board
//! points, [`BAR`] is the bar and [`OFF`] is the bear-off tray. White moves
//! from point 1 towards point 24, Black from point 24 towards point 1.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of points on the board.
pub const NUM_POINTS: usize = 24;

/// Lowest valid point index.
pub const FIRST_POINT: i32 = 1;

/// Highest valid point index.
pub const LAST_POINT: i32 = NUM_POINTS as i32;

/// Source index used for re-entering a checker from the bar.
pub const BAR: i32 = 0;

/// Destination index used for bearing a checker off.
pub const OFF: i32 = -1;

/// Checkers owned by each side at the start of a game.
pub const CHECKERS_PER_SIDE: usize = 15;

/// Total checkers in play across both colors.
pub const TOTAL_CHECKERS: usize = 2 * CHECKERS_PER_SIDE;

/// Pip distance charged for a checker sitting on the bar.
pub const BAR_DISTANCE: i32 = 25;

/// Standard opening layout for White as `(point, count)` pairs.
/// Black uses the mirror image (`25 - point`).
pub const WHITE_START: [(i32, usize); 4] = [(1, 2), (12, 5), (17, 3), (19, 5)];

// =============================================================================
// Dice
// =============================================================================

/// Number of faces on a die.
pub const DIE_FACES: u8 = 6;

/// Number of uses granted by a double.
pub const DOUBLE_USES: usize = 4;

/// Number of equally likely physical rolls of two dice.
pub const PHYSICAL_ROLLS: i64 = 36;

/// The 21 distinct dice outcomes with their frequency out of 36 rolls.
/// Doubles occur once, every other pair twice.
#[rustfmt::skip]
pub const DICE_OUTCOMES: [(u8, u8, i64); 21] = [
    (1, 1, 1), (2, 2, 1), (3, 3, 1), (4, 4, 1), (5, 5, 1), (6, 6, 1),
    (1, 2, 2), (1, 3, 2), (1, 4, 2), (1, 5, 2), (1, 6, 2),
    (2, 3, 2), (2, 4, 2), (2, 5, 2), (2, 6, 2),
    (3, 4, 2), (3, 5, 2), (3, 6, 2),
    (4, 5, 2), (4, 6, 2),
    (5, 6, 2),
];

// =============================================================================
// Search Parameters
// =============================================================================

/// Default search depth (plies of opponent reply considered after our move).
pub const DEFAULT_DEPTH: u32 = 1;

/// Score adjustment applied when the side to move has no legal move.
pub const STUCK_PENALTY: i32 = 10;

// =============================================================================
// Evaluation Weights
// =============================================================================

/// Distance multiplier per own blot.
pub const BLOT_WEIGHT: f64 = 0.02;

/// Distance reduction per point of prime length beyond the first.
pub const PRIME_WEIGHT: f64 = 0.05;

/// Distance reduction per checker already in the home quadrant.
pub const HOME_WEIGHT: f64 = 0.01;

/// Distance multiplier per checker stacked beyond [`STACK_LIMIT`].
pub const STACK_WEIGHT: f64 = 0.02;

/// Checkers on one point before the stack penalty applies.
pub const STACK_LIMIT: usize = 5;

/// Distance multiplier per dead checker beyond [`DEAD_LIMIT`].
pub const DEAD_WEIGHT: f64 = 0.03;

/// Checkers tolerated on the two deepest home points.
pub const DEAD_LIMIT: usize = 3;
