//! Fixed context tables for the bit-plane passes (ISO/IEC 15444-1, D.3).
//!
//! The zero coding label of an insignificant coefficient is kept up to date
//! incrementally: whenever a neighbour becomes significant, the label moves
//! to the entry of [`NEIGHBOR_UPDATES`] for the direction of that neighbour.
//! The sign of an entry tells whether the neighbour is visited later (`+`)
//! or earlier (`-`) in the stripe scan than the coefficient that just became
//! significant.

use super::image::SubbandOrientation;
use crate::constants::STRIPE_HEIGHT;

/// Subbands sharing a zero coding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum SubbandGroup {
    LowLowAndLowHigh = 0,
    HighLow = 1,
    HighHigh = 2,
}

impl From<SubbandOrientation> for SubbandGroup {
    fn from(orientation: SubbandOrientation) -> Self {
        match orientation {
            SubbandOrientation::LL | SubbandOrientation::LH => SubbandGroup::LowLowAndLowHigh,
            SubbandOrientation::HL => SubbandGroup::HighLow,
            SubbandOrientation::HH => SubbandGroup::HighHigh,
        }
    }
}

/// Position of a neighbour relative to the coefficient that became significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Direction {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
    UpLeft = 4,
    UpRight = 5,
    DownLeft = 6,
    DownRight = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// Column and row offsets of the neighbour.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }
}

/// New zero coding label of a neighbour, indexed by subband group, direction
/// and the neighbour's current label.
#[rustfmt::skip]
pub static NEIGHBOR_UPDATES: [[[i8; 9]; 8]; 3] = [
    // LL and LH
    [
        [-5, -6, -6, -7, -7, -8, -8, -8, -8],
        [ 5,  6,  6,  7,  7,  8,  8,  8,  8],
        [-3, -3, -3, -4, -4, -7, -7, -7, -8],
        [ 3,  3,  3,  4,  4,  7,  7,  7,  8],
        [-1, -2, -2, -3, -4, -6, -6, -7, -8],
        [ 1,  2,  2,  3,  4,  6,  6,  7,  8],
        [-1, -2, -2, -3, -4, -6, -6, -7, -8],
        [ 1,  2,  2,  3,  4,  6,  6,  7,  8],
    ],
    // HL
    [
        [-3, -3, -3, -4, -4, -7, -7, -7, -8],
        [ 3,  3,  3,  4,  4,  7,  7,  7,  8],
        [-5, -6, -6, -7, -7, -8, -8, -8, -8],
        [ 5,  6,  6,  7,  7,  8,  8,  8,  8],
        [-1, -2, -2, -3, -4, -6, -6, -7, -8],
        [ 1,  2,  2,  3,  4,  6,  6,  7,  8],
        [-1, -2, -2, -3, -4, -6, -6, -7, -8],
        [ 1,  2,  2,  3,  4,  6,  6,  7,  8],
    ],
    // HH
    [
        [-1, -2, -2, -4, -5, -5, -7, -7, -8],
        [ 1,  2,  2,  4,  5,  5,  7,  7,  8],
        [-1, -2, -2, -4, -5, -5, -7, -7, -8],
        [ 1,  2,  2,  4,  5,  5,  7,  7,  8],
        [-3, -4, -5, -6, -7, -7, -8, -8, -8],
        [ 3,  4,  5,  6,  7,  7,  8,  8,  8],
        [-3, -4, -5, -6, -7, -7, -8, -8, -8],
        [ 3,  4,  5,  6,  7,  7,  8,  8,  8],
    ],
];

/// Sign coding contexts (Table D.3), indexed by `[h + 1][v + 1]`. A negative
/// entry means the decoded bit is inverted.
#[rustfmt::skip]
pub static SIGN_CONTEXTS: [[i8; 3]; 3] = [
    [-14, -13, -12],
    [-11,  10,  11],
    [ 12,  13,  14],
];

/// Label entry for a neighbour of the coefficient at row `y`, with the
/// scan-order sign corrected for diagonal neighbours in another stripe.
#[inline]
pub fn neighbor_update(group: SubbandGroup, direction: Direction, y: usize, old_label: u8) -> i8 {
    let entry = NEIGHBOR_UPDATES[group as usize][direction as usize][old_label as usize];
    let crosses_stripe = match direction {
        Direction::UpRight => y % STRIPE_HEIGHT == 0,
        Direction::DownLeft => (y + 1) % STRIPE_HEIGHT == 0,
        _ => false,
    };
    if crosses_stripe { -entry } else { entry }
}

/// Context value a neighbour ends up with. An already tagged label keeps its
/// visitation tag; an untouched one takes the scan-order sign, inverted
/// during cleanup.
#[inline]
pub fn updated_context(old: i8, entry: i8, in_cleanup: bool) -> i8 {
    match old {
        0 if in_cleanup => -entry,
        0 => entry,
        o if o > 0 => entry.abs(),
        _ => -entry.abs(),
    }
}

/// Sign coding context for the horizontal and vertical contributions, each in `-1..=1`.
#[inline]
pub fn sign_context(h: i32, v: i32) -> i8 {
    SIGN_CONTEXTS[(h.clamp(-1, 1) + 1) as usize][(v.clamp(-1, 1) + 1) as usize]
}
