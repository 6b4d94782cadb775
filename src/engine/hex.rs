use std::ops;
use strum::{EnumIter, IntoEnumIterator};

/// An axial hex coordinate. The board is conceptually unbounded: there is no
/// notion of an out-of-range coordinate, only occupied vs. empty cells.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Ord, PartialOrd, Default)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    pub fn new(q: i32, r: i32) -> Hex {
        Hex { q, r }
    }

    /// The implied third cube coordinate; always `q + r + s == 0`.
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }
}

impl ops::Add<Hex> for Hex {
    type Output = Hex;

    fn add(self, rhs: Hex) -> Self::Output {
        Hex {
            q: self.q + rhs.q,
            r: self.r + rhs.r,
        }
    }
}

impl ops::Sub<Hex> for Hex {
    type Output = Hex;
    fn sub(self, rhs: Hex) -> Self::Output {
        Hex {
            q: self.q - rhs.q,
            r: self.r - rhs.r,
        }
    }
}

impl ops::Add<&Hex> for &Hex {
    type Output = Hex;

    fn add(self, rhs: &Hex) -> Self::Output {
        *self + *rhs
    }
}

impl ops::Sub<&Hex> for &Hex {
    type Output = Hex;

    fn sub(self, rhs: &Hex) -> Self::Output {
        *self - *rhs
    }
}

/// The six directions, in the fixed cyclic order the slide gate depends on:
/// each successive direction is the previous one rotated 60 degrees.
/// Flank lookups in [`crate::engine::rules`] rely on this exact ordering,
/// not just the set of vectors.
#[derive(PartialEq, Eq, Hash, Debug, EnumIter, Clone, Copy)]
pub enum Direction {
    Right,
    UpRight,
    UpLeft,
    Left,
    DownLeft,
    DownRight,
}

impl Direction {
    pub fn vector(&self) -> Hex {
        match *self {
            Direction::Right => Hex { q: 1, r: 0 },
            Direction::UpRight => Hex { q: 1, r: -1 },
            Direction::UpLeft => Hex { q: 0, r: -1 },
            Direction::Left => Hex { q: -1, r: 0 },
            Direction::DownLeft => Hex { q: -1, r: 1 },
            Direction::DownRight => Hex { q: 0, r: 1 },
        }
    }

    pub const ALL: [Direction; 6] = [
        Direction::Right,
        Direction::UpRight,
        Direction::UpLeft,
        Direction::Left,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// The direction found by walking `steps` positions around the cycle
    /// (negative steps walk backwards). Used by the slide gate to find the
    /// two cells flanking a shared edge.
    pub fn rotated(&self, steps: i32) -> Direction {
        let idx = Direction::ALL.iter().position(|d| d == self).unwrap() as i32;
        let len = Direction::ALL.len() as i32;
        let new_idx = ((idx + steps) % len + len) % len;
        Direction::ALL[new_idx as usize]
    }

    pub fn from_vector(vector: Hex) -> Option<Direction> {
        Direction::iter().find(|d| d.vector() == vector)
    }
}

/// Straight-line distance between two hexes (cube-coordinate Chebyshev
/// distance, equivalent to half the sum of absolute cube-coordinate deltas).
pub fn hex_distance(lhs: Hex, rhs: Hex) -> i32 {
    let vec = lhs - rhs;
    (vec.q.abs() + vec.r.abs() + vec.s().abs()) / 2
}

pub fn neighbors(hex: Hex) -> impl Iterator<Item = Hex> {
    Direction::iter().map(move |d| neighbor(hex, d))
}

pub fn neighbor(hex: Hex, direction: Direction) -> Hex {
    hex + direction.vector()
}

pub fn is_adjacent(lhs: Hex, rhs: Hex) -> bool {
    hex_distance(lhs, rhs) == 1
}
