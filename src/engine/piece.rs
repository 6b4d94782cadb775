use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum::{Display as StrumDisplay, EnumCount, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// The five piece kinds this engine plays with. Tournament expansion pieces
/// (Ladybug, Mosquito, Pillbug) are out of scope.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Ord, PartialOrd, EnumIter, EnumCount)]
pub enum Bug {
    Ant,
    Beetle,
    Grasshopper,
    Queen,
    Spider,
}

impl Bug {
    /// The starting reserve count for a color: {Q:1, A:3, G:3, B:2, S:2}.
    pub fn reserve_count(&self) -> u8 {
        match self {
            Bug::Queen => 1,
            Bug::Ant => 3,
            Bug::Grasshopper => 3,
            Bug::Beetle => 2,
            Bug::Spider => 2,
        }
    }
}

impl Display for Bug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Bug::Beetle => "B",
                Bug::Queen => "Q",
                Bug::Grasshopper => "G",
                Bug::Ant => "A",
                Bug::Spider => "S",
            }
        )
    }
}

impl FromStr for Bug {
    type Err = BugParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "B" => Ok(Bug::Beetle),
            "Q" => Ok(Bug::Queen),
            "G" => Ok(Bug::Grasshopper),
            "A" => Ok(Bug::Ant),
            "S" => Ok(Bug::Spider),
            _ => Err(BugParseError::InvalidBugCharacter(s.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BugParseError {
    #[error("invalid bug character: {0}")]
    InvalidBugCharacter(String),
}

#[derive(
    Debug, Clone, Eq, PartialEq, Copy, Ord, PartialOrd, Hash, Default, StrumDisplay, EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    Black,
    #[default]
    White,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// A single physical piece. `instance` is the 1-indexed placement order
/// within this color+kind, assigned the moment the piece leaves its reserve;
/// it never changes afterwards and exists only to support stable external
/// notation (e.g. "wA1").
#[derive(Debug, Clone, Eq, PartialEq, Copy, Ord, PartialOrd, Hash)]
pub struct Piece {
    pub bug: Bug,
    pub color: Color,
    pub instance: u8,
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.color == Color::White {
            write!(f, "{}", self.bug)
        } else {
            write!(f, "{}", self.bug.to_string().to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        assert_eq!(Color::White.opposite().opposite(), Color::White);
        assert_eq!(Color::Black, Color::White.opposite());
    }

    #[test]
    fn reserve_counts_match_standard_hive() {
        let total: u8 = Bug::iter().map(|b| b.reserve_count()).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn parses_and_displays_round_trip() {
        for bug in [Bug::Ant, Bug::Beetle, Bug::Grasshopper, Bug::Queen, Bug::Spider] {
            let s = bug.to_string();
            assert_eq!(s.parse::<Bug>().unwrap(), bug);
        }
    }
}
