//! A plain textual serialization for moves, used for logging and test
//! fixtures. This is not the UHP tournament notation; it is a simpler
//! format sufficient for round-tripping in tests.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::engine::hex::Hex;
use crate::engine::piece::Bug;
use crate::engine::state::Move;
use crate::error::NotationParseError;

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Placement { bug, hex } => write!(f, "{bug}@{},{}", hex.q, hex.r),
            Move::Movement { from, to } => write!(f, "{},{}->{},{}", from.q, from.r, to.q, to.r),
            Move::Pass => write!(f, "pass"),
        }
    }
}

impl FromStr for Move {
    type Err = NotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "pass" {
            return Ok(Move::Pass);
        }

        if let Some((bug_str, hex_str)) = s.split_once('@') {
            let bug: Bug = bug_str
                .parse()
                .map_err(|_| NotationParseError::UnknownBug(bug_str.chars().next().unwrap_or('?')))?;
            let hex = parse_hex(hex_str)?;
            return Ok(Move::Placement { bug, hex });
        }

        if let Some((from_str, to_str)) = s.split_once("->") {
            let from = parse_hex(from_str)?;
            let to = parse_hex(to_str)?;
            return Ok(Move::Movement { from, to });
        }

        Err(NotationParseError::MalformedMove(s.to_string()))
    }
}

fn parse_hex(s: &str) -> Result<Hex, NotationParseError> {
    let (q, r) = s
        .split_once(',')
        .ok_or_else(|| NotationParseError::MalformedCoordinate(s.to_string()))?;
    let q: i32 = q
        .trim()
        .parse()
        .map_err(|_| NotationParseError::MalformedCoordinate(s.to_string()))?;
    let r: i32 = r
        .trim()
        .parse()
        .map_err(|_| NotationParseError::MalformedCoordinate(s.to_string()))?;
    Ok(Hex::new(q, r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_round_trips() {
        let mv = Move::Placement { bug: Bug::Queen, hex: Hex::new(-1, 2) };
        let parsed: Move = mv.to_string().parse().unwrap();
        assert_eq!(mv, parsed);
    }

    #[test]
    fn movement_round_trips() {
        let mv = Move::Movement { from: Hex::new(0, 0), to: Hex::new(1, -1) };
        let parsed: Move = mv.to_string().parse().unwrap();
        assert_eq!(mv, parsed);
    }

    #[test]
    fn pass_round_trips() {
        let parsed: Move = "pass".parse().unwrap();
        assert_eq!(parsed, Move::Pass);
    }

    #[test]
    fn malformed_notation_is_rejected() {
        assert!("??".parse::<Move>().is_err());
    }
}
