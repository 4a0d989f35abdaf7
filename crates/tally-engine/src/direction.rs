//! Vote direction and the vote delta calculator.
//!
//! A vote is a judgment in one of two directions. Changing a judgment moves
//! the post's aggregate count by the signed difference between the old and
//! new contribution:
//!
//! | previous | next | delta |
//! |----------|------|-------|
//! | none     | Up   | +1    |
//! | none     | Down | -1    |
//! | Up       | Up   | 0     |
//! | Down     | Down | 0     |
//! | Up       | Down | -2    |
//! | Down     | Up   | +2    |
//!
//! The same delta is used to apply an optimistic change and, subtracted, to
//! undo it.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a single judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Upvote
    Up,
    /// Downvote
    Down,
}

impl Direction {
    /// Contribution of this direction to a post's aggregate count.
    pub const fn weight(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }

    /// The other direction.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Wire name ("up" / "down").
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction string is neither "up" nor "down".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid vote direction: {0:?}")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Signed change to a post's count when a voter moves from `previous` to `next`.
///
/// # Examples
///
/// ```
/// use tally_engine::{vote_delta, Direction};
///
/// assert_eq!(vote_delta(None, Direction::Up), 1);
/// assert_eq!(vote_delta(Some(Direction::Up), Direction::Down), -2);
/// assert_eq!(vote_delta(Some(Direction::Down), Direction::Down), 0);
/// ```
pub const fn vote_delta(previous: Option<Direction>, next: Direction) -> i64 {
    match previous {
        None => next.weight(),
        Some(prev) => next.weight() - prev.weight(),
    }
}
