//! Streak tracker: consecutive same-direction votes.
//!
//! The popup fires when the count hits the threshold exactly, so one run
//! celebrates once. Streaks are process-local and reset on cooldown expiry.

use crate::direction::Direction;

/// Default popup threshold.
pub const STREAK_THRESHOLD: u32 = 10;

/// Current run of same-direction votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    /// Direction of the run
    pub direction: Direction,
    /// Length of the run
    pub count: u32,
}

impl Default for Streak {
    fn default() -> Self {
        Self {
            direction: Direction::Up,
            count: 0,
        }
    }
}

/// Outcome of recording one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Streak after the vote
    pub streak: Streak,
    /// The threshold was reached by this vote
    pub trigger_popup: bool,
}

impl Streak {
    /// Record a vote in `direction`.
    pub fn update(self, direction: Direction, threshold: u32) -> StreakUpdate {
        let streak = if direction == self.direction {
            Streak {
                direction,
                count: self.count.saturating_add(1),
            }
        } else {
            Streak { direction, count: 1 }
        };

        StreakUpdate {
            streak,
            trigger_popup: streak.count == threshold,
        }
    }
}
