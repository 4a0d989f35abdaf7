//! Tally Voting Session Engine
//!
//! Voters are shown one post at a time (focus mode) or a grid of several
//! (grid mode), cast an up or down judgment, and the feed advances. This
//! crate holds every decision behind that loop as pure functions over
//! explicit state:
//!
//! - **Vote delta**: `(previous, next) → signed count change`
//! - **Eligibility**: strict low-score threshold, shared by feed and bulk votes
//! - **Queue selection**: two-phase search with cycle reset, grid and focus
//! - **Ledger**: optimistic apply, exact revert, reconcile, dual-source count
//! - **Cooldown**: exhaustion detection, time-boxed suspension, identity carry-over
//! - **Streak**: consecutive same-direction votes with an exact popup threshold
//!
//! # No Hidden State
//!
//! Nothing here reads ambient storage. Local vote maps, shown sets and
//! cooldown states are passed in, and every mutation returns a fresh value,
//! so the host owns all mutable state and earlier snapshots stay intact.
//!
//! # Example
//!
//! ```
//! use tally_engine::{next_swipe_post, Direction, LocalVoteMap, PendingVote, Post, ShownSet};
//!
//! let posts = vec![Post::new("p1").with_votes(10), Post::new("p2")];
//! let votes = LocalVoteMap::new();
//!
//! let pending = PendingVote::new("p1", &votes, Direction::Down);
//! let (posts, votes) = pending.apply(&posts, &votes);
//! assert_eq!(posts[0].vote_count, 9);
//!
//! let pick = next_swipe_post(&posts, Some("p1"), &ShownSet::new(), &votes, None);
//! assert_eq!(pick.next_post.map(|p| p.id.as_str()), Some("p2"));
//! ```

mod cooldown;
mod direction;
mod eligibility;
mod identity;
mod ledger;
mod post;
mod queue;
mod streak;

#[cfg(test)]
mod scenarios;

pub use cooldown::{
    carry_over, cooldown_for, is_at_limit, should_trigger_exhaustion, CooldownBook,
    CooldownPhase, CooldownState, ExhaustionCheck, DEFAULT_COOLDOWN_SECS, GUEST_VOTE_LIMIT,
};
pub use direction::{vote_delta, Direction, ParseDirectionError};
pub use eligibility::{
    bulk_vote_targets, filter_by_threshold, is_visible, Visibility, DOWNVOTE_THRESHOLD,
};
pub use identity::VoterIdentity;
pub use ledger::{
    apply_optimistic, is_judged, reconcile, record_vote, revert, voted_count, LocalVoteMap,
    PendingVote, Reverted, VoteReceipt,
};
pub use post::{Post, PostId, VoterId};
pub use queue::{
    grid_exhausted, initial_slots, next_swipe_post, next_unvoted_post, replace_slot,
    set_anim_state, settle, sort_posts, visible_ids, AnimState, ShownSet, Slot, SortOrder,
    SwipePick, VISIBLE_COUNT,
};
pub use streak::{Streak, StreakUpdate, STREAK_THRESHOLD};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_feed_defaults() {
        assert_eq!(VISIBLE_COUNT, 4);
        assert_eq!(GUEST_VOTE_LIMIT, 5);
        assert_eq!(DOWNVOTE_THRESHOLD, -5);
        assert_eq!(STREAK_THRESHOLD, 10);
    }
}
