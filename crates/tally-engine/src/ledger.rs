//! Vote ledger: optimistic application, exact reversal and reconciliation.
//!
//! Three sources describe what a voter has judged:
//!
//! 1. The server's per-post voter map (`Post::voter_directions`)
//! 2. The voter's locally cached map ([`LocalVoteMap`])
//! 3. In-flight optimistic state ([`PendingVote`])
//!
//! Every operation here returns a new collection. Earlier snapshots held by
//! the caller are never touched.
//!
//! # Two-phase protocol
//!
//! ```text
//! PendingVote::new ──► apply ──► submit ──┬─► reconcile (success)
//!                                         └─► revert    (failure)
//! ```
//!
//! `revert` works on the full collection by id, so it stays correct when the
//! voter has already moved on to another post.

use crate::direction::{vote_delta, Direction};
use crate::post::{Post, PostId, VoterId};
use std::collections::HashMap;

/// Locally cached judgments of one voter, keyed by post id.
pub type LocalVoteMap = HashMap<PostId, Direction>;

/// Authoritative response of the post store to a vote submission.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoteReceipt {
    /// Post the vote was applied to
    pub id: PostId,
    /// Aggregate count after the vote
    pub vote_count: i64,
    /// Server record of who voted which way
    pub voter_directions: HashMap<VoterId, Direction>,
}

/// Result of reverting a failed vote.
#[derive(Debug, Clone, PartialEq)]
pub struct Reverted {
    /// Collection with the delta removed from the target post
    pub posts: Vec<Post>,
    /// Local votes with the previous judgment restored
    pub votes: LocalVoteMap,
}

/// A vote that has been applied locally but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVote {
    /// Target post
    pub post_id: PostId,
    /// Judgment recorded in the local map before this vote
    pub previous: Option<Direction>,
    /// New judgment
    pub direction: Direction,
    /// Count change applied optimistically
    pub delta: i64,
}

impl PendingVote {
    /// Prepare a vote, reading the previous judgment from the local map.
    pub fn new(post_id: impl Into<PostId>, local_votes: &LocalVoteMap, direction: Direction) -> Self {
        let post_id = post_id.into();
        let previous = local_votes.get(&post_id).copied();
        Self {
            delta: vote_delta(previous, direction),
            post_id,
            previous,
            direction,
        }
    }

    /// Phase one: apply the delta and record the judgment.
    pub fn apply(&self, posts: &[Post], local_votes: &LocalVoteMap) -> (Vec<Post>, LocalVoteMap) {
        (
            apply_optimistic(posts, &self.post_id, self.delta),
            record_vote(local_votes, &self.post_id, self.direction),
        )
    }

    /// Phase two, failure path: undo exactly what [`apply`](Self::apply) did.
    pub fn revert(&self, posts: &[Post], local_votes: &LocalVoteMap) -> Reverted {
        revert(posts, &self.post_id, self.delta, local_votes, self.previous)
    }
}

/// Add `delta` to the count of `post_id`, leaving every other post as it was.
///
/// Unknown ids produce an unchanged copy.
pub fn apply_optimistic(posts: &[Post], post_id: &str, delta: i64) -> Vec<Post> {
    posts
        .iter()
        .map(|post| {
            let mut post = post.clone();
            if post.id == post_id {
                post.vote_count += delta;
            }
            post
        })
        .collect()
}

/// Record `direction` for `post_id` in a copy of the local map.
pub fn record_vote(local_votes: &LocalVoteMap, post_id: &str, direction: Direction) -> LocalVoteMap {
    let mut votes = local_votes.clone();
    votes.insert(post_id.to_string(), direction);
    votes
}

/// Inverse of optimistic application.
///
/// Subtracts `delta` from the target post and restores the local judgment to
/// `previous`, removing the entry when there was none.
pub fn revert(
    posts: &[Post],
    post_id: &str,
    delta: i64,
    local_votes: &LocalVoteMap,
    previous: Option<Direction>,
) -> Reverted {
    let mut votes = local_votes.clone();
    match previous {
        Some(direction) => {
            votes.insert(post_id.to_string(), direction);
        }
        None => {
            votes.remove(post_id);
        }
    }

    Reverted {
        posts: apply_optimistic(posts, post_id, -delta),
        votes,
    }
}

/// Replace the target post's count and voter map with the server's answer.
pub fn reconcile(posts: &[Post], receipt: &VoteReceipt) -> Vec<Post> {
    posts
        .iter()
        .map(|post| {
            let mut post = post.clone();
            if post.id == receipt.id {
                post.vote_count = receipt.vote_count;
                post.voter_directions = receipt.voter_directions.clone();
            }
            post
        })
        .collect()
}

/// Whether `voter_id` has judged `post`, according to either source.
pub fn is_judged(post: &Post, local_votes: &LocalVoteMap, voter_id: Option<&str>) -> bool {
    local_votes.contains_key(&post.id)
        || voter_id.is_some_and(|voter| post.voter_directions.contains_key(voter))
}

/// Number of posts the voter has judged.
///
/// A post counts once whether the judgment is known from the server, from the
/// local cache, or from both. The local cache is wiped on cooldown expiry
/// while the server record persists, so the server side keeps progress
/// accurate after a reset.
pub fn voted_count(posts: &[Post], local_votes: &LocalVoteMap, voter_id: Option<&str>) -> usize {
    posts
        .iter()
        .filter(|post| is_judged(post, local_votes, voter_id))
        .count()
}
