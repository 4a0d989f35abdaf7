//! Post store collaborator.
//!
//! The session consumes two calls: a full snapshot of posts and a vote
//! submission that returns the authoritative count. [`MemoryPostStore`] is
//! an in-process implementation with the same contract, used by the
//! simulator and the tests.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use tally_engine::{vote_delta, Direction, Post, VoteReceipt};
use tokio::sync::RwLock;
use tracing::debug;

/// Source of truth for posts and vote counts.
pub trait PostStore {
    /// Apply a vote. Idempotent per (post, voter): repeating a direction
    /// leaves the count alone, flipping it moves the count by two.
    fn submit_vote(
        &self,
        post_id: &str,
        direction: Direction,
        voter_id: &str,
    ) -> impl Future<Output = Result<VoteReceipt>> + Send;

    /// Full snapshot of all posts.
    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<Post>>> + Send;
}

/// Generate a post id from content.
pub fn generate_post_id(content: &[u8]) -> String {
    let hash = blake3::hash(content);
    hex::encode(&hash.as_bytes()[..12])
}

/// Per-voter submission limit enforced by [`MemoryPostStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Accepted votes before the limit kicks in
    pub max_votes: u32,
    /// Cooldown hint returned with the rejection
    pub cooldown_seconds: u64,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: Vec<Post>,
    accepted: HashMap<String, u32>,
    rate_limit: Option<RateLimit>,
    failures_pending: u32,
}

/// In-memory post store.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    state: RwLock<MemoryState>,
}

impl MemoryPostStore {
    /// Create a store seeded with `posts`.
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                posts,
                ..MemoryState::default()
            }),
        }
    }

    /// Create a post from its content and author, returning it.
    pub async fn create_post(&self, content: &str, author: Option<&str>, created_at: u64) -> Post {
        let mut state = self.state.write().await;
        let seed = format!("{}:{}:{}", content, created_at, state.posts.len());
        let mut post = Post::new(generate_post_id(seed.as_bytes())).created_at(created_at);
        if let Some(author) = author {
            post = post.with_author(author);
        }
        state.posts.push(post.clone());
        post
    }

    /// Reject votes from a voter once they have had `max_votes` accepted.
    pub async fn set_rate_limit(&self, limit: Option<RateLimit>) {
        self.state.write().await.rate_limit = limit;
    }

    /// Make the next `count` submissions fail.
    pub async fn fail_next(&self, count: u32) {
        self.state.write().await.failures_pending = count;
    }

    /// Current server-side count of a post.
    pub async fn vote_count(&self, post_id: &str) -> Option<i64> {
        let state = self.state.read().await;
        state
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .map(|p| p.vote_count)
    }
}

impl PostStore for MemoryPostStore {
    async fn submit_vote(&self, post_id: &str, direction: Direction, voter_id: &str) -> Result<VoteReceipt> {
        let mut state = self.state.write().await;

        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(Error::Submission("store unavailable".into()));
        }

        if let Some(limit) = state.rate_limit {
            let accepted = state.accepted.get(voter_id).copied().unwrap_or(0);
            if accepted >= limit.max_votes {
                return Err(Error::RateLimited {
                    cooldown_seconds: limit.cooldown_seconds,
                });
            }
        }

        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| Error::NotFound(format!("post {}", post_id)))?;

        let previous = post.direction_of(voter_id);
        post.vote_count += vote_delta(previous, direction);
        post.voter_directions.insert(voter_id.to_string(), direction);

        let receipt = VoteReceipt {
            id: post.id.clone(),
            vote_count: post.vote_count,
            voter_directions: post.voter_directions.clone(),
        };

        *state.accepted.entry(voter_id.to_string()).or_insert(0) += 1;
        debug!(post = %post_id, voter = %voter_id, count = receipt.vote_count, "vote stored");
        Ok(receipt)
    }

    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        Ok(self.state.read().await.posts.clone())
    }
}
