//! Post model as seen by the engine.
//!
//! Posts are created and destroyed by the post store. The engine only reads
//! them and proposes count deltas.

use crate::direction::Direction;
use std::collections::HashMap;

/// Identifier of a post.
pub type PostId = String;

/// Identifier of a voter (username or anonymous voter id).
pub type VoterId = String;

/// A votable post.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Post {
    /// Unique identifier
    pub id: PostId,

    /// Server-authoritative aggregate count
    pub vote_count: i64,

    /// Author of the post, if known
    pub author_id: Option<String>,

    /// Creation time in milliseconds since the Unix epoch
    pub created_at: Option<u64>,

    /// Server record of who voted which way
    #[cfg_attr(feature = "serde", serde(default))]
    pub voter_directions: HashMap<VoterId, Direction>,
}

impl Post {
    /// Create a post with no votes and no author.
    pub fn new(id: impl Into<PostId>) -> Self {
        Self {
            id: id.into(),
            vote_count: 0,
            author_id: None,
            created_at: None,
            voter_directions: HashMap::new(),
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_id = Some(author.into());
        self
    }

    /// Set the aggregate count.
    pub fn with_votes(mut self, vote_count: i64) -> Self {
        self.vote_count = vote_count;
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, millis: u64) -> Self {
        self.created_at = Some(millis);
        self
    }

    /// Record a server-side judgment by `voter`.
    pub fn with_voter(mut self, voter: impl Into<VoterId>, direction: Direction) -> Self {
        self.voter_directions.insert(voter.into(), direction);
        self
    }

    /// The server's record of `voter`'s judgment on this post.
    pub fn direction_of(&self, voter: &str) -> Option<Direction> {
        self.voter_directions.get(voter).copied()
    }

    /// Whether `voter` authored this post.
    pub fn is_authored_by(&self, voter: &str) -> bool {
        self.author_id.as_deref() == Some(voter)
    }
}
