//! Tally Feed - Hosting Session for the Voting Engine
//!
//! Owns every piece of mutable state around [`tally_engine`]: the post
//! collection, per-identity vote caches and cooldowns, the on-screen
//! selection and the streak. Talks to the post store for snapshots and vote
//! submissions, and persists voter caches between runs.
//!
//! # Architecture
//!
//! - **Config**: Environment-driven feed settings
//! - **Store**: Post store collaborator (trait + in-memory implementation)
//! - **Storage**: RocksDB-backed per-identity voter caches
//! - **Session**: Two-phase vote protocol, selection, cooldown lifecycle
//!
//! # Example
//!
//! ```no_run
//! use tally_feed::{FeedConfig, MemoryPostStore, VotingSession};
//! use tally_engine::{Direction, Post};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryPostStore::new(vec![Post::new("p1"), Post::new("p2")]);
//!     let mut session = VotingSession::new(FeedConfig::from_env()?, store, "anon_1", None);
//!     session.load(0).await?;
//!     let outcome = session.cast_vote("p1", Direction::Up, 0).await?;
//!     println!("next: {:?}", outcome.selection);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod storage;
pub mod store;

pub use config::{FeedConfig, FeedMode};
pub use error::{Error, Result};
pub use session::{Ballot, Selection, VoteOutcome, VotingSession};
pub use storage::Storage;
pub use store::{generate_post_id, MemoryPostStore, PostStore, RateLimit};
