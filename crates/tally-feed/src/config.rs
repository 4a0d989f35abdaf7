//! Feed configuration loaded from environment variables.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tally_engine::{
    SortOrder, Visibility, DEFAULT_COOLDOWN_SECS, DOWNVOTE_THRESHOLD, GUEST_VOTE_LIMIT,
    STREAK_THRESHOLD,
};

/// Presentation mode of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedMode {
    /// One card at a time
    #[default]
    Focus,
    /// Several cards at once
    Grid,
}

impl FromStr for FeedMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "focus" | "swipe" => Ok(FeedMode::Focus),
            "grid" | "desktop" => Ok(FeedMode::Grid),
            other => Err(Error::InvalidInput(format!("unknown feed mode: {}", other))),
        }
    }
}

/// Configuration for a voting session.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Data directory for persisted voter state
    pub data_dir: PathBuf,

    /// Presentation mode
    pub mode: FeedMode,

    /// Traversal order of the feed
    pub sort: SortOrder,

    /// Exhaustion cooldown window in seconds
    pub cooldown_secs: u64,

    /// Low-score visibility policy
    pub visibility: Visibility,

    /// Streak length that triggers the popup
    pub streak_threshold: u32,

    /// Votes a guest may cast before logging in
    pub guest_vote_limit: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tally-data"),
            mode: FeedMode::Focus,
            sort: SortOrder::Top,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            visibility: Visibility {
                hide_low_score: false,
                threshold: DOWNVOTE_THRESHOLD,
            },
            streak_threshold: STREAK_THRESHOLD,
            guest_vote_limit: GUEST_VOTE_LIMIT,
        }
    }
}

impl FeedConfig {
    /// Create config from environment variables, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let data_dir = std::env::var("TALLY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let mode = match std::env::var("TALLY_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.mode,
        };

        let sort = match std::env::var("TALLY_SORT") {
            Ok(value) => parse_sort(&value)?,
            Err(_) => defaults.sort,
        };

        Ok(Self {
            data_dir,
            mode,
            sort,
            cooldown_secs: env_or("TALLY_COOLDOWN_SECS", defaults.cooldown_secs)?,
            visibility: Visibility {
                hide_low_score: env_or("TALLY_HIDE_LOW_SCORE", defaults.visibility.hide_low_score)?,
                threshold: env_or("TALLY_DOWNVOTE_THRESHOLD", defaults.visibility.threshold)?,
            },
            streak_threshold: env_or("TALLY_STREAK_THRESHOLD", defaults.streak_threshold)?,
            guest_vote_limit: env_or("TALLY_GUEST_VOTE_LIMIT", defaults.guest_vote_limit)?,
        })
    }

    /// Cooldown window in milliseconds.
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_secs.saturating_mul(1000)
    }
}

fn parse_sort(value: &str) -> Result<SortOrder> {
    match value.trim().to_ascii_lowercase().as_str() {
        "top" => Ok(SortOrder::Top),
        "new" => Ok(SortOrder::New),
        other => Err(Error::InvalidInput(format!("unknown sort order: {}", other))),
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid {}: {:?}", key, value))),
        Err(_) => Ok(default),
    }
}
