//! Voter identity and the storage keys derived from it.
//!
//! Exactly one identity is active at a time. Every per-voter cache (local
//! votes, cooldown end) is namespaced by the identity's key, which is the
//! username when authenticated and the anonymous voter id otherwise.

use std::fmt;

/// Prefix of the cooldown state key.
pub const COOLDOWN_KEY_PREFIX: &str = "cooldown_";

/// Prefix of the persisted local vote map key.
pub const LOCAL_VOTES_KEY_PREFIX: &str = "localVotes_";

/// Prefix of the persisted cooldown end key.
pub const COOLDOWN_END_KEY_PREFIX: &str = "cooldownEnd_";

/// The voter currently driving the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoterIdentity {
    /// Authenticated user
    User(String),
    /// Guest with a stable, locally generated voter id
    Anonymous(String),
}

impl VoterIdentity {
    /// Build an identity from an optional username, falling back to the
    /// anonymous voter id.
    pub fn resolve(username: Option<&str>, anonymous_id: &str) -> Self {
        match username {
            Some(name) if !name.is_empty() => VoterIdentity::User(name.to_string()),
            _ => VoterIdentity::Anonymous(anonymous_id.to_string()),
        }
    }

    /// The id used as voter id and as storage namespace.
    pub fn key(&self) -> &str {
        match self {
            VoterIdentity::User(name) => name,
            VoterIdentity::Anonymous(id) => id,
        }
    }

    /// Whether this is an authenticated user.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, VoterIdentity::User(_))
    }

    /// Key of this identity's cooldown state.
    pub fn cooldown_key(&self) -> String {
        format!("{}{}", COOLDOWN_KEY_PREFIX, self.key())
    }

    /// Key of this identity's persisted local vote map.
    pub fn local_votes_key(&self) -> String {
        format!("{}{}", LOCAL_VOTES_KEY_PREFIX, self.key())
    }

    /// Key of this identity's persisted cooldown end.
    pub fn cooldown_end_key(&self) -> String {
        format!("{}{}", COOLDOWN_END_KEY_PREFIX, self.key())
    }
}

impl fmt::Display for VoterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoterIdentity::User(name) => write!(f, "user:{}", name),
            VoterIdentity::Anonymous(id) => write!(f, "guest:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_wins_over_anonymous_id() {
        let id = VoterIdentity::resolve(Some("alice"), "anon_1");
        assert_eq!(id, VoterIdentity::User("alice".into()));
        assert_eq!(id.cooldown_key(), "cooldown_alice");
    }

    #[test]
    fn falls_back_to_anonymous_id() {
        let id = VoterIdentity::resolve(None, "anon_1");
        assert!(!id.is_authenticated());
        assert_eq!(id.cooldown_key(), "cooldown_anon_1");
        assert_eq!(id.local_votes_key(), "localVotes_anon_1");
        assert_eq!(id.cooldown_end_key(), "cooldownEnd_anon_1");

        // Empty username is treated as logged out
        assert_eq!(VoterIdentity::resolve(Some(""), "anon_1"), id);
    }
}
