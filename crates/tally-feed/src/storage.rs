//! Persistent voter state using RocksDB.
//!
//! Holds the small per-identity caches a browser would keep in local
//! storage:
//!
//! - `localVotes_<identity>` → JSON [`LocalVoteMap`]
//! - `cooldownEnd_<identity>` → cooldown end (ms since epoch)
//! - `guestVoteCount` → votes cast as a guest
//! - `anonymousVoterId` → stable anonymous voter id

use crate::error::{Error, Result};
use rand::RngCore;
use rocksdb::{Options, DB};
use std::path::Path;
use tally_engine::{LocalVoteMap, VoterIdentity};

const GUEST_VOTE_COUNT_KEY: &[u8] = b"guestVoteCount";
const ANONYMOUS_ID_KEY: &[u8] = b"anonymousVoterId";

/// Storage backend for voter-local state.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    // --- Local votes ---

    /// Load the local vote map of an identity (empty if never stored).
    pub fn local_votes(&self, identity: &VoterIdentity) -> Result<LocalVoteMap> {
        match self.db.get(identity.local_votes_key().as_bytes())? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(LocalVoteMap::new()),
        }
    }

    /// Store the local vote map of an identity.
    pub fn put_local_votes(&self, identity: &VoterIdentity, votes: &LocalVoteMap) -> Result<()> {
        let value = serde_json::to_vec(votes)?;
        self.db.put(identity.local_votes_key().as_bytes(), value)?;
        Ok(())
    }

    /// Drop the local vote map of an identity.
    pub fn clear_local_votes(&self, identity: &VoterIdentity) -> Result<()> {
        self.db.delete(identity.local_votes_key().as_bytes())?;
        Ok(())
    }

    // --- Cooldown ---

    /// Persisted cooldown end of an identity.
    pub fn cooldown_end(&self, identity: &VoterIdentity) -> Result<Option<u64>> {
        match self.db.get(identity.cooldown_end_key().as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Persist or clear the cooldown end of an identity.
    pub fn put_cooldown_end(&self, identity: &VoterIdentity, end: Option<u64>) -> Result<()> {
        let key = identity.cooldown_end_key();
        match end {
            Some(end) => self.db.put(key.as_bytes(), serde_json::to_vec(&end)?)?,
            None => self.db.delete(key.as_bytes())?,
        }
        Ok(())
    }

    // --- Guest counter ---

    /// Votes cast as a guest so far.
    pub fn guest_vote_count(&self) -> Result<u32> {
        match self.db.get(GUEST_VOTE_COUNT_KEY)? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(0),
        }
    }

    /// Store the guest vote counter.
    pub fn put_guest_vote_count(&self, count: u32) -> Result<()> {
        self.db.put(GUEST_VOTE_COUNT_KEY, serde_json::to_vec(&count)?)?;
        Ok(())
    }

    // --- Anonymous identity ---

    /// Get or create the stable anonymous voter id.
    pub fn get_or_create_anonymous_id(&self) -> Result<String> {
        if let Some(data) = self.db.get(ANONYMOUS_ID_KEY)? {
            return String::from_utf8(data)
                .map_err(|_| Error::Storage("Invalid stored anonymous id".into()));
        }

        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        let id = format!("anon_{}", hex::encode(bytes));
        self.db.put(ANONYMOUS_ID_KEY, id.as_bytes())?;
        Ok(id)
    }
}
