//! Voting session - the single owner of mutable feed state.
//!
//! The engine decides; the session holds the results and talks to the
//! outside world. Each vote runs the two-phase protocol:
//!
//! 1. [`begin_vote`](VotingSession::begin_vote): delta, optimistic apply,
//!    ledger record, streak, guest counter
//! 2. submit to the [`PostStore`]
//! 3. [`confirm_vote`](VotingSession::confirm_vote) on success, then
//!    [`advance`](VotingSession::advance) the selection
//! 4. or [`fail_vote`](VotingSession::fail_vote): revert, put the post back
//!    on screen (and start a server cooldown on a rate limit)
//! 5. check for exhaustion
//!
//! [`cast_vote`](VotingSession::cast_vote) runs all of it. The steps stay
//! public so hosts with their own transport can drive them separately.
//!
//! The post collection is held behind an `Arc` and replaced on every change,
//! so snapshots handed out earlier never change under the holder.

use crate::config::{FeedConfig, FeedMode};
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::store::PostStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tally_engine::{
    bulk_vote_targets, carry_over, cooldown_for, filter_by_threshold, grid_exhausted,
    initial_slots, is_at_limit, next_swipe_post, next_unvoted_post, reconcile, replace_slot,
    set_anim_state, settle, sort_posts, visible_ids, voted_count, AnimState, CooldownBook,
    CooldownPhase, CooldownState, Direction, ExhaustionCheck, LocalVoteMap, PendingVote, Post,
    PostId, ShownSet, Slot, Streak, VoteReceipt, VoterIdentity, VISIBLE_COUNT,
};
use tracing::{debug, info, warn};

/// What is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Focus mode: a single post, `None` when nothing is left
    Focus { current: Option<PostId> },
    /// Grid mode: up to [`VISIBLE_COUNT`] slots
    Grid { slots: Vec<Slot> },
}

impl Selection {
    fn empty(mode: FeedMode) -> Self {
        match mode {
            FeedMode::Focus => Selection::Focus { current: None },
            FeedMode::Grid => Selection::Grid { slots: Vec::new() },
        }
    }

    /// Post ids on screen.
    pub fn post_ids(&self) -> Vec<&str> {
        match self {
            Selection::Focus { current } => current.as_deref().into_iter().collect(),
            Selection::Grid { slots } => visible_ids(slots),
        }
    }
}

/// A vote applied locally and awaiting the store's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    /// The optimistic change
    pub pending: PendingVote,
    /// Identity the vote was cast under
    pub identity: VoterIdentity,
    /// This vote completed a streak
    pub streak_popup: bool,
    ticket: u64,
    streak_before: Streak,
    streak_after: Streak,
    counted_guest_vote: bool,
}

/// Result of a full vote round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Post that was voted on
    pub post_id: PostId,
    /// Count change applied optimistically
    pub delta: i64,
    /// The store accepted the vote
    pub confirmed: bool,
    /// Transient notice for a failed submission
    pub notice: Option<String>,
    /// This vote completed a streak
    pub streak_popup: bool,
    /// Post(s) on screen after advancing
    pub selection: Selection,
    /// Cooldown phase after the vote
    pub phase: CooldownPhase,
    /// The vote exhausted the queue and started a cooldown
    pub exhausted: bool,
}

/// Hosting session for one voter at a time.
pub struct VotingSession<S> {
    config: FeedConfig,
    store: S,
    storage: Option<Storage>,
    anonymous_id: String,
    identity: VoterIdentity,
    posts: Arc<Vec<Post>>,
    local_votes: HashMap<VoterIdentity, LocalVoteMap>,
    cooldowns: CooldownBook,
    shown: ShownSet,
    selection: Selection,
    streak: Streak,
    guest_vote_count: u32,
    limit_reached: bool,
    next_ticket: u64,
    open_ballots: HashSet<u64>,
}

impl<S: PostStore> VotingSession<S> {
    /// Create a session without persistence.
    pub fn new(config: FeedConfig, store: S, anonymous_id: impl Into<String>, username: Option<&str>) -> Self {
        let anonymous_id = anonymous_id.into();
        let identity = VoterIdentity::resolve(username, &anonymous_id);
        Self {
            selection: Selection::empty(config.mode),
            config,
            store,
            storage: None,
            anonymous_id,
            identity,
            posts: Arc::new(Vec::new()),
            local_votes: HashMap::new(),
            cooldowns: CooldownBook::new(),
            shown: ShownSet::new(),
            streak: Streak::default(),
            guest_vote_count: 0,
            limit_reached: false,
            next_ticket: 0,
            open_ballots: HashSet::new(),
        }
    }

    /// Create a session whose voter caches live in `storage`.
    pub fn with_storage(config: FeedConfig, store: S, storage: Storage, username: Option<&str>) -> Result<Self> {
        let anonymous_id = storage.get_or_create_anonymous_id()?;
        let mut session = Self::new(config, store, anonymous_id, username);
        session.guest_vote_count = storage.guest_vote_count()?;
        session.storage = Some(storage);
        session.restore_identity()?;
        Ok(session)
    }

    // --- Accessors ---

    /// The post store this session submits to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active voter identity.
    pub fn identity(&self) -> &VoterIdentity {
        &self.identity
    }

    /// Snapshot of the full post collection.
    pub fn posts(&self) -> Arc<Vec<Post>> {
        Arc::clone(&self.posts)
    }

    /// Posts eligible for display, in traversal order.
    pub fn feed(&self) -> Vec<Post> {
        filter_by_threshold(
            &self.posts,
            self.config.visibility.hide_low_score,
            self.config.visibility.threshold,
        )
    }

    /// What is on screen.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Local judgments of the active identity.
    pub fn local_votes(&self) -> LocalVoteMap {
        self.local_votes.get(&self.identity).cloned().unwrap_or_default()
    }

    /// Posts offered this cycle.
    pub fn shown(&self) -> &ShownSet {
        &self.shown
    }

    /// Current streak.
    pub fn streak(&self) -> Streak {
        self.streak
    }

    /// Cooldown state of the active identity.
    pub fn cooldown(&self) -> CooldownState {
        cooldown_for(&self.cooldowns, &self.identity)
    }

    /// Milliseconds left in the active cooldown.
    pub fn cooldown_remaining(&self, now_ms: u64) -> u64 {
        self.cooldown().remaining_ms(now_ms)
    }

    /// Votes cast as a guest.
    pub fn guest_vote_count(&self) -> u32 {
        self.guest_vote_count
    }

    /// Whether the "limit reached" prompt is showing.
    pub fn limit_reached(&self) -> bool {
        self.limit_reached
    }

    /// Show or dismiss the "limit reached" prompt.
    pub fn set_limit_reached(&mut self, shown: bool) {
        self.limit_reached = shown;
    }

    /// `(judged, eligible)` for the progress indicator.
    pub fn progress(&self) -> (usize, usize) {
        let feed = self.feed();
        let voted = voted_count(&feed, &self.local_votes(), Some(self.identity.key()));
        (voted, feed.len())
    }

    /// Posts a bulk vote would act on.
    pub fn bulk_vote_targets(&self) -> Vec<PostId> {
        bulk_vote_targets(
            &self.posts,
            &self.local_votes(),
            Some(self.identity.key()),
            self.config.visibility,
        )
    }

    // --- Loading and selection ---

    /// Fetch the collection, populate the selection and check for
    /// exhaustion.
    pub async fn load(&mut self, now_ms: u64) -> Result<CooldownPhase> {
        let posts = self.store.fetch_posts().await?;
        info!(count = posts.len(), mode = ?self.config.mode, "Loaded posts");
        self.posts = Arc::new(sort_posts(&posts, self.config.sort));
        self.populate();
        self.evaluate_exhaustion(now_ms)
    }

    /// Recompute the selection from scratch and re-arm exhaustion detection.
    pub fn populate(&mut self) {
        let feed = self.feed();
        let votes = self.local_votes();

        self.selection = match self.config.mode {
            FeedMode::Focus => {
                let pick = next_swipe_post(&feed, None, &self.shown, &votes, Some(self.identity.key()));
                if pick.should_reset_shown {
                    self.shown.clear();
                }
                Selection::Focus {
                    current: pick.next_post.map(|post| post.id.clone()),
                }
            }
            FeedMode::Grid => Selection::Grid {
                slots: initial_slots(&feed, &votes, VISIBLE_COUNT),
            },
        };

        for id in self.selection.post_ids() {
            self.shown.insert(id.to_string());
        }

        let key = self.identity.cooldown_key();
        let state = self.cooldown().initialize();
        self.cooldowns.insert(key, state);
        debug!(selection = ?self.selection, "Selection populated");
    }

    /// Move past `voted_post_id`.
    pub fn advance(&mut self, voted_post_id: &str) {
        let feed = self.feed();
        let votes = self.local_votes();

        match &self.selection {
            Selection::Focus { current } => {
                let current = current.clone();
                let pick = next_swipe_post(
                    &feed,
                    current.as_deref().or(Some(voted_post_id)),
                    &self.shown,
                    &votes,
                    Some(self.identity.key()),
                );
                if pick.should_reset_shown {
                    debug!("Focus cycle complete, resetting shown posts");
                    self.shown.clear();
                }
                let next = pick.next_post.map(|post| post.id.clone());
                if let Some(id) = &next {
                    self.shown.insert(id.clone());
                }
                self.selection = Selection::Focus { current: next };
            }
            Selection::Grid { slots } => {
                let next = next_unvoted_post(&feed, &visible_ids(slots), &self.shown, &votes);
                if next.is_some_and(|post| self.shown.contains(&post.id)) {
                    debug!("Grid cycle complete, resetting shown posts");
                    self.shown.clear();
                }
                if let Some(post) = next {
                    self.shown.insert(post.id.clone());
                }

                let fading = set_anim_state(slots, voted_post_id, AnimState::FadingOut);
                let slots = replace_slot(&fading, voted_post_id, next);
                self.selection = Selection::Grid { slots };
            }
        }
    }

    /// Finish grid entry animations.
    pub fn settle(&mut self) {
        if let Selection::Grid { slots } = &self.selection {
            self.selection = Selection::Grid {
                slots: settle(slots),
            };
        }
    }

    /// Start a cooldown if the selection has run dry.
    pub fn evaluate_exhaustion(&mut self, now_ms: u64) -> Result<CooldownPhase> {
        let selection_empty = match &self.selection {
            Selection::Focus { current } => current.is_none(),
            Selection::Grid { slots } => grid_exhausted(slots, &self.local_votes()),
        };
        let check = ExhaustionCheck {
            selection_empty,
            post_count: self.posts.len(),
            limit_reached: self.limit_reached,
        };

        let state = self.cooldown();
        match state.evaluate(&check) {
            CooldownPhase::Exhausted => {
                let cooling = state.start(now_ms, self.config.cooldown_ms());
                info!(
                    voter = %self.identity,
                    until = ?cooling.end_time,
                    "Queue exhausted, starting cooldown"
                );
                self.set_cooldown(&self.identity.clone(), cooling)?;
                Ok(CooldownPhase::Exhausted)
            }
            phase => Ok(phase),
        }
    }

    /// Expire a finished cooldown. Returns true when a reset happened.
    ///
    /// Clears the identity's local votes on purpose so the voter can judge
    /// the feed again. The fresh selection is checked for exhaustion.
    pub fn tick(&mut self, now_ms: u64) -> Result<bool> {
        let state = self.cooldown();
        if !state.is_expired(now_ms) {
            return Ok(false);
        }

        info!(voter = %self.identity, "Cooldown expired, starting fresh cycle");
        let identity = self.identity.clone();
        self.set_cooldown(&identity, state.expire())?;
        self.set_local_votes(&identity, LocalVoteMap::new())?;
        self.shown.clear();
        self.streak = Streak::default();
        self.populate();
        self.evaluate_exhaustion(now_ms)?;
        Ok(true)
    }

    // --- Voting ---

    /// Phase one: apply a vote locally.
    pub fn begin_vote(&mut self, post_id: &str, direction: Direction) -> Result<Ballot> {
        if self.cooldown().phase() == CooldownPhase::Cooling {
            return Err(Error::InvalidInput("voting is cooling down".into()));
        }
        if !self.identity.is_authenticated() && is_at_limit(self.guest_vote_count, self.config.guest_vote_limit) {
            self.limit_reached = true;
            return Err(Error::InvalidInput("guest vote limit reached".into()));
        }
        if !self.posts.iter().any(|post| post.id == post_id) {
            return Err(Error::NotFound(format!("post {}", post_id)));
        }

        let identity = self.identity.clone();
        let votes = self.local_votes();
        let pending = PendingVote::new(post_id, &votes, direction);
        let (posts, votes) = pending.apply(&self.posts, &votes);
        self.posts = Arc::new(posts);
        self.set_local_votes(&identity, votes)?;

        let streak_before = self.streak;
        let update = self.streak.update(direction, self.config.streak_threshold);
        self.streak = update.streak;
        if update.trigger_popup {
            info!(voter = %identity, direction = %direction, count = update.streak.count, "Streak reached");
        }

        let counted_guest_vote = !identity.is_authenticated();
        if counted_guest_vote {
            self.guest_vote_count += 1;
            if let Some(storage) = &self.storage {
                storage.put_guest_vote_count(self.guest_vote_count)?;
            }
            if is_at_limit(self.guest_vote_count, self.config.guest_vote_limit) {
                info!(count = self.guest_vote_count, "Guest vote limit reached, prompting login");
                self.limit_reached = true;
            }
        }

        if let Selection::Grid { slots } = &self.selection {
            self.selection = Selection::Grid {
                slots: set_anim_state(slots, post_id, AnimState::Voted),
            };
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.open_ballots.insert(ticket);

        debug!(post = %post_id, direction = %direction, delta = pending.delta, "Vote applied optimistically");
        Ok(Ballot {
            pending,
            identity,
            streak_popup: update.trigger_popup,
            ticket,
            streak_before,
            streak_after: update.streak,
            counted_guest_vote,
        })
    }

    /// Phase two, success: adopt the store's count.
    pub fn confirm_vote(&mut self, ballot: &Ballot, receipt: &VoteReceipt) {
        self.open_ballots.remove(&ballot.ticket);
        self.posts = Arc::new(reconcile(&self.posts, receipt));
        debug!(post = %ballot.pending.post_id, count = receipt.vote_count, "Vote confirmed");
    }

    /// Phase two, failure: undo the optimistic change, the streak step and
    /// the guest count, and put the post back on screen. A rate limit also
    /// puts the ballot's identity into a server-timed cooldown.
    ///
    /// Safe to call after the selection has moved on; the revert targets
    /// the post by id. A ballot is only ever undone once.
    pub fn fail_vote(&mut self, ballot: &Ballot, error: &Error, now_ms: u64) -> Result<CooldownPhase> {
        let state = cooldown_for(&self.cooldowns, &ballot.identity);
        if !self.open_ballots.remove(&ballot.ticket) {
            return Ok(state.phase());
        }

        let votes = self.local_votes.get(&ballot.identity).cloned().unwrap_or_default();
        let reverted = ballot.pending.revert(&self.posts, &votes);
        self.posts = Arc::new(reverted.posts);
        self.set_local_votes(&ballot.identity, reverted.votes)?;
        warn!(post = %ballot.pending.post_id, error = %error, "Vote reverted");

        // Later votes have built on the streak; leave it alone then
        if self.streak == ballot.streak_after {
            self.streak = ballot.streak_before;
        }
        if ballot.counted_guest_vote {
            self.guest_vote_count = self.guest_vote_count.saturating_sub(1);
            if let Some(storage) = &self.storage {
                storage.put_guest_vote_count(self.guest_vote_count)?;
            }
            if !self.identity.is_authenticated() {
                self.limit_reached = is_at_limit(self.guest_vote_count, self.config.guest_vote_limit);
            }
        }

        if ballot.identity == self.identity {
            self.reoffer(&ballot.pending.post_id);
        }

        match error.cooldown_seconds() {
            Some(seconds) => {
                let cooling = state.start_from_server(now_ms, seconds);
                warn!(voter = %ballot.identity, seconds, "Rate limited, cooling down");
                self.set_cooldown(&ballot.identity, cooling)?;
                Ok(CooldownPhase::Cooling)
            }
            None => Ok(state.phase()),
        }
    }

    /// Vote, submit, reconcile or revert, then advance.
    pub async fn cast_vote(&mut self, post_id: &str, direction: Direction, now_ms: u64) -> Result<VoteOutcome> {
        let ballot = self.begin_vote(post_id, direction)?;

        let submitted = self
            .store
            .submit_vote(post_id, direction, ballot.identity.key())
            .await;

        let (confirmed, notice) = match submitted {
            Ok(receipt) => {
                self.confirm_vote(&ballot, &receipt);
                self.advance(post_id);
                (true, None)
            }
            Err(error) => {
                self.fail_vote(&ballot, &error, now_ms)?;
                (false, Some(error.to_string()))
            }
        };

        let exhausted = self.evaluate_exhaustion(now_ms)? == CooldownPhase::Exhausted;

        Ok(VoteOutcome {
            post_id: post_id.to_string(),
            delta: ballot.pending.delta,
            confirmed,
            notice,
            streak_popup: ballot.streak_popup,
            selection: self.selection.clone(),
            phase: self.cooldown().phase(),
            exhausted,
        })
    }

    // --- Identity ---

    /// Log in (`Some`) or out (`None`). An active cooldown follows the voter
    /// across the switch, and the incoming identity's feed is checked for
    /// exhaustion.
    pub fn switch_identity(&mut self, username: Option<&str>, now_ms: u64) -> Result<CooldownPhase> {
        let incoming = VoterIdentity::resolve(username, &self.anonymous_id);
        if incoming == self.identity {
            return Ok(self.cooldown().phase());
        }

        let outgoing = std::mem::replace(&mut self.identity, incoming.clone());
        info!(from = %outgoing, to = %incoming, "Switching voter identity");

        self.restore_identity()?;
        self.cooldowns = carry_over(&self.cooldowns, &outgoing, &incoming);
        if let Some(storage) = &self.storage {
            storage.put_cooldown_end(&incoming, self.cooldown().end_time)?;
        }

        self.limit_reached = !incoming.is_authenticated()
            && is_at_limit(self.guest_vote_count, self.config.guest_vote_limit);
        self.shown.clear();
        self.populate();
        self.evaluate_exhaustion(now_ms)
    }

    // --- Internal ---

    /// Put a reverted post back in front of the voter.
    fn reoffer(&mut self, post_id: &str) {
        match &self.selection {
            Selection::Focus { current: Some(_) } => {}
            Selection::Focus { current: None } => {
                let feed = self.feed();
                let votes = self.local_votes();
                let pick = next_swipe_post(&feed, None, &self.shown, &votes, Some(self.identity.key()));
                if pick.should_reset_shown {
                    self.shown.clear();
                }
                let next = pick.next_post.map(|post| post.id.clone());
                if let Some(id) = &next {
                    self.shown.insert(id.clone());
                }
                self.selection = Selection::Focus { current: next };
            }
            Selection::Grid { slots } => {
                self.selection = Selection::Grid {
                    slots: set_anim_state(slots, post_id, AnimState::Visible),
                };
            }
        }
    }

    /// Load the active identity's persisted caches if not yet in memory.
    fn restore_identity(&mut self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        if !self.local_votes.contains_key(&self.identity) {
            let votes = storage.local_votes(&self.identity)?;
            self.local_votes.insert(self.identity.clone(), votes);
        }

        let key = self.identity.cooldown_key();
        if !self.cooldowns.contains_key(&key) {
            if let Some(end) = storage.cooldown_end(&self.identity)? {
                self.cooldowns.insert(
                    key,
                    CooldownState {
                        end_time: Some(end),
                        triggered: true,
                        initialized: false,
                    },
                );
            }
        }
        Ok(())
    }

    fn set_local_votes(&mut self, identity: &VoterIdentity, votes: LocalVoteMap) -> Result<()> {
        if let Some(storage) = &self.storage {
            if votes.is_empty() {
                storage.clear_local_votes(identity)?;
            } else {
                storage.put_local_votes(identity, &votes)?;
            }
        }
        self.local_votes.insert(identity.clone(), votes);
        Ok(())
    }

    fn set_cooldown(&mut self, identity: &VoterIdentity, state: CooldownState) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.put_cooldown_end(identity, state.end_time)?;
        }
        self.cooldowns.insert(identity.cooldown_key(), state);
        Ok(())
    }
}
