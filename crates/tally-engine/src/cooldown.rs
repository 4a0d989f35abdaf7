//! Cooldown controller: exhaustion detection and time-boxed suspension.
//!
//! Per voter identity, keyed by [`VoterIdentity::cooldown_key`]:
//!
//! ```text
//!   ┌──────┐  selector empty  ┌───────────┐  start()   ┌─────────┐
//!   │ Idle │ ───────────────► │ Exhausted │ ─────────► │ Cooling │
//!   └──────┘                  └───────────┘            └─────────┘
//!      ▲                                                    │
//!      └───────────────────── expire() ◄────────────────────┘
//! ```
//!
//! A server rate limit may jump straight from `Idle` to `Cooling`.
//!
//! # Initialization guard
//!
//! `initialized` is false from expiry until the selector has repopulated the
//! selection. Exhaustion is never evaluated while it is false, otherwise the
//! empty selection left by the expiry reset would start a new cooldown
//! before cards come back.
//!
//! Timestamps are milliseconds since the Unix epoch, always passed in by
//! the caller.

use crate::identity::VoterIdentity;
use std::collections::HashMap;

/// Votes a guest may cast before being asked to log in.
pub const GUEST_VOTE_LIMIT: u32 = 5;

/// Default exhaustion cooldown window.
pub const DEFAULT_COOLDOWN_SECS: u64 = 300;

/// Cooldown state of one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CooldownState {
    /// When the current cooldown ends
    pub end_time: Option<u64>,
    /// A cooldown has been started for the current cycle
    pub triggered: bool,
    /// The selector has run since the last reset
    pub initialized: bool,
}

/// Phase of the cooldown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownPhase {
    /// Voting normally
    Idle,
    /// Queue ran dry; a cooldown should start
    Exhausted,
    /// Suspended until `end_time`
    Cooling,
}

/// Inputs needed to decide whether an empty selection means exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustionCheck {
    /// The selector produced nothing to present
    pub selection_empty: bool,
    /// Size of the loaded post collection
    pub post_count: usize,
    /// The separate "limit reached" prompt is on screen
    pub limit_reached: bool,
}

/// Whether the current empty selection is true exhaustion.
///
/// An empty collection is a no-op state, not exhaustion.
pub fn should_trigger_exhaustion(state: &CooldownState, check: &ExhaustionCheck) -> bool {
    state.initialized
        && check.selection_empty
        && state.end_time.is_none()
        && !state.triggered
        && check.post_count > 0
        && !check.limit_reached
}

impl CooldownState {
    /// Phase implied by the stored state alone.
    pub fn phase(&self) -> CooldownPhase {
        if self.end_time.is_some() {
            CooldownPhase::Cooling
        } else {
            CooldownPhase::Idle
        }
    }

    /// Phase after looking at the selector's latest result.
    pub fn evaluate(&self, check: &ExhaustionCheck) -> CooldownPhase {
        if should_trigger_exhaustion(self, check) {
            CooldownPhase::Exhausted
        } else {
            self.phase()
        }
    }

    /// `Exhausted → Cooling` for a window of `window_ms`.
    pub fn start(self, now_ms: u64, window_ms: u64) -> Self {
        Self {
            end_time: Some(now_ms.saturating_add(window_ms)),
            triggered: true,
            ..self
        }
    }

    /// Enter `Cooling` from a server rate limit. An already running cooldown
    /// is only ever extended.
    pub fn start_from_server(self, now_ms: u64, cooldown_seconds: u64) -> Self {
        let end = now_ms.saturating_add(cooldown_seconds.saturating_mul(1000));
        Self {
            end_time: Some(self.end_time.map_or(end, |current| current.max(end))),
            triggered: true,
            ..self
        }
    }

    /// Whether a running cooldown has reached its end.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.end_time.is_some_and(|end| now_ms >= end)
    }

    /// Time left in the running cooldown.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.end_time.map_or(0, |end| end.saturating_sub(now_ms))
    }

    /// `Cooling → Idle`. The selection must be recomputed before
    /// [`initialize`](Self::initialize) re-arms exhaustion detection.
    pub fn expire(self) -> Self {
        Self {
            end_time: None,
            triggered: false,
            initialized: false,
        }
    }

    /// Mark the selection as (re)populated.
    pub fn initialize(self) -> Self {
        Self {
            initialized: true,
            ..self
        }
    }
}

/// Cooldown states keyed by identity cooldown key.
pub type CooldownBook = HashMap<String, CooldownState>;

/// Look up the state of `identity`.
pub fn cooldown_for(book: &CooldownBook, identity: &VoterIdentity) -> CooldownState {
    book.get(&identity.cooldown_key()).copied().unwrap_or_default()
}

/// Copy a running cooldown from the outgoing identity to the incoming one.
///
/// Logging out cannot shed an active cooldown. The incoming identity keeps
/// its own state when the outgoing one is not cooling.
pub fn carry_over(book: &CooldownBook, outgoing: &VoterIdentity, incoming: &VoterIdentity) -> CooldownBook {
    let mut next = book.clone();
    if outgoing == incoming {
        return next;
    }

    let from = cooldown_for(book, outgoing);
    if let Some(end) = from.end_time {
        let to = cooldown_for(book, incoming);
        next.insert(
            incoming.cooldown_key(),
            CooldownState {
                end_time: Some(to.end_time.map_or(end, |current| current.max(end))),
                triggered: true,
                initialized: to.initialized,
            },
        );
    }
    next
}

/// Whether a guest has used up their votes. Inclusive: reaching the limit
/// is enough.
pub const fn is_at_limit(guest_vote_count: u32, limit: u32) -> bool {
    guest_vote_count >= limit
}
