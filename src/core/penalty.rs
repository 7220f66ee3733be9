//! Chatter Penalty Store: escalating timeouts with time-based decay
//!
//! Ladder: 5s → 30s → 300s (then 300s). A chatter with no penalty for the
//! decay window returns to 5s on the next decay pass.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::types::ChatterState;

/// Concurrent map from sender identity to penalty state.
///
/// Lookups share a read lock; escalation and decay take the write lock, so a
/// reader never sees a half-reset entry and concurrent offenses by the same
/// chatter are serialized.
#[derive(Debug, Default)]
pub struct PenaltyStore {
    chatters: RwLock<HashMap<String, ChatterState>>,
}

impl PenaltyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an offense now
    pub fn apply_offense(&self, identity: &str) -> u64 {
        self.apply_offense_at(identity, Utc::now())
    }

    /// Record an offense at `now`: returns the timeout to apply, then escalates.
    ///
    /// The chatter entry is created on first offense.
    pub fn apply_offense_at(&self, identity: &str, now: DateTime<Utc>) -> u64 {
        let mut chatters = self.chatters.write().unwrap_or_else(PoisonError::into_inner);
        let state = chatters
            .entry(identity.to_string())
            .or_insert_with(|| ChatterState::new(identity, now));
        let applied = state.escalate(now);
        debug!(
            identity,
            applied,
            next = state.current_duration,
            offenses = state.offense_count,
            "offense recorded"
        );
        applied
    }

    /// Reset every chatter whose last penalty is at least `window` before `now`.
    ///
    /// Returns how many entries were reset.
    pub fn decay_pass(&self, now: DateTime<Utc>, window: Duration) -> usize {
        let mut chatters = self.chatters.write().unwrap_or_else(PoisonError::into_inner);
        let mut reset = 0;
        for state in chatters.values_mut() {
            if !state.is_at_base() && state.is_stale(now, window) {
                state.reset();
                reset += 1;
            }
        }
        if reset > 0 {
            debug!(reset, tracked = chatters.len(), "decay pass");
        }
        reset
    }

    /// Copy of one chatter's state
    pub fn lookup(&self, identity: &str) -> Option<ChatterState> {
        self.chatters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Timeout the chatter would receive for their next offense
    pub fn next_duration(&self, identity: &str) -> u64 {
        self.lookup(identity)
            .map(|s| s.current_duration)
            .unwrap_or(crate::BASE_TIMEOUT_SECS)
    }

    /// Number of tracked chatters
    pub fn len(&self) -> usize {
        self.chatters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
