//! Per-chatter penalty state

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::PENALTY_LADDER_SECS;

/// Escalation memory for one sender identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatterState {
    /// Sender identity, case-sensitive as received
    pub identity: String,
    /// Most recent penalty
    pub last_penalty_at: DateTime<Utc>,
    /// Seconds of the next timeout
    pub current_duration: u64,
    /// Offenses since the last decay
    pub offense_count: u32,
}

impl ChatterState {
    /// Fresh state at the base of the ladder
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            last_penalty_at: now,
            current_duration: PENALTY_LADDER_SECS[0],
            offense_count: 0,
        }
    }

    /// Record an offense: returns the duration to apply and climbs the ladder
    pub fn escalate(&mut self, now: DateTime<Utc>) -> u64 {
        let applied = self.current_duration;
        self.offense_count = self.offense_count.saturating_add(1);
        let step = (self.offense_count as usize).min(PENALTY_LADDER_SECS.len() - 1);
        self.current_duration = PENALTY_LADDER_SECS[step].max(applied);
        self.last_penalty_at = now;
        applied
    }

    /// No penalty for at least `window`
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.last_penalty_at >= window
    }

    /// Back to the base of the ladder
    pub fn reset(&mut self) {
        self.current_duration = PENALTY_LADDER_SECS[0];
        self.offense_count = 0;
    }

    /// Already at the base of the ladder
    pub fn is_at_base(&self) -> bool {
        self.offense_count == 0 && self.current_duration == PENALTY_LADDER_SECS[0]
    }
}
