//! Process-wide moderation modes and broadcast cooldowns
//!
//! Both outlive any single connection; reconnects never reset them.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::types::{ModeFlag, ModeFlags, RuleKind};
use crate::BROADCAST_COOLDOWN_SECS;

/// Read-mostly moderation mode flags
#[derive(Debug, Default)]
pub struct ModerationModes {
    flags: RwLock<ModeFlags>,
}

impl ModerationModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current flags
    pub fn snapshot(&self) -> ModeFlags {
        *self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self, flag: ModeFlag) -> bool {
        self.snapshot().get(flag)
    }

    /// Set `flag`, returning its previous value
    pub fn set(&self, flag: ModeFlag, value: bool) -> bool {
        let mut flags = self.flags.write().unwrap_or_else(PoisonError::into_inner);
        let previous = flags.set(flag, value);
        if previous != value {
            info!(?flag, value, "moderation mode changed");
        }
        previous
    }
}

/// Last-fired timestamps for rate-limited broadcasts, shared by all chatters
#[derive(Debug)]
pub struct BroadcastCooldowns {
    last_fired: Mutex<HashMap<RuleKind, DateTime<Utc>>>,
    cooldown: Duration,
}

impl Default for BroadcastCooldowns {
    fn default() -> Self {
        Self::new(Duration::seconds(BROADCAST_COOLDOWN_SECS))
    }
}

impl BroadcastCooldowns {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fired: Mutex::new(HashMap::new()),
            cooldown,
        }
    }

    /// Claim the broadcast slot for `kind` at `now`.
    ///
    /// Returns `false` while the previous broadcast of the same kind is
    /// still inside the cooldown; the timestamp is then left untouched.
    pub fn try_fire(&self, kind: RuleKind, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.last_fired.lock().unwrap_or_else(PoisonError::into_inner);
        match last_fired.get(&kind) {
            Some(last) if now - *last < self.cooldown => false,
            _ => {
                last_fired.insert(kind, now);
                true
            }
        }
    }
}
