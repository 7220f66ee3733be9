//! Chatwarden: automated moderator for a single live-chat channel
//!
//! Raw IRC line → Dispatcher → RuleEngine (PenaltyStore + ModerationModes)
//! → Decision → Session (encoded chat commands)

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::{load_secret_token, BotConfig};
pub use error::BotError;

// =============================================================================
// PENALTY LADDER - timeout seconds for the 1st, 2nd and 3rd+ offense
// =============================================================================

/// Timeout ladder applied to repeat offenders inside the decay window
pub const PENALTY_LADDER_SECS: [u64; 3] = [5, 30, 300];

/// Base timeout (first offense, and first offense after decay)
pub const BASE_TIMEOUT_SECS: u64 = PENALTY_LADDER_SECS[0];

/// Seconds without a penalty after which a chatter decays back to base
pub const DECAY_WINDOW_SECS: i64 = 300;

/// How often the decay pass runs
pub const DECAY_INTERVAL_SECS: u64 = 20;

// =============================================================================
// MODE & RULE CONSTANTS
// =============================================================================

/// Blanket timeout while nuke mode is active
pub const NUKE_TIMEOUT_SECS: u64 = 30;

/// Slow-mode seconds applied when nuke mode starts
pub const NUKE_SLOW_MODE_SECS: u64 = 30;

/// Followers-only minimum account follow age applied when nuke mode starts
pub const NUKE_FOLLOWERS_DAYS: u64 = 3;

/// Timeout for the dungeon `!enter` command
pub const DUNGEON_TIMEOUT_SECS: u64 = 300;

/// Messages with this many characters or more are a violation
pub const LENGTH_LIMIT_CHARS: usize = 400;

/// Minimum gap between two broadcasts of the same kind
pub const BROADCAST_COOLDOWN_SECS: i64 = 20;

/// Media-share announcement interval (17 minutes)
pub const ANNOUNCE_INTERVAL_SECS: u64 = 17 * 60;

// =============================================================================
// RECONNECT BACKOFF
// =============================================================================

/// First wait after a failed connect attempt
pub const BACKOFF_INITIAL_SECS: u64 = 2;

/// Upper bound for the doubling backoff
pub const BACKOFF_CAP_SECS: u64 = 300;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
