//! Moderation actions and their chat-command encoding

use serde::{Deserialize, Serialize};

/// A single action the bot performs in the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModAction {
    /// Temporarily mute a chatter
    Timeout { user: String, secs: u64 },
    /// Permanently ban a chatter
    Ban { user: String },
    /// Slow mode; 0 turns it off
    SlowMode { secs: u64 },
    /// Followers-only mode with a minimum follow age; `None` turns it off
    FollowersOnly { min_follow_secs: Option<u64> },
    /// Subscribers-only mode
    SubscribersOnly { enabled: bool },
    /// Plain chat message
    Say { text: String },
}

impl ModAction {
    pub fn timeout(user: impl Into<String>, secs: u64) -> Self {
        Self::Timeout { user: user.into(), secs }
    }

    pub fn ban(user: impl Into<String>) -> Self {
        Self::Ban { user: user.into() }
    }

    pub fn say(text: impl Into<String>) -> Self {
        Self::Say { text: text.into() }
    }

    /// Encode as the chat payload the service expects
    pub fn to_chat_payload(&self) -> String {
        match self {
            Self::Timeout { user, secs } => format!("/timeout {} {}", user, secs),
            Self::Ban { user } => format!("/ban {}", user),
            Self::SlowMode { secs: 0 } => "/slowoff".to_string(),
            Self::SlowMode { secs } => format!("/slow {}", secs),
            Self::FollowersOnly { min_follow_secs: None } => "/followersoff".to_string(),
            Self::FollowersOnly { min_follow_secs: Some(secs) } => {
                format!("/followers {}", format_follow_age(*secs))
            }
            Self::SubscribersOnly { enabled: true } => "/subscribers".to_string(),
            Self::SubscribersOnly { enabled: false } => "/subscribersoff".to_string(),
            Self::Say { text } => text.clone(),
        }
    }
}

/// Largest whole unit: `3d`, `12h`, or minutes
fn format_follow_age(secs: u64) -> String {
    if secs >= 86_400 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}m", secs / 60)
    }
}
