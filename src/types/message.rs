//! Structural fields of an inbound chat line

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata flags carried in the IRCv3 tag block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFlags {
    /// Channel owner badge
    pub broadcaster: bool,
    /// Moderator badge
    pub moderator: bool,
    /// VIP badge
    pub vip: bool,
    /// Bits cheered with this message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits: Option<u64>,
    /// Cumulative months on a subscription renewal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_months: Option<u64>,
}

impl MessageFlags {
    /// Build flags from parsed tags; unknown or malformed values are ignored
    pub fn from_tags(tags: &HashMap<String, String>) -> Self {
        let mut flags = Self::default();

        if let Some(badges) = tags.get("badges") {
            for badge in badges.split(',') {
                let name = badge.split('/').next().unwrap_or("");
                match name {
                    "broadcaster" => flags.broadcaster = true,
                    "moderator" => flags.moderator = true,
                    "vip" => flags.vip = true,
                    _ => {}
                }
            }
        }

        flags.bits = tags
            .get("bits")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0);
        flags.sub_months = tags
            .get("msg-param-cumulative-months")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|n| *n > 0);

        flags
    }

    /// May issue moderator commands
    pub fn can_command(&self) -> bool {
        self.broadcaster || self.moderator
    }

    /// Exempt from nuke mode and the link check
    pub fn is_elevated(&self) -> bool {
        self.can_command() || self.vip
    }

    /// Carries a monetary-support event
    pub fn has_support_event(&self) -> bool {
        self.bits.is_some() || self.sub_months.is_some()
    }
}

/// One inbound chat message after extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender identity, case as received; empty when extraction failed
    pub sender: String,
    pub flags: MessageFlags,
    /// Message body; empty when extraction failed
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, flags: MessageFlags, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            flags,
            text: text.into(),
        }
    }

    /// Message from a sender with no badges
    pub fn plain(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(sender, MessageFlags::default(), text)
    }

    /// Message from a moderator
    pub fn moderator(sender: impl Into<String>, text: impl Into<String>) -> Self {
        let flags = MessageFlags {
            moderator: true,
            ..MessageFlags::default()
        };
        Self::new(sender, flags, text)
    }

    /// Message from a VIP
    pub fn vip(sender: impl Into<String>, text: impl Into<String>) -> Self {
        let flags = MessageFlags {
            vip: true,
            ..MessageFlags::default()
        };
        Self::new(sender, flags, text)
    }
}
