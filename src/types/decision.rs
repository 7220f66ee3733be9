//! Rule identifiers and the per-message decision

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ModAction;

/// Every rule in the moderation table, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    // =========================================================================
    // C: Privileged commands
    // =========================================================================
    NukeOn,
    NukeOff,
    RelaxedLanguageOn,
    RelaxedLanguageOff,
    BotCheck,
    MediaShareOn,
    MediaShareOff,
    Shoutout,
    ShoutoutRu,

    // =========================================================================
    // E: Support events
    // =========================================================================
    BitsThanks,
    SubThanks,

    // =========================================================================
    // N: Nuke gate
    // =========================================================================
    NukeGate,

    // =========================================================================
    // V: Content violations
    // =========================================================================
    UnapprovedLink,
    DisallowedScript,
    ForeignLanguage,
    Length,
    PolicyViolation,
    Spam,
    BadActor,

    // =========================================================================
    // I: Interactive commands
    // =========================================================================
    MagicEightBall,
    Dungeon,

    // =========================================================================
    // H: Heuristics
    // =========================================================================
    Harassment,
    SensitiveTopic,

    // =========================================================================
    // B: Rate-limited broadcasts
    // =========================================================================
    MerchBroadcast,
    SocialBroadcast,

    /// No rule matched
    NoMatch,
}

impl RuleKind {
    /// Code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::NukeOn => "C01_NUKE_ON",
            Self::NukeOff => "C02_NUKE_OFF",
            Self::RelaxedLanguageOn => "C03_RELAXED_ON",
            Self::RelaxedLanguageOff => "C04_RELAXED_OFF",
            Self::BotCheck => "C05_BOT_CHECK",
            Self::MediaShareOn => "C06_MEDIA_ON",
            Self::MediaShareOff => "C07_MEDIA_OFF",
            Self::Shoutout => "C08_SHOUTOUT",
            Self::ShoutoutRu => "C09_SHOUTOUT_RU",
            Self::BitsThanks => "E01_BITS",
            Self::SubThanks => "E02_SUB",
            Self::NukeGate => "N01_NUKE_GATE",
            Self::UnapprovedLink => "V01_LINK",
            Self::DisallowedScript => "V02_SCRIPT",
            Self::ForeignLanguage => "V03_LANGUAGE",
            Self::Length => "V04_LENGTH",
            Self::PolicyViolation => "V05_POLICY",
            Self::Spam => "V06_SPAM",
            Self::BadActor => "V07_BAD_ACTOR",
            Self::MagicEightBall => "I01_8BALL",
            Self::Dungeon => "I02_DUNGEON",
            Self::Harassment => "H01_HARASSMENT",
            Self::SensitiveTopic => "H02_SENSITIVE",
            Self::MerchBroadcast => "B01_MERCH",
            Self::SocialBroadcast => "B02_SOCIAL",
            Self::NoMatch => "X00_NO_MATCH",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::NukeOn => "Nuke mode enabled",
            Self::NukeOff => "Nuke mode disabled",
            Self::RelaxedLanguageOn => "Foreign-language filter disabled",
            Self::RelaxedLanguageOff => "Foreign-language filter enabled",
            Self::BotCheck => "Moderator liveness check",
            Self::MediaShareOn => "Media-share announcements enabled",
            Self::MediaShareOff => "Media-share announcements disabled",
            Self::Shoutout => "Shoutout information",
            Self::ShoutoutRu => "Shoutout information (Russian)",
            Self::BitsThanks => "Thanks for bits",
            Self::SubThanks => "Thanks for subscription renewal",
            Self::NukeGate => "Blanket timeout during nuke mode",
            Self::UnapprovedLink => "Link to an unapproved domain",
            Self::DisallowedScript => "Disallowed script",
            Self::ForeignLanguage => "Restricted secondary language",
            Self::Length => "Message too long",
            Self::PolicyViolation => "Terms-of-service violation",
            Self::Spam => "Spam keyword",
            Self::BadActor => "Known bad-actor signature",
            Self::MagicEightBall => "Magic 8-ball answer",
            Self::Dungeon => "Entered the dungeon",
            Self::Harassment => "Targeted shoutout request",
            Self::SensitiveTopic => "Sensitive current-events topic",
            Self::MerchBroadcast => "Merch links",
            Self::SocialBroadcast => "Social links",
            Self::NoMatch => "No rule matched",
        }
    }

    /// Rule mutates moderation mode state
    pub fn is_mode_toggle(&self) -> bool {
        matches!(
            self,
            Self::NukeOn
                | Self::NukeOff
                | Self::RelaxedLanguageOn
                | Self::RelaxedLanguageOff
                | Self::MediaShareOn
                | Self::MediaShareOff
        )
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// Outcome of evaluating one message: the winning rule and its actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub rule: RuleKind,
    pub actions: Vec<ModAction>,
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(rule: RuleKind, actions: Vec<ModAction>, decided_at: DateTime<Utc>) -> Self {
        Self { rule, actions, decided_at }
    }

    /// No rule matched
    pub fn none(decided_at: DateTime<Utc>) -> Self {
        Self::new(RuleKind::NoMatch, Vec::new(), decided_at)
    }

    /// Nothing to send
    pub fn is_none(&self) -> bool {
        self.actions.is_empty()
    }

    /// Timeout seconds, when the decision times someone out
    pub fn timeout_secs(&self) -> Option<u64> {
        self.actions.iter().find_map(|a| match a {
            ModAction::Timeout { secs, .. } => Some(*secs),
            _ => None,
        })
    }

    /// Parseable one-line summary (no colors)
    pub fn to_parseable_string(&self) -> String {
        let actions: Vec<String> = self.actions.iter().map(|a| a.to_chat_payload()).collect();
        format!("rule={} | actions=[{}]", self.rule.code(), actions.join(" ; "))
    }
}
