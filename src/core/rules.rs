//! Rule Engine: ordered first-match-wins moderation table
//!
//! Order:
//! 1. Privileged commands (mode toggles, bot check, shoutouts)
//! 2. Support events (bits, subscription renewals)
//! 3. Nuke gate
//! 4-10. Content violations (link, script, language, length, policy, spam, bad actor)
//! 11. Interactive commands (8-ball, dungeon)
//! 12-13. Heuristics (harassment, sensitive topics)
//! 14. Rate-limited broadcasts (merch, social)
//!
//! Classification is pure; only the winning rule's action touches state
//! (penalty store, mode flags, broadcast cooldowns, RNG).

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::config::BotConfig;
use crate::core::modes::{BroadcastCooldowns, ModerationModes};
use crate::core::patterns;
use crate::core::penalty::PenaltyStore;
use crate::types::{ChatMessage, Decision, ModAction, ModeFlag, ModeFlags, RuleKind};
use crate::{
    DUNGEON_TIMEOUT_SECS, LENGTH_LIMIT_CHARS, NUKE_FOLLOWERS_DAYS, NUKE_SLOW_MODE_SECS,
    NUKE_TIMEOUT_SECS,
};

/// Everything a predicate may look at
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub message: &'a ChatMessage,
    pub modes: ModeFlags,
    pub approved_domains: &'a [String],
    pub bot_nick: &'a str,
}

impl<'a> RuleContext<'a> {
    fn text(&self) -> &'a str {
        &self.message.text
    }

    fn sender(&self) -> &'a str {
        &self.message.sender
    }
}

/// What happens when a rule wins
#[derive(Clone, Copy)]
pub enum RuleAction {
    /// Set a mode flag, then emit the follow-up actions
    Toggle {
        flag: ModeFlag,
        value: bool,
        effects: fn(&RuleContext) -> Vec<ModAction>,
    },
    /// Emit fixed or templated actions
    Respond(fn(&RuleContext) -> Vec<ModAction>),
    /// Timeout with the sender's current ladder duration, then escalate
    EscalatingTimeout,
    /// Timeout with a fixed duration; does not touch the penalty store
    FixedTimeout(u64),
    Ban,
    /// `@sender <answer>` with a uniformly random answer
    RandomReply(&'static [&'static str]),
    /// Send all lines unless the same broadcast fired within the cooldown
    Broadcast(&'static [&'static str]),
}

/// One row of the moderation table
#[derive(Clone, Copy)]
pub struct Rule {
    pub kind: RuleKind,
    pub matches: fn(&RuleContext) -> bool,
    pub action: RuleAction,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

// =============================================================================
// The table
// =============================================================================

pub const RULES: &[Rule] = &[
    // 1. Privileged commands
    Rule {
        kind: RuleKind::NukeOn,
        matches: |c| privileged(c, "!nukeon"),
        action: RuleAction::Toggle {
            flag: ModeFlag::Nuke,
            value: true,
            effects: nuke_on_effects,
        },
    },
    Rule {
        kind: RuleKind::NukeOff,
        matches: |c| privileged(c, "!nukeoff"),
        action: RuleAction::Toggle {
            flag: ModeFlag::Nuke,
            value: false,
            effects: nuke_off_effects,
        },
    },
    Rule {
        kind: RuleKind::RelaxedLanguageOn,
        matches: |c| privileged(c, "!russianon"),
        action: RuleAction::Toggle {
            flag: ModeFlag::RelaxedLanguage,
            value: true,
            effects: |c| {
                vec![ModAction::say(format!("Russian Text ENABLED in Chat @{}", c.sender()))]
            },
        },
    },
    Rule {
        kind: RuleKind::RelaxedLanguageOff,
        matches: |c| privileged(c, "!russianoff"),
        action: RuleAction::Toggle {
            flag: ModeFlag::RelaxedLanguage,
            value: false,
            effects: |c| {
                vec![ModAction::say(format!("Russian Text DISABLED in Chat @{}", c.sender()))]
            },
        },
    },
    Rule {
        kind: RuleKind::BotCheck,
        matches: |c| {
            c.message.flags.can_command()
                && patterns::is_command(c.text(), &format!("@{} ping", c.bot_nick))
        },
        action: RuleAction::Respond(|c| vec![ModAction::say(format!("@{} pong", c.sender()))]),
    },
    Rule {
        kind: RuleKind::MediaShareOn,
        matches: |c| privileged(c, "!mediashareon"),
        action: RuleAction::Toggle {
            flag: ModeFlag::MediaAnnounce,
            value: true,
            effects: |_| vec![ModAction::say(patterns::MEDIA_SHARE_ANNOUNCEMENT)],
        },
    },
    Rule {
        kind: RuleKind::MediaShareOff,
        matches: |c| privileged(c, "!mediashareoff"),
        action: RuleAction::Toggle {
            flag: ModeFlag::MediaAnnounce,
            value: false,
            effects: |_| Vec::new(),
        },
    },
    Rule {
        kind: RuleKind::Shoutout,
        matches: |c| privileged(c, "!shoutout"),
        action: RuleAction::Respond(|_| say_all(patterns::SHOUTOUT_LINES)),
    },
    Rule {
        kind: RuleKind::ShoutoutRu,
        matches: |c| privileged(c, "!shoutoutru"),
        action: RuleAction::Respond(|_| say_all(patterns::SHOUTOUT_RU_LINES)),
    },
    // 2. Support events
    Rule {
        kind: RuleKind::BitsThanks,
        matches: |c| c.message.flags.bits.is_some(),
        action: RuleAction::Respond(|c| {
            let bits = c.message.flags.bits.unwrap_or_default();
            vec![ModAction::say(format!(
                "/me {}, Thanks for the {} bits FeelsGoodMan Clap",
                c.sender(),
                bits
            ))]
        }),
    },
    Rule {
        kind: RuleKind::SubThanks,
        matches: |c| c.message.flags.sub_months.is_some(),
        action: RuleAction::Respond(|c| {
            let months = c.message.flags.sub_months.unwrap_or_default();
            vec![ModAction::say(format!(
                "/me Thanks for the {} months, {} VaN :v:",
                months,
                c.sender()
            ))]
        }),
    },
    // 3. Nuke gate
    Rule {
        kind: RuleKind::NukeGate,
        matches: |c| c.modes.nuke_active && !c.message.flags.is_elevated(),
        action: RuleAction::FixedTimeout(NUKE_TIMEOUT_SECS),
    },
    // 4-10. Content violations
    Rule {
        kind: RuleKind::UnapprovedLink,
        matches: |c| {
            !c.message.flags.is_elevated()
                && patterns::link_hosts(c.text())
                    .iter()
                    .any(|h| !patterns::is_approved_host(h, c.approved_domains))
        },
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::DisallowedScript,
        matches: |c| !c.modes.relaxed_language_active && patterns::has_cyrillic(c.text()),
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::ForeignLanguage,
        matches: |c| {
            !c.modes.relaxed_language_active
                && patterns::is_foreign_language(c.text())
                && !patterns::is_timezone(c.text())
        },
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::Length,
        matches: |c| c.text().chars().count() >= LENGTH_LIMIT_CHARS,
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::PolicyViolation,
        matches: |c| patterns::is_policy_violation(c.text()),
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::Spam,
        matches: |c| patterns::is_spam(c.text()),
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::BadActor,
        matches: |c| patterns::is_bad_actor(c.text()),
        action: RuleAction::Ban,
    },
    // 11. Interactive commands
    Rule {
        kind: RuleKind::MagicEightBall,
        matches: |c| patterns::is_eight_ball(c.text()),
        action: RuleAction::RandomReply(patterns::EIGHT_BALL_ANSWERS),
    },
    Rule {
        kind: RuleKind::Dungeon,
        matches: |c| patterns::is_dungeon(c.text()),
        action: RuleAction::Respond(|c| {
            vec![
                ModAction::timeout(c.sender(), DUNGEON_TIMEOUT_SECS),
                ModAction::say(format!("/me {} has entered the dungeon VaN", c.sender())),
            ]
        }),
    },
    // 12-13. Heuristics
    Rule {
        kind: RuleKind::Harassment,
        matches: |c| patterns::is_harassment(c.text()),
        action: RuleAction::EscalatingTimeout,
    },
    Rule {
        kind: RuleKind::SensitiveTopic,
        matches: |c| patterns::is_sensitive_topic(c.text()),
        action: RuleAction::EscalatingTimeout,
    },
    // 14. Broadcasts
    Rule {
        kind: RuleKind::MerchBroadcast,
        matches: |c| patterns::is_command(c.text(), "!merch"),
        action: RuleAction::Broadcast(patterns::MERCH_LINES),
    },
    Rule {
        kind: RuleKind::SocialBroadcast,
        matches: |c| patterns::is_command(c.text(), "!social"),
        action: RuleAction::Broadcast(patterns::SOCIAL_LINES),
    },
];

fn privileged(c: &RuleContext, command: &str) -> bool {
    c.message.flags.can_command() && patterns::is_command(c.text(), command)
}

fn say_all(lines: &[&str]) -> Vec<ModAction> {
    lines.iter().map(|l| ModAction::say(*l)).collect()
}

fn nuke_on_effects(_: &RuleContext) -> Vec<ModAction> {
    vec![
        ModAction::say(patterns::NUKE_ANNOUNCEMENT),
        ModAction::SlowMode { secs: NUKE_SLOW_MODE_SECS },
        ModAction::FollowersOnly { min_follow_secs: Some(NUKE_FOLLOWERS_DAYS * 86_400) },
        ModAction::SubscribersOnly { enabled: true },
    ]
}

fn nuke_off_effects(_: &RuleContext) -> Vec<ModAction> {
    vec![
        ModAction::SlowMode { secs: 0 },
        ModAction::FollowersOnly { min_follow_secs: None },
        ModAction::SubscribersOnly { enabled: false },
    ]
}

/// First rule whose predicate holds, without running any action.
///
/// Returns `None` for messages with no sender, and for messages with no text
/// unless they carry a support event.
pub fn classify(ctx: &RuleContext) -> Option<&'static Rule> {
    if ctx.sender().is_empty() {
        return None;
    }
    if ctx.text().is_empty() && !ctx.message.flags.has_support_event() {
        return None;
    }
    RULES.iter().find(|rule| (rule.matches)(ctx))
}

// =============================================================================
// Engine
// =============================================================================

/// Rule table bound to the long-lived moderation state
#[derive(Debug)]
pub struct RuleEngine {
    penalties: Arc<PenaltyStore>,
    modes: Arc<ModerationModes>,
    cooldowns: BroadcastCooldowns,
    approved_domains: Vec<String>,
    bot_nick: String,
    rng: Mutex<StdRng>,
}

impl RuleEngine {
    /// Create engine sharing `penalties` and `modes` with the background tasks
    pub fn new(
        config: &BotConfig,
        penalties: Arc<PenaltyStore>,
        modes: Arc<ModerationModes>,
    ) -> Self {
        Self {
            penalties,
            modes,
            cooldowns: BroadcastCooldowns::default(),
            approved_domains: config.approved_domains.clone(),
            bot_nick: config.nick.clone(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Engine with fresh state, for tools and tests
    pub fn standalone(config: &BotConfig) -> Self {
        Self::new(config, Arc::new(PenaltyStore::new()), Arc::new(ModerationModes::new()))
    }

    /// Make random replies reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn penalties(&self) -> &Arc<PenaltyStore> {
        &self.penalties
    }

    pub fn modes(&self) -> &Arc<ModerationModes> {
        &self.modes
    }

    /// Evaluate now
    pub fn evaluate(&self, message: &ChatMessage) -> Decision {
        self.evaluate_at(message, Utc::now())
    }

    /// Evaluate `message` at `now` and run the winning rule's action
    pub fn evaluate_at(&self, message: &ChatMessage, now: DateTime<Utc>) -> Decision {
        let ctx = RuleContext {
            message,
            modes: self.modes.snapshot(),
            approved_domains: &self.approved_domains,
            bot_nick: &self.bot_nick,
        };

        let Some(rule) = classify(&ctx) else {
            return Decision::none(now);
        };

        let actions = self.execute(rule, &ctx, now);
        debug!(
            rule = rule.kind.code(),
            sender = %message.sender,
            actions = actions.len(),
            "rule matched"
        );
        Decision::new(rule.kind, actions, now)
    }

    fn execute(&self, rule: &Rule, ctx: &RuleContext, now: DateTime<Utc>) -> Vec<ModAction> {
        match rule.action {
            RuleAction::Toggle { flag, value, effects } => {
                self.modes.set(flag, value);
                effects(ctx)
            }
            RuleAction::Respond(respond) => respond(ctx),
            RuleAction::EscalatingTimeout => {
                let secs = self.penalties.apply_offense_at(ctx.sender(), now);
                vec![ModAction::timeout(ctx.sender(), secs)]
            }
            RuleAction::FixedTimeout(secs) => vec![ModAction::timeout(ctx.sender(), secs)],
            RuleAction::Ban => vec![ModAction::ban(ctx.sender())],
            RuleAction::RandomReply(answers) => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                answers
                    .choose(&mut *rng)
                    .map(|answer| vec![ModAction::say(format!("@{} {}", ctx.sender(), answer))])
                    .unwrap_or_default()
            }
            RuleAction::Broadcast(lines) => {
                if self.cooldowns.try_fire(rule.kind, now) {
                    say_all(lines)
                } else {
                    debug!(rule = rule.kind.code(), "broadcast suppressed by cooldown");
                    Vec::new()
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
