//! Line Dispatcher: raw line → structural fields → Rule Engine

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::irc::{self, IrcLine};
use crate::core::rules::RuleEngine;
use crate::types::Decision;

/// What the session should do with one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep-alive reply to send as-is
    Pong(String),
    /// Server asked us to reconnect
    Reconnect,
    /// Moderation decision with at least one action
    Moderate(Decision),
    /// Nothing to do
    Ignore,
}

/// Routes inbound lines for one channel
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: Arc<RuleEngine>,
    channel: String,
}

impl Dispatcher {
    pub fn new(engine: Arc<RuleEngine>, channel: impl Into<String>) -> Self {
        Self {
            engine,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn engine(&self) -> &Arc<RuleEngine> {
        &self.engine
    }

    pub fn dispatch(&self, raw: &str) -> Dispatch {
        self.dispatch_at(raw, Utc::now())
    }

    pub fn dispatch_at(&self, raw: &str, now: DateTime<Utc>) -> Dispatch {
        debug!("> {}", raw);
        let line = IrcLine::parse(raw);

        if line.is_ping() {
            return Dispatch::Pong(irc::pong(&line));
        }
        if line.is_reconnect() {
            return Dispatch::Reconnect;
        }

        let message = line.to_chat_message(&self.channel);
        let decision = self.engine.evaluate_at(&message, now);
        if decision.is_none() {
            Dispatch::Ignore
        } else {
            Dispatch::Moderate(decision)
        }
    }
}
