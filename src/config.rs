//! Bot configuration and credential loading

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::patterns::DEFAULT_APPROVED_DOMAINS;
use crate::BotError;

/// Runtime configuration shared by the session and the rule engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// IRC server host
    pub host: String,
    /// IRC server port
    pub port: u16,
    /// Wrap the connection in TLS
    pub tls: bool,
    /// Login name of the bot account
    pub nick: String,
    /// Channel name without the leading `#`
    pub channel: String,
    /// Domains that may be linked by anyone
    pub approved_domains: Vec<String>,
    /// Optional chat line sent after every successful join
    pub greeting: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            host: "irc.chat.twitch.tv".to_string(),
            port: 6697,
            tls: true,
            nick: "chatwarden".to_string(),
            channel: "vansamaofficial".to_string(),
            approved_domains: DEFAULT_APPROVED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            greeting: None,
        }
    }
}

impl BotConfig {
    /// Normalise user input and reject configurations the session cannot use
    pub fn validate(mut self) -> Result<Self, BotError> {
        self.nick = self.nick.trim().to_lowercase();
        self.channel = self.channel.trim().trim_start_matches('#').to_lowercase();
        self.approved_domains = self
            .approved_domains
            .iter()
            .map(|d| d.trim().trim_start_matches("www.").to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        if self.nick.is_empty() {
            return Err(BotError::Config("nick must not be empty".to_string()));
        }
        if self.channel.is_empty() {
            return Err(BotError::Config("channel must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(BotError::Config("host must not be empty".to_string()));
        }
        Ok(self)
    }
}

/// Read the session token from `path`.
///
/// The returned token never carries the `oauth:` prefix; the handshake adds it.
pub fn load_secret_token(path: &Path) -> Result<String, BotError> {
    let raw = fs::read_to_string(path).map_err(|source| BotError::Credential {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim();
    let token = token.strip_prefix("oauth:").unwrap_or(token);
    if token.is_empty() {
        return Err(BotError::EmptyCredential(path.to_path_buf()));
    }
    Ok(token.to_string())
}
