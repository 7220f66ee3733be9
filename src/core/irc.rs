//! IRC line parsing and outbound encoding
//!
//! `@tags :prefix COMMAND middle params :trailing`. Parsing never fails;
//! missing pieces come back empty.

use std::collections::HashMap;

use crate::types::{ChatMessage, MessageFlags, ModAction};

/// One parsed protocol line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrcLine {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcLine {
    pub fn parse(raw: &str) -> Self {
        let mut rest = raw.trim_end_matches(['\r', '\n']);
        let mut line = Self::default();

        if let Some(stripped) = rest.strip_prefix('@') {
            let (tags, tail) = split_word(stripped);
            line.tags = parse_tags(tags);
            rest = tail;
        }

        if let Some(stripped) = rest.strip_prefix(':') {
            let (prefix, tail) = split_word(stripped);
            line.prefix = Some(prefix.to_string());
            rest = tail;
        }

        let (command, mut rest) = split_word(rest);
        line.command = command.to_ascii_uppercase();

        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                line.params.push(trailing.to_string());
                break;
            }
            let (param, tail) = split_word(rest);
            line.params.push(param.to_string());
            rest = tail;
        }

        line
    }

    /// Nick part of the prefix (`nick!user@host`)
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        let (nick, _) = prefix.split_once('!')?;
        if nick.is_empty() {
            None
        } else {
            Some(nick)
        }
    }

    /// Last parameter, usually the trailing text
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    pub fn is_ping(&self) -> bool {
        self.command == "PING"
    }

    /// Server asks the client to reconnect
    pub fn is_reconnect(&self) -> bool {
        self.command == "RECONNECT"
    }

    /// Extract sender, flags and text for chat addressed to `channel`
    pub fn to_chat_message(&self, channel: &str) -> ChatMessage {
        let flags = MessageFlags::from_tags(&self.tags);

        let sender = self
            .nick()
            .or_else(|| self.tags.get("login").map(String::as_str))
            .or_else(|| self.tags.get("display-name").map(String::as_str))
            .unwrap_or("")
            .to_string();

        let addressed = self
            .params
            .first()
            .map(|target| target.trim_start_matches('#').eq_ignore_ascii_case(channel))
            .unwrap_or(false);

        let text = match self.command.as_str() {
            "PRIVMSG" | "USERNOTICE" if addressed && self.params.len() > 1 => {
                self.trailing().unwrap_or("").to_string()
            }
            _ => String::new(),
        };

        // Only chat lines carry a sender worth moderating
        let sender = match self.command.as_str() {
            "PRIVMSG" | "USERNOTICE" if addressed => sender,
            _ => String::new(),
        };

        ChatMessage { sender, flags, text }
    }
}

/// Split off the first space-delimited word
fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(' ') {
        Some((word, rest)) => (word, rest.trim_start_matches(' ')),
        None => (s, ""),
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|t| !t.is_empty())
        .map(|tag| match tag.split_once('=') {
            Some((k, v)) => (k.to_string(), unescape_tag(v)),
            None => (tag.to_string(), String::new()),
        })
        .collect()
}

/// IRCv3 tag value unescaping
fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

// =============================================================================
// Outbound encoding
// =============================================================================

/// Strip CR/LF so a payload can never start a second protocol line
fn sanitize(s: &str) -> String {
    s.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

pub fn pass(token: &str) -> String {
    format!("PASS oauth:{}", sanitize(token))
}

pub fn nick(nick: &str) -> String {
    format!("NICK {}", sanitize(nick))
}

pub fn cap_req() -> String {
    "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string()
}

pub fn join(channel: &str) -> String {
    format!("JOIN #{}", sanitize(channel))
}

pub fn pong(line: &IrcLine) -> String {
    match line.trailing() {
        Some(payload) => format!("PONG :{}", sanitize(payload)),
        None => "PONG".to_string(),
    }
}

pub fn quit(reason: &str) -> String {
    format!("QUIT :{}", sanitize(reason))
}

pub fn privmsg(channel: &str, payload: &str) -> String {
    format!("PRIVMSG #{} :{}", sanitize(channel), sanitize(payload))
}

/// Moderation action as a chat line
pub fn action(channel: &str, action: &ModAction) -> String {
    privmsg(channel, &action.to_chat_payload())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVMSG: &str = "@badge-info=;badges=moderator/1,subscriber/12;color=#FF0000;\
                           display-name=Alice;bits=100 \
                           :alice!alice@alice.tmi.twitch.tv PRIVMSG #vansamaofficial :hello there";

    #[test]
    fn test_parse_full_privmsg() {
        let line = IrcLine::parse(PRIVMSG);
        assert_eq!(line.command, "PRIVMSG");
        assert_eq!(line.nick(), Some("alice"));
        assert_eq!(line.params, vec!["#vansamaofficial".to_string(), "hello there".to_string()]);
        assert_eq!(line.tags.get("display-name").map(String::as_str), Some("Alice"));
    }

    #[test]
    fn test_chat_message_extraction() {
        let msg = IrcLine::parse(PRIVMSG).to_chat_message("vansamaofficial");
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.text, "hello there");
        assert!(msg.flags.moderator);
        assert_eq!(msg.flags.bits, Some(100));
    }

    #[test]
    fn test_other_channel_is_ignored() {
        let msg = IrcLine::parse(PRIVMSG).to_chat_message("elsewhere");
        assert!(msg.sender.is_empty());
        assert!(msg.text.is_empty());
    }

    #[test]
    fn test_ping() {
        let line = IrcLine::parse("PING :tmi.twitch.tv");
        assert!(line.is_ping());
        assert_eq!(pong(&line), "PONG :tmi.twitch.tv");
    }

    #[test]
    fn test_usernotice_falls_back_to_login() {
        let raw = "@login=bob;msg-id=resub;msg-param-cumulative-months=6 \
                   :tmi.twitch.tv USERNOTICE #vansamaofficial";
        let msg = IrcLine::parse(raw).to_chat_message("vansamaofficial");
        assert_eq!(msg.sender, "bob");
        assert_eq!(msg.text, "");
        assert_eq!(msg.flags.sub_months, Some(6));
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        for raw in ["", "   ", ":", "@", "@a=b", ":prefix-only"] {
            let msg = IrcLine::parse(raw).to_chat_message("vansamaofficial");
            assert!(msg.sender.is_empty(), "sender for {:?}", raw);
            assert!(msg.text.is_empty(), "text for {:?}", raw);
        }
    }

    #[test]
    fn test_tag_unescaping() {
        let line = IrcLine::parse(r"@system-msg=hello\sworld\:\\ :tmi.twitch.tv NOTICE");
        assert_eq!(line.tags.get("system-msg").map(String::as_str), Some(r"hello world;\"));
    }

    #[test]
    fn test_outbound_lines_are_sanitized() {
        assert_eq!(privmsg("chan", "hi\r\nQUIT"), "PRIVMSG #chan :hiQUIT");
        assert_eq!(pass("tok"), "PASS oauth:tok");
        assert_eq!(join("chan"), "JOIN #chan");
    }

    #[test]
    fn test_action_encoding() {
        assert_eq!(
            action("chan", &ModAction::timeout("alice", 5)),
            "PRIVMSG #chan :/timeout alice 5"
        );
    }
}
