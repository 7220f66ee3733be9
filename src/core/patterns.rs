//! Rule data: keyword tables, script ranges and canned responses
//!
//! Everything here is configuration; the rule engine only decides the order
//! in which these tables are consulted.

use lazy_static::lazy_static;
use regex::Regex;

/// Letters may repeat and be separated by punctuation: `f+\W*a+\W*g`
pub fn word_pattern(word: &str) -> String {
    let letters: Vec<String> = word.chars().map(|c| regex::escape(&c.to_string())).collect();
    format!(r"(?:\W|^){}", letters.join(r"+\W*"))
}

/// Letters may be separated by punctuation and the word must end: `b\W*e\W*z(\W|$)`
pub fn word_pattern_bounded(word: &str) -> String {
    let letters: Vec<String> = word.chars().map(|c| regex::escape(&c.to_string())).collect();
    format!(r"(?:\W|^){}(?:\W|$)", letters.join(r"\W*"))
}

/// Case-insensitive alternation of `patterns`
fn any_of(patterns: &[String]) -> Regex {
    let joined = patterns
        .iter()
        .map(|p| format!("(?:{})", p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){}", joined)).expect("rule table must compile")
}

// =============================================================================
// Keyword tables
// =============================================================================

/// Terms that violate or risk violating the platform's terms of service
const POLICY_RAW: &[&str] = &[
    r"(?:\W|^)(?:n\W*|И\W*)i\W*(?:g\W*)+(?:e\W*|y\W*)?r",
    r"(?:\W|^)(?:n\W*|И\W*)(?:i\W*|y\W*)(?:g\W*)+(?:\W|$|a)",
    r"p\W*(?:i\W*|e\W*)d\W*(?:o\W*|a\W*)*r\W*",
    r"п\PL*(?:и\PL*|й\PL*)д\PL*(?:о\PL*|а\PL*)р",
    r"п\PL*е\PL*д\PL*и\PL*к",
    r"н\PL*(?:и\PL*|й\PL*|е\PL*)г+\PL*(?:е\PL*|а\PL*)*р",
];
const POLICY_WORDS: &[&str] = &["fag", "peedor", "peedour", "pidrila", "retard", "tranny"];

/// Transliterated secondary-language keywords that must stand alone
const FOREIGN_BOUNDED: &[&str] = &[
    "bez", "cherez", "cho", "chto", "dela", "ebani", "ebat", "ectb", "est", "est'", "estb",
    "eto", "iz", "kak", "kto", "nad", "tut", "tyt", "vot", "za", "zaebis", "zaebal",
];
/// Transliterated secondary-language keywords matched as prefixes
const FOREIGN_WORDS: &[&str] = &[
    "kaifovo", "kogda", "meste", "pizdec", "pochemu", "po4emy", "poimal", "posle", "pered",
    "russkie", "ruskie", "ruskim", "slava", "vpered", "vperde", "vsem", "wsem",
];
const FOREIGN_RAW: &[&str] = &[r"(?:z\W*?)d\W*a\W*r\W*o\W*(?:v\W*|w\W*)a"];

const SPAM_WORDS: &[&str] = &["stray228", "flexair", "rat tv"];
const SPAM_BOUNDED: &[&str] = &["wewe", "veve", "aboba"];

lazy_static! {
    static ref RE_POLICY: Regex = {
        let mut patterns: Vec<String> = POLICY_RAW.iter().map(|p| p.to_string()).collect();
        patterns.extend(POLICY_WORDS.iter().map(|w| word_pattern(w)));
        any_of(&patterns)
    };

    static ref RE_FOREIGN: Regex = {
        let mut patterns: Vec<String> =
            FOREIGN_BOUNDED.iter().map(|w| word_pattern_bounded(w)).collect();
        patterns.extend(FOREIGN_WORDS.iter().map(|w| word_pattern(w)));
        patterns.extend(FOREIGN_RAW.iter().map(|p| p.to_string()));
        any_of(&patterns)
    };

    static ref RE_SPAM: Regex = {
        let mut patterns: Vec<String> = SPAM_WORDS.iter().map(|w| word_pattern(w)).collect();
        patterns.extend(SPAM_BOUNDED.iter().map(|w| word_pattern_bounded(w)));
        any_of(&patterns)
    };

    /// "est" next to a time of day is a timezone, not a keyword
    static ref RE_TIMEZONE: Regex = Regex::new(r"(?i)[0-9]\s?(?:[ap]m)? *est").unwrap();

    // =========================================================================
    // Scripts and signatures
    // =========================================================================
    static ref RE_CYRILLIC: Regex = Regex::new(r"[\x{0400}-\x{04FF}]").unwrap();
    static ref RE_CHEROKEE: Regex = Regex::new(r"[\x{13A0}-\x{13F4}]").unwrap();
    static ref RE_BAD_ACTOR: Regex =
        Regex::new(r"(?i)зачистка соледара прошла успешно, гойда!").unwrap();

    // =========================================================================
    // Links
    // =========================================================================
    // Authority after a scheme (may be empty), or after a bare `www.`
    static ref RE_URL: Regex =
        Regex::new(r"(?i)https?://([^\s/?#]*)|\bwww\.([^\s/?#]+)").unwrap();

    // =========================================================================
    // Harassment markers
    // =========================================================================
    static ref RE_SAY: Regex = Regex::new(r"(?i)(?:say|tell)\W").unwrap();
    static ref RE_GREETING: Regex = Regex::new(r"(?i)(?:hello|hi) ").unwrap();
    static ref RE_CAN_YOU: Regex = Regex::new(r"(?i)can you").unwrap();
    static ref RE_PLEASE: Regex = Regex::new(r"(?i)please").unwrap();
    static ref RE_WISH: Regex = Regex::new(r"(?i)congratulate|wish").unwrap();
    static ref RE_BIRTHDAY: Regex = Regex::new(r"(?i)birthday").unwrap();

    // =========================================================================
    // Current events
    // =========================================================================
    static ref RE_COUNTRY: Regex = Regex::new(r"(?i)(?:\W|^)(?:ukraine|russia)").unwrap();
    static ref RE_WAR: Regex = Regex::new(r"(?i)(?:\W|^)war").unwrap();
    static ref RE_WW3: Regex = Regex::new(r"(?i)(?:\W|^)ww3").unwrap();

    // =========================================================================
    // Interactive commands
    // =========================================================================
    static ref RE_EIGHT_BALL: Regex = Regex::new(r"^!8ball ").unwrap();
    static ref RE_DUNGEON: Regex = Regex::new(r"^!enter(?:\W|$)").unwrap();
}

// =============================================================================
// Predicates
// =============================================================================

pub fn is_policy_violation(text: &str) -> bool {
    RE_POLICY.is_match(text)
}

pub fn is_foreign_language(text: &str) -> bool {
    RE_FOREIGN.is_match(text)
}

pub fn is_timezone(text: &str) -> bool {
    RE_TIMEZONE.is_match(text)
}

pub fn is_spam(text: &str) -> bool {
    RE_SPAM.is_match(text)
}

pub fn has_cyrillic(text: &str) -> bool {
    RE_CYRILLIC.is_match(text)
}

/// Decorative Cherokee letters or the known raid signature
pub fn is_bad_actor(text: &str) -> bool {
    RE_CHEROKEE.is_match(text) || RE_BAD_ACTOR.is_match(text)
}

/// Hosts of every URL-shaped substring, lowercased
pub fn link_hosts(text: &str) -> Vec<String> {
    RE_URL
        .captures_iter(text)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| authority_host(m.as_str()))
        .collect()
}

/// Host part of `user:pass@host:port`, lowercased; empty when there is none
fn authority_host(authority: &str) -> String {
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = match host_port.strip_prefix('[') {
        Some(bracketed) => bracketed.split(']').next().unwrap_or_default(),
        None => host_port.split(':').next().unwrap_or_default(),
    };
    host.trim_end_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// `host` equals an approved domain or is a subdomain of one
pub fn is_approved_host(host: &str, approved: &[String]) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    approved
        .iter()
        .any(|d| host == d || host.ends_with(&format!(".{}", d)))
}

/// Request phrasing combined with a greeting or birthday target
pub fn is_harassment(text: &str) -> bool {
    let say = RE_SAY.is_match(text);
    (say && (RE_CAN_YOU.is_match(text) || RE_GREETING.is_match(text) || RE_PLEASE.is_match(text)))
        || (RE_WISH.is_match(text) && RE_BIRTHDAY.is_match(text))
}

pub fn is_sensitive_topic(text: &str) -> bool {
    (RE_COUNTRY.is_match(text) && RE_WAR.is_match(text)) || RE_WW3.is_match(text)
}

pub fn is_eight_ball(text: &str) -> bool {
    RE_EIGHT_BALL.is_match(text)
}

pub fn is_dungeon(text: &str) -> bool {
    RE_DUNGEON.is_match(text)
}

/// Case-insensitive full-line command match; ignores the service's
/// duplicate-message marker and surrounding whitespace
pub fn is_command(text: &str, command: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{E0000}')
        .eq_ignore_ascii_case(command)
}

// =============================================================================
// Responses
// =============================================================================

/// Domains anyone may link
pub const DEFAULT_APPROVED_DOMAINS: &[&str] = &[
    "twitch.tv",
    "streamlabs.com",
    "mywheats.com",
    "cameo.com",
];

pub const EIGHT_BALL_ANSWERS: &[&str] = &[
    "As I see it, yes.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "It is certain.",
    "It is decidedly so.",
    "Most likely.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Outlook good.",
    "Reply hazy, try again.",
    "Signs point to yes.",
    "Very doubtful.",
    "Without a doubt.",
    "Yes.",
    "Yes - definitely.",
    "You may rely on it.",
];

pub const MERCH_LINES: &[&str] = &[
    "MyWheats: https://www.mywheats.com/vansamaofficial",
    "StreamLabs: https://streamlabs.com/vansamaofficial/merch",
    "TaoBao: https://shop170176806.world.taobao.com/index.htm",
];

pub const SOCIAL_LINES: &[&str] = &[
    "BiliBili: https://space.bilibili.com/477631979",
    "Instagram: https://www.instagram.com/vansamaofficial/",
    "Twitter: https://twitter.com/vansamaofficial",
    "YouTube: https://www.youtube.com/c/vansamaofficial",
];

pub const SHOUTOUT_LINES: &[&str] = &[
    "Want a short shoutout? Support the channel at https://streamlabs.com/vansamaofficial/tip BillyApprove",
    "Want a personalized shoutout from the Dungeon Master himself? Go to https://www.cameo.com/vansamaofficial BillyApprove",
];

pub const SHOUTOUT_RU_LINES: &[&str] = &[
    "Хотите короткое приветствие или ответ на вопрос от Вана? Поддержите канал донатом по ссылке https://streamlabs.com/vansamaofficial/tip BillyApprove",
    "Хотите персональное видео-обращение или поздравление от самого Данжен Мастера? Переходите по https://www.cameo.com/vansamaofficial BillyApprove",
];

pub const NUKE_ANNOUNCEMENT: &str = "YOU GUYS NEED TO RELAX MODS";

pub const MEDIA_SHARE_ANNOUNCEMENT: &str =
    "/me Hey chat, Van will play your gachimuchi remixes if you include them in your donation! HandsUp";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_pattern_tolerates_stretching() {
        let re = Regex::new(&format!("(?i){}", word_pattern("abc"))).unwrap();
        assert!(re.is_match("aaa.bbb c"));
        assert!(re.is_match("ABC"));
        assert!(!re.is_match("xabc"));
    }

    #[test]
    fn test_bounded_pattern_requires_word_end() {
        let re = Regex::new(&format!("(?i){}", word_pattern_bounded("za"))).unwrap();
        assert!(re.is_match("za"));
        assert!(re.is_match("ok za!"));
        assert!(!re.is_match("zap"));
    }

    #[test]
    fn test_foreign_keyword_and_timezone() {
        assert!(is_foreign_language("kak dela"));
        assert!(is_foreign_language("stream at 5pm est"));
        assert!(is_timezone("stream at 5pm est"));
        assert!(!is_foreign_language("hello everyone"));
    }

    #[test]
    fn test_spam_keywords() {
        assert!(is_spam("aboba"));
        assert!(is_spam("go watch rat tv"));
        assert!(!is_spam("abobatron"));
    }

    #[test]
    fn test_policy_terms() {
        assert!(is_policy_violation("you retard"));
        assert!(!is_policy_violation("have a nice day"));
    }

    #[test]
    fn test_scripts() {
        assert!(has_cyrillic("привет"));
        assert!(!has_cyrillic("hello"));
        assert!(is_bad_actor("ᎠᎡᎢ"));
    }

    #[test]
    fn test_link_hosts() {
        assert_eq!(link_hosts("see https://Evil.example.com/x and www.twitch.tv"),
            vec!["evil.example.com".to_string(), "twitch.tv".to_string()]);
        assert!(link_hosts("no links here").is_empty());
    }

    #[test]
    fn test_link_hosts_skip_userinfo_and_port() {
        assert_eq!(link_hosts("https://twitch.tv@evil.example.com/free"), vec!["evil.example.com"]);
        assert_eq!(link_hosts("http://twitch.tv:80@evil.example.com"), vec!["evil.example.com"]);
        assert_eq!(link_hosts("http://u:p@Clips.Twitch.tv:443/x"), vec!["clips.twitch.tv"]);
        assert_eq!(link_hosts("see https://twitch.tv/x, ok"), vec!["twitch.tv"]);
        assert_eq!(link_hosts("http://[::1]:8080/"), vec!["::1"]);
    }

    #[test]
    fn test_scheme_without_host_is_unapproved() {
        let approved = vec!["twitch.tv".to_string()];
        let hosts = link_hosts("http:// evil.example.com");
        assert_eq!(hosts, vec![String::new()]);
        assert!(!is_approved_host(&hosts[0], &approved));
    }

    #[test]
    fn test_approved_hosts() {
        let approved = vec!["twitch.tv".to_string()];
        assert!(is_approved_host("twitch.tv", &approved));
        assert!(is_approved_host("clips.twitch.tv", &approved));
        assert!(is_approved_host("www.twitch.tv", &approved));
        assert!(!is_approved_host("nottwitch.tv", &approved));
        assert!(!is_approved_host("twitch.tv.evil.com", &approved));
    }

    #[test]
    fn test_harassment_needs_combination() {
        assert!(is_harassment("can you say hello to my friend"));
        assert!(is_harassment("please say hi to bob"));
        assert!(is_harassment("can you tell my brother happy new year"));
        assert!(is_harassment("wish my sister a happy birthday"));
        assert!(!is_harassment("hello"));
        assert!(!is_harassment("birthday"));
    }

    #[test]
    fn test_sensitive_topic() {
        assert!(is_sensitive_topic("what about russia and the war"));
        assert!(is_sensitive_topic("ww3 soon"));
        assert!(!is_sensitive_topic("i love russia"));
    }

    #[test]
    fn test_command_match() {
        assert!(is_command("!NukeOn", "!nukeon"));
        assert!(is_command("  !nukeon \u{E0000}", "!nukeon"));
        assert!(!is_command("!nukeon now", "!nukeon"));
    }

    #[test]
    fn test_interactive_commands() {
        assert!(is_eight_ball("!8ball will it rain"));
        assert!(!is_eight_ball("!8ball"));
        assert!(is_dungeon("!enter"));
        assert!(is_dungeon("!enter now"));
        assert!(!is_dungeon("!entering"));
    }
}
