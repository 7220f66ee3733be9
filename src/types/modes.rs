//! Moderation mode flags

use serde::{Deserialize, Serialize};

/// One toggleable moderation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeFlag {
    /// Blanket timeouts for non-elevated chatters
    Nuke,
    /// Periodic media-share announcement
    MediaAnnounce,
    /// Foreign-language filters suspended
    RelaxedLanguage,
}

/// Snapshot of all moderation modes; everything starts off
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFlags {
    pub nuke_active: bool,
    pub media_announce_active: bool,
    pub relaxed_language_active: bool,
}

impl ModeFlags {
    pub fn get(&self, flag: ModeFlag) -> bool {
        match flag {
            ModeFlag::Nuke => self.nuke_active,
            ModeFlag::MediaAnnounce => self.media_announce_active,
            ModeFlag::RelaxedLanguage => self.relaxed_language_active,
        }
    }

    /// Set `flag`, returning its previous value
    pub fn set(&mut self, flag: ModeFlag, value: bool) -> bool {
        let slot = match flag {
            ModeFlag::Nuke => &mut self.nuke_active,
            ModeFlag::MediaAnnounce => &mut self.media_announce_active,
            ModeFlag::RelaxedLanguage => &mut self.relaxed_language_active,
        };
        std::mem::replace(slot, value)
    }
}
