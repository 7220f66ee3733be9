//! Core types for Chatwarden

mod action;
mod chatter;
mod decision;
mod message;
mod modes;
mod state;

pub use action::ModAction;
pub use chatter::ChatterState;
pub use decision::{Decision, RuleKind};
pub use message::{ChatMessage, MessageFlags};
pub use modes::{ModeFlag, ModeFlags};
pub use state::SessionState;
