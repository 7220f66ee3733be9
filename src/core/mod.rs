//! Core modules for Chatwarden

pub mod patterns;
pub mod penalty;
pub mod modes;
pub mod rules;
pub mod irc;
pub mod dispatcher;
pub mod transport;
pub mod session;
pub mod ticker;
pub mod api;

pub use penalty::PenaltyStore;
pub use modes::{BroadcastCooldowns, ModerationModes};
pub use rules::{classify, RuleContext, RuleEngine, RULES};
pub use irc::IrcLine;
pub use dispatcher::{Dispatch, Dispatcher};
pub use transport::{Connector, TcpConnector, TlsConnector};
pub use session::{Backoff, Session};
pub use ticker::{spawn_announcer, spawn_decay_ticker};
pub use api::{create_router, run_server, StatusState};
