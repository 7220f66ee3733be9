//! Background loops: penalty decay and the media-share announcer
//!
//! Both run on a tokio interval until the shutdown flag flips. The announcer
//! stays quiet unless the session is ACTIVE, so nothing piles up in the
//! outbound queue while reconnecting.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::modes::ModerationModes;
use crate::core::patterns::MEDIA_SHARE_ANNOUNCEMENT;
use crate::core::penalty::PenaltyStore;
use crate::types::{ModAction, ModeFlag, SessionState};

/// Run a decay pass every `every`, resetting chatters idle for `window`
pub fn spawn_decay_ticker(
    store: Arc<PenaltyStore>,
    every: Duration,
    window: chrono::Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reset = store.decay_pass(Utc::now(), window);
                    if reset > 0 {
                        info!(reset, "penalties decayed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("decay ticker stopped");
    })
}

/// Queue the media-share announcement every `every` while the mode is on
/// and `session` reports ACTIVE
pub fn spawn_announcer(
    modes: Arc<ModerationModes>,
    outbound: mpsc::Sender<ModAction>,
    session: watch::Receiver<SessionState>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !modes.is_active(ModeFlag::MediaAnnounce) {
                        continue;
                    }
                    let state = *session.borrow();
                    if state != SessionState::Active {
                        debug!(%state, "session not active, announcement skipped");
                        continue;
                    }
                    match outbound.try_send(ModAction::say(MEDIA_SHARE_ANNOUNCEMENT)) {
                        Ok(()) => debug!("media-share announcement queued"),
                        Err(TrySendError::Full(_)) => {
                            warn!("outbound queue full, announcement dropped")
                        }
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        debug!("announcer stopped");
    })
}

// =============================================================================
// TESTS
// =============================================================================
