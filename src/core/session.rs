//! Session Manager: connect, authenticate, join, moderate, reconnect
//!
//! State transitions:
//! - DISCONNECTED → CONNECTING: start, or transport lost
//! - CONNECTING → AUTHENTICATED: stream open, PASS/NICK sent
//! - AUTHENTICATED → JOINED: CAP/JOIN sent
//! - JOINED → ACTIVE: reading chat
//! - ACTIVE → DISCONNECTED: read error, EOF or server RECONNECT
//! - any → CLOSED: shutdown (QUIT sent when a stream is open)
//!
//! Every lost stream waits out the next backoff step before reconnecting,
//! except a server RECONNECT. The backoff only resets once an ACTIVE stream
//! has delivered a line, so a server that accepts and then drops the
//! connection still sees doubling waits.
//!
//! Penalty and mode state live in the Rule Engine and survive reconnects.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::core::dispatcher::{Dispatch, Dispatcher};
use crate::core::irc;
use crate::core::transport::Connector;
use crate::types::{ModAction, SessionState};
use crate::{BACKOFF_CAP_SECS, BACKOFF_INITIAL_SECS};

/// Capacity of the queue for actions raised by background tasks
pub const OUTBOUND_QUEUE: usize = 64;

/// Doubling reconnect delay with an upper bound
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    cap: Duration,
    failures: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(BACKOFF_INITIAL_SECS),
            Duration::from_secs(BACKOFF_CAP_SECS),
        )
    }
}

impl Backoff {
    pub fn new(initial: Duration, cap: Duration) -> Self {
        Self { initial, cap, failures: 0 }
    }

    /// Record a failure; returns the wait before the next attempt.
    ///
    /// After N consecutive failures the wait is `initial * 2^(N-1)`, capped.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.failures = self.failures.saturating_add(1);
        self.initial.saturating_mul(factor).min(self.cap)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Why a connected stream stopped being driven
#[derive(Debug)]
enum StreamEnd {
    Shutdown,
    /// Server asked us to reconnect
    Reconnect,
    Lost(String),
}

/// Owns the transport and executes decisions on it
pub struct Session<C: Connector> {
    connector: C,
    config: BotConfig,
    token: String,
    dispatcher: Dispatcher,
    backoff: Backoff,
    outbound_tx: mpsc::Sender<ModAction>,
    outbound_rx: mpsc::Receiver<ModAction>,
    state_tx: watch::Sender<SessionState>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, config: BotConfig, token: String, dispatcher: Dispatcher) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            connector,
            config,
            token,
            dispatcher,
            backoff: Backoff::default(),
            outbound_tx,
            outbound_rx,
            state_tx,
        }
    }

    /// Replace the reconnect backoff
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Queue for actions that do not originate from an inbound line
    pub fn outbound(&self) -> mpsc::Sender<ModAction> {
        self.outbound_tx.clone()
    }

    /// Observe state transitions
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, next: SessionState) {
        let current = *self.state_tx.borrow();
        if current == next {
            return;
        }
        if !current.can_transition_to(next) {
            warn!(%current, %next, "unexpected session transition");
        }
        info!(from = %current, to = %next, "session state");
        self.state_tx.send_replace(next);
    }

    /// Run until `shutdown` flips to true (or its sender is dropped)
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let Some(stream) = self.connect_with_backoff(&mut shutdown).await else {
                break;
            };

            match self.drive(stream, &mut shutdown).await {
                StreamEnd::Shutdown => break,
                StreamEnd::Reconnect => {
                    info!("server requested reconnect");
                    self.set_state(SessionState::Disconnected);
                }
                StreamEnd::Lost(reason) => {
                    self.set_state(SessionState::Disconnected);
                    let delay = self.backoff.next_delay();
                    warn!(
                        %reason,
                        failures = self.backoff.failures(),
                        delay_secs = delay.as_secs(),
                        "connection lost, reconnecting"
                    );
                    if !wait_or_shutdown(delay, &mut shutdown).await {
                        break;
                    }
                }
            }
        }
        self.set_state(SessionState::Closed);
    }

    async fn connect_with_backoff(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<C::Stream> {
        self.set_state(SessionState::Connecting);
        loop {
            if *shutdown.borrow() {
                return None;
            }

            let attempt = tokio::select! {
                result = self.connector.connect() => result,
                _ = shutdown.changed() => return None,
            };

            match attempt {
                Ok(stream) => {
                    info!(endpoint = %self.connector.endpoint(), "connected");
                    return Some(stream);
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    warn!(
                        endpoint = %self.connector.endpoint(),
                        error = %e,
                        failures = self.backoff.failures(),
                        delay_secs = delay.as_secs(),
                        "connect failed"
                    );
                    if !wait_or_shutdown(delay, shutdown).await {
                        return None;
                    }
                }
            }
        }
    }

    async fn drive(
        &mut self,
        stream: C::Stream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> StreamEnd {
        let (reader, mut writer) = tokio::io::split(stream);
        let mut lines = BufReader::new(reader).lines();

        if let Err(e) = self.handshake(&mut writer).await {
            return StreamEnd::Lost(format!("handshake failed: {}", e));
        }

        let channel = self.dispatcher.channel().to_string();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => return StreamEnd::Lost("closed by server".to_string()),
                        Err(e) => return StreamEnd::Lost(e.to_string()),
                    };
                    if self.backoff.failures() > 0 {
                        debug!("stream healthy, backoff reset");
                        self.backoff.reset();
                    }
                    let written = match self.dispatcher.dispatch(&line) {
                        Dispatch::Pong(reply) => write_line(&mut writer, &reply).await,
                        Dispatch::Reconnect => return StreamEnd::Reconnect,
                        Dispatch::Moderate(decision) => {
                            info!(
                                rule = decision.rule.code(),
                                actions = decision.actions.len(),
                                "moderating"
                            );
                            write_actions(&mut writer, &channel, &decision.actions).await
                        }
                        Dispatch::Ignore => Ok(()),
                    };
                    if let Err(e) = written {
                        return StreamEnd::Lost(e.to_string());
                    }
                }
                Some(action) = self.outbound_rx.recv() => {
                    if let Err(e) = write_line(&mut writer, &irc::action(&channel, &action)).await {
                        return StreamEnd::Lost(e.to_string());
                    }
                }
                _ = shutdown.changed() => {
                    if let Err(e) = write_line(&mut writer, &irc::quit("Bye")).await {
                        debug!(error = %e, "quit not delivered");
                    }
                    let _ = writer.shutdown().await;
                    return StreamEnd::Shutdown;
                }
            }
        }
    }

    async fn handshake<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> io::Result<()> {
        write_line(writer, &irc::pass(&self.token)).await?;
        write_line(writer, &irc::nick(&self.config.nick)).await?;
        self.set_state(SessionState::Authenticated);

        write_line(writer, &irc::cap_req()).await?;
        write_line(writer, &irc::join(&self.config.channel)).await?;
        self.set_state(SessionState::Joined);

        if let Some(greeting) = &self.config.greeting {
            write_line(writer, &irc::privmsg(&self.config.channel, greeting)).await?;
        }
        self.set_state(SessionState::Active);
        Ok(())
    }
}

/// Sleep for `delay`; false when shutdown arrived first
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown.changed() => false,
    }
}

async fn write_actions<W: AsyncWrite + Unpin>(
    writer: &mut W,
    channel: &str,
    actions: &[ModAction],
) -> io::Result<()> {
    for action in actions {
        write_line(writer, &irc::action(channel, action)).await?;
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    if line.starts_with("PASS ") {
        debug!("< PASS oauth:***");
    } else {
        debug!("< {}", line);
    }
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

// =============================================================================
// TESTS
// =============================================================================
