//! Chatwarden CLI
//!
//! Usage:
//!   chatwarden --channel mychannel --token-file ./token     # Moderate live chat
//!   chatwarden ... --status-addr 127.0.0.1:3000              # plus status API
//!   chatwarden --dry-run --line "<raw irc line>"             # Evaluate one line offline
//!   chatwarden --dry-run --json < capture.log                # Evaluate a capture as JSON

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use chatwarden::core::{
    run_server, spawn_announcer, spawn_decay_ticker, Connector, Dispatch, Dispatcher,
    ModerationModes, PenaltyStore, RuleEngine, Session, StatusState, TcpConnector, TlsConnector,
};
use chatwarden::core::patterns::DEFAULT_APPROVED_DOMAINS;
use chatwarden::types::Decision;
use chatwarden::{
    load_secret_token, BotConfig, BotError, ANNOUNCE_INTERVAL_SECS, DECAY_INTERVAL_SECS,
    DECAY_WINDOW_SECS, VERSION,
};

#[derive(Parser, Debug)]
#[command(
    name = "chatwarden",
    version = VERSION,
    about = "Chatwarden - automated moderator for one live-chat channel",
    long_about = "Chatwarden joins a single chat channel over IRC, evaluates every message\n\
                  against an ordered rule table and times out, bans or replies.\n\n\
                  Repeat offenders climb a 5s -> 30s -> 300s ladder that decays after\n\
                  five quiet minutes. Moderators toggle nuke, relaxed-language and\n\
                  media-share modes with chat commands.\n\n\
                  Modes:\n  \
                  (default)   Connect and moderate\n  \
                  --dry-run   Evaluate raw IRC lines offline"
)]
struct Args {
    /// Chat server host
    #[arg(long, env = "CHATWARDEN_HOST", default_value = "irc.chat.twitch.tv")]
    host: String,

    /// Chat server port
    #[arg(long, env = "CHATWARDEN_PORT", default_value_t = 6697)]
    port: u16,

    /// Connect without TLS
    #[arg(long)]
    no_tls: bool,

    /// Bot account login name
    #[arg(long, env = "CHATWARDEN_NICK", default_value = "chatwarden")]
    nick: String,

    /// Channel to moderate (with or without '#')
    #[arg(long, env = "CHATWARDEN_CHANNEL", default_value = "vansamaofficial")]
    channel: String,

    /// File holding the session token
    #[arg(long, env = "CHATWARDEN_TOKEN_FILE", default_value = "./secret.txt")]
    token_file: PathBuf,

    /// Domain anyone may link (repeatable; replaces the built-in list)
    #[arg(long = "allow-domain")]
    allow_domains: Vec<String>,

    /// Chat line sent after every join
    #[arg(long, env = "CHATWARDEN_GREETING")]
    greeting: Option<String>,

    /// Serve the read-only status API on this address
    #[arg(long, env = "CHATWARDEN_STATUS_ADDR")]
    status_addr: Option<String>,

    /// Evaluate raw lines offline instead of connecting
    #[arg(long)]
    dry_run: bool,

    /// Raw IRC line for --dry-run (stdin otherwise)
    #[arg(short, long)]
    line: Option<String>,

    /// Output as JSON (--dry-run)
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging (raw lines, every decision)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> Result<BotConfig, BotError> {
        let approved_domains = if self.allow_domains.is_empty() {
            DEFAULT_APPROVED_DOMAINS.iter().map(|d| d.to_string()).collect()
        } else {
            self.allow_domains.clone()
        };
        BotConfig {
            host: self.host.clone(),
            port: self.port,
            tls: !self.no_tls,
            nick: self.nick.clone(),
            channel: self.channel.clone(),
            approved_domains,
            greeting: self.greeting.clone(),
        }
        .validate()
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = match args.to_config() {
        Ok(config) if args.dry_run => run_dry(&config, &args),
        Ok(config) => run_live(config, &args).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "chatwarden=debug" } else { "chatwarden=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Connect and moderate until Ctrl+C / SIGTERM
async fn run_live(config: BotConfig, args: &Args) -> Result<(), BotError> {
    let token = load_secret_token(&args.token_file)?;

    let penalties = Arc::new(PenaltyStore::new());
    let modes = Arc::new(ModerationModes::new());
    let engine = Arc::new(RuleEngine::new(&config, penalties.clone(), modes.clone()));
    let dispatcher = Dispatcher::new(engine, config.channel.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    info!(channel = %config.channel, nick = %config.nick, version = VERSION, "starting");

    let decay = spawn_decay_ticker(
        penalties.clone(),
        Duration::from_secs(DECAY_INTERVAL_SECS),
        chrono::Duration::seconds(DECAY_WINDOW_SECS),
        shutdown_rx.clone(),
    );

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let shared = (penalties, modes);
    if config.tls {
        let connector = TlsConnector::new(config.host.clone(), config.port)?;
        run_session(connector, config, token, dispatcher, shared, args, shutdown_rx).await;
    } else {
        let connector = TcpConnector::new(config.host.clone(), config.port);
        run_session(connector, config, token, dispatcher, shared, args, shutdown_rx).await;
    }

    let _ = decay.await;
    Ok(())
}

async fn run_session<C: Connector>(
    connector: C,
    config: BotConfig,
    token: String,
    dispatcher: Dispatcher,
    (penalties, modes): (Arc<PenaltyStore>, Arc<ModerationModes>),
    args: &Args,
    shutdown: watch::Receiver<bool>,
) {
    let session = Session::new(connector, config, token, dispatcher);

    let announcer = spawn_announcer(
        modes.clone(),
        session.outbound(),
        session.state(),
        Duration::from_secs(ANNOUNCE_INTERVAL_SECS),
        shutdown.clone(),
    );

    if let Some(addr) = args.status_addr.clone() {
        let state = StatusState {
            penalties,
            modes,
            session: session.state(),
        };
        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = run_server(&addr, state, server_shutdown).await {
                error!(error = %e, "status API failed");
            }
        });
    }

    session.run(shutdown).await;
    let _ = announcer.await;
    info!("stopped");
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Evaluate raw lines without a connection
fn run_dry(config: &BotConfig, args: &Args) -> Result<(), BotError> {
    let engine = Arc::new(RuleEngine::standalone(config));
    let dispatcher = Dispatcher::new(engine, config.channel.clone());

    if let Some(ref line) = args.line {
        print_dispatch(line, &dispatcher.dispatch(line), args);
        return Ok(());
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        print_dispatch(&line, &dispatcher.dispatch(&line), args);
    }
    Ok(())
}

fn print_dispatch(raw: &str, dispatch: &Dispatch, args: &Args) {
    if args.json {
        let value = match dispatch {
            Dispatch::Pong(reply) => serde_json::json!({ "line": raw, "pong": reply }),
            Dispatch::Reconnect => serde_json::json!({ "line": raw, "reconnect": true }),
            Dispatch::Moderate(decision) => {
                serde_json::json!({ "line": raw, "decision": decision })
            }
            Dispatch::Ignore => serde_json::json!({ "line": raw, "decision": null }),
        };
        println!("{}", value);
        return;
    }

    match dispatch {
        Dispatch::Pong(reply) => println!("{} {}", "PONG".cyan(), reply),
        Dispatch::Reconnect => println!("{}", "RECONNECT".yellow()),
        Dispatch::Moderate(decision) if args.no_color => {
            println!("{}", decision.to_parseable_string())
        }
        Dispatch::Moderate(decision) => print_decision(decision),
        Dispatch::Ignore => println!("{}", "no action".dimmed()),
    }
}

fn print_decision(decision: &Decision) {
    let code = decision.rule.code();
    let label = if decision.rule.is_mode_toggle() {
        code.blue().bold()
    } else if decision.timeout_secs().is_some() {
        code.red().bold()
    } else {
        code.green().bold()
    };
    println!("{} {}", label, decision.rule.description().dimmed());
    for action in &decision.actions {
        println!("  {} {}", "→".dimmed(), action.to_chat_payload());
    }
}
