#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line entry point of the Pit Defence session server.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pit_defence_core::{Command, PlayerId, SessionId, SessionStatus};
use pit_defence_server::{
    ascii::AsciiFrame, autopilot::Autopilot, headless::run_headless, InMemoryStore, ServerConfig,
    Session, SessionRegistry, SessionStore,
};
use pit_defence_world::query;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Pit Defence session server
#[derive(Parser, Debug)]
#[command(name = "pit-defence")]
#[command(about = "Host and simulate wave-based Pit Defence sessions")]
struct Cli {
    /// TOML file with server settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the global seed of the configuration
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Generates the map of a session and prints it
    Map {
        /// Session identifier the map derives from
        #[arg(long, default_value_t = 1)]
        session: u64,

        /// Print the client map document instead of ASCII art
        #[arg(long)]
        json: bool,
    },
    /// Simulates a session with bots as fast as possible
    Run {
        /// Session identifier
        #[arg(long, default_value_t = 1)]
        session: u64,

        /// Number of bots
        #[arg(long, default_value_t = 1)]
        players: u32,

        /// Simulated seconds before the run stops
        #[arg(long, default_value_t = 600)]
        seconds: u64,

        /// Print the final frame as ASCII art
        #[arg(long)]
        frame: bool,
    },
    /// Hosts a session in real time with bots connected through the inbox
    Serve {
        /// Number of bots
        #[arg(long, default_value_t = 1)]
        players: u32,

        /// Wall-clock seconds before the session is closed
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new("pit_defence_server=info,pit_defence_system_mapgen=info")
        });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.global_seed = seed;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(seed = config.global_seed, tick_rate = config.tick_rate_hz, "configuration loaded");

    match cli.mode {
        Mode::Map { session, json } => print_map(&config, SessionId::new(session), json),
        Mode::Run {
            session,
            players,
            seconds,
            frame,
        } => {
            let run = run_headless(
                SessionId::new(session),
                &config,
                players,
                Duration::from_secs(seconds),
            );
            if frame {
                let session = Session::new(SessionId::new(session), &config);
                let map = query::map(session.world()).clone();
                print!("{}", AsciiFrame::from_snapshot(&map, &run.snapshot));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&run.document).context("failed to encode summary")?
            );
            Ok(())
        }
        Mode::Serve { players, seconds } => {
            serve(config, players, Duration::from_secs(seconds)).await
        }
    }
}

fn print_map(config: &ServerConfig, id: SessionId, json: bool) -> Result<()> {
    let session = Session::new(id, config);
    let map = query::map(session.world());
    if json {
        let document =
            serde_json::to_string_pretty(&map.document()).context("failed to encode map")?;
        println!("{document}");
    } else {
        print!("{}", AsciiFrame::from_map(map));
        println!(
            "attempts: {}, fallback: {}, paths: {}",
            map.attempts(),
            map.is_fallback(),
            map.core_paths().len()
        );
    }
    Ok(())
}

async fn serve(config: ServerConfig, players: u32, limit: Duration) -> Result<()> {
    let store = Arc::new(InMemoryStore::new());
    let shared: Arc<dyn SessionStore> = store.clone();
    let mut registry = SessionRegistry::new(config.clone(), shared);
    let id = registry.create();
    let mut snapshots = registry.subscribe(id)?;

    // Maps derive from the session id alone, so bots can rebuild it locally.
    let map = query::map(Session::new(id, &config).world()).clone();
    let mut bots: Vec<Autopilot> = (1..=players.max(1))
        .map(|index| Autopilot::new(PlayerId::new(index), &map))
        .collect();
    for bot in &bots {
        let player = bot.player();
        registry
            .send(
                id,
                Command::Join {
                    player,
                    name: format!("Bot {player}"),
                },
            )
            .await?;
    }

    let deadline = tokio::time::sleep(limit);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.status == SessionStatus::Ended {
                    break;
                }
                for bot in &mut bots {
                    for command in bot.decide(&snapshot, &map) {
                        if let Err(error) = registry.send(id, command).await {
                            warn!(%error, "command dropped");
                        }
                    }
                }
            }
        }
    }

    let report = registry.finish(id).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report.document).context("failed to encode summary")?
    );
    for bot in &bots {
        println!("player {} credits: {}", bot.player(), store.balance(bot.player()));
    }
    Ok(())
}
