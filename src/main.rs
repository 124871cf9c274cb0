//! fishd - runs the moderation engine against a console stand-in for the game.
//!
//! Lines typed on stdin:
//!
//! - `/cmd args` runs a command as the console
//! - `!as <id> /cmd args` runs a command as a joined player
//! - `!join <id> <ip> <name>`, `!leave <id>`, `!chat <id> <text>`
//! - `!pick <choice-id> <n|cancel> [id]` answers a menu (as the console unless `id` is given)
//! - `!metrics` prints Prometheus metrics
//! - `!quit`

use anyhow::Context as _;
use fishd::config::{Config, validate};
use fishd::db::{JsonStore, MemoryStore, Persistence};
use fishd::game::{ConsoleMenu, ConsoleOutput, ConsoleWorld};
use fishd::handlers::core::OutputRef;
use fishd::history::{AuditSink, JsonlSink, NoOpSink};
use fishd::state::{ChatVerdict, PlayerId, Server, ServerParams};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        Config::default()
    };

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(server = %config.server.name, "Starting fishd");
    fishd::metrics::init();

    let persistence: Arc<dyn Persistence> =
        match (&config.storage.players_path, &config.storage.settings_path) {
            (Some(players), Some(settings)) => {
                info!(players = %players.display(), settings = %settings.display(), "Using JSON storage");
                Arc::new(JsonStore::new(players, settings))
            }
            _ => {
                warn!("Storage paths not configured, player records will not persist");
                Arc::new(MemoryStore::new())
            }
        };
    let audit_sink: Arc<dyn AuditSink> = match &config.storage.audit_path {
        Some(path) => {
            info!(path = %path.display(), "Writing audit log");
            Arc::new(JsonlSink::new(path))
        }
        None => Arc::new(NoOpSink),
    };

    let world = Arc::new(ConsoleWorld::new(config.server.data_dir.clone()));
    let exit = world.exit_signal();
    let registry = fishd::handlers::default_registry().context("building command registry")?;

    let server = Server::new(ServerParams {
        config,
        registry,
        world,
        menu: Arc::new(ConsoleMenu),
        persistence,
        audit_sink,
    })
    .await
    .context("loading persisted state")?;

    let output: OutputRef = Arc::new(ConsoleOutput);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = exit.notified() => {
                info!("Exit requested by the engine");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&server, &output, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        }
    }

    server.shutdown();
    if let Err(e) = server.save_players().await {
        error!(error = %e, "Failed to save players on shutdown");
    }
    Ok(())
}

/// Handle one console line. Returns `false` to stop.
async fn handle_line(server: &Arc<Server>, output: &OutputRef, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    if line.starts_with('/') {
        let console = server.console().clone();
        let _ = server.dispatch_line(line, console, output.clone()).await;
        return true;
    }

    let mut words = line.splitn(2, char::is_whitespace);
    let verb = words.next().unwrap_or_default();
    let rest = words.next().unwrap_or_default().trim();
    match verb {
        "!quit" => return false,
        "!metrics" => print!("{}", fishd::metrics::gather_metrics()),
        "!join" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(id), Some(ip), Some(name)) => {
                    server.player_join(&PlayerId::new(id), name, ip).await;
                }
                _ => println!("usage: !join <id> <ip> <name>"),
            }
        }
        "!leave" if !rest.is_empty() => server.player_leave(&PlayerId::new(rest)).await,
        "!chat" => match rest.split_once(char::is_whitespace) {
            Some((id, text)) => {
                match server.player_chat(&PlayerId::new(id), text).await {
                    ChatVerdict::Allowed => println!("<{id}> {text}"),
                    ChatVerdict::Muted => println!("(muted) <{id}> {text}"),
                }
            }
            None => println!("usage: !chat <id> <text>"),
        },
        "!as" => match rest.split_once(char::is_whitespace) {
            Some((id, command)) => match server.store.get(&PlayerId::new(id)) {
                Some(actor) => {
                    let _ = server.dispatch_line(command, actor, output.clone()).await;
                }
                None => println!("unknown player {id}"),
            },
            None => println!("usage: !as <id> /command"),
        },
        "!pick" => pick(server, rest).await,
        _ => println!("unrecognized input; commands start with /"),
    }
    true
}

async fn pick(server: &Arc<Server>, rest: &str) {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let (Some(id), Some(answer)) = (parts.first(), parts.get(1)) else {
        println!("usage: !pick <choice-id> <n|cancel> [player-id]");
        return;
    };
    let Ok(id) = id.parse::<Uuid>() else {
        println!("not a choice id: {id}");
        return;
    };
    let choice = match *answer {
        "cancel" => None,
        n => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Some(n - 1),
            _ => {
                println!("not an option number: {n}");
                return;
            }
        },
    };
    let chooser = parts
        .get(2)
        .map(|p| PlayerId::new(*p))
        .unwrap_or_else(|| server.console_id().clone());
    if let Err(e) = server.resolve_choice(&id, &chooser, choice).await {
        println!("{e}");
    }
}
