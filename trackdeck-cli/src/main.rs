mod bridges;
mod report;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use trackdeck_core::bridge::{Bridge, PumpStats, pump};
use trackdeck_core::command::{DashboardCommand, apply};
use trackdeck_core::config::{ConfigError, DashboardConfig};
use trackdeck_core::reducer::EventEnvelope;
use trackdeck_core::state::{DashboardState, SharedDashboard};

use bridges::{DemoBridge, ScriptBridge};

#[derive(Parser)]
#[command(name = "trackdeck")]
#[command(about = "Inspect actions, patches and snapshots of tracked observables", long_about = None)]
struct Cli {
    /// Config file (overrides discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded event script (YAML, or JSON by extension)
    Replay {
        script: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Run a simulated instrumented app
    Demo {
        #[arg(short, long, default_value_t = 5)]
        events: u64,
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("TRACKDECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>) -> DashboardConfig {
    if let Some(path) = explicit {
        return match DashboardConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                std::process::exit(1);
            }
        };
    }

    let Ok(cwd) = std::env::current_dir() else {
        return DashboardConfig::default();
    };
    match DashboardConfig::discover(&cwd) {
        Ok((path, config)) => {
            tracing::info!(path = %path.display(), "loaded config");
            config
        }
        Err(ConfigError::NotFound { .. }) => DashboardConfig::default(),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            DashboardConfig::default()
        }
    }
}

/// Run a bridge to completion against a fresh session
async fn run_session(
    config: DashboardConfig,
    mut bridge: Box<dyn Bridge>,
) -> (SharedDashboard, PumpStats) {
    let (event_tx, event_rx) = mpsc::channel::<EventEnvelope>(config.event_queue);
    let state = DashboardState::new(config).shared();

    tracing::info!(bridge = bridge.name(), "starting bridge");
    let producer = tokio::spawn(async move {
        bridge.run(event_tx).await;
    });

    let stats = pump(state.clone(), event_rx).await;
    if let Err(e) = producer.await {
        tracing::error!(error = %e, "bridge task failed");
    }
    (state, stats)
}

async fn print_session(
    state: &SharedDashboard,
    stats: &PumpStats,
    started: SystemTime,
    json: bool,
) -> io::Result<()> {
    let guard = state.read().await;
    if json {
        report::print_json(&guard).map_err(io::Error::other)
    } else {
        report::print_text(&guard, stats, started);
        Ok(())
    }
}

async fn run_replay(config: DashboardConfig, script: &Path, json: bool) -> io::Result<()> {
    let bridge = match ScriptBridge::load(script) {
        Ok(bridge) => bridge,
        Err(e) => {
            eprintln!("Error reading {}: {}", script.display(), e);
            std::process::exit(1);
        }
    };
    if bridge.is_empty() {
        eprintln!("No events in {}.", script.display());
        return Ok(());
    }

    tracing::info!(script = %script.display(), events = bridge.len(), "replaying script");
    let started = SystemTime::now();
    let (state, stats) = run_session(config, Box::new(bridge)).await;
    print_session(&state, &stats, started, json).await
}

async fn run_demo(config: DashboardConfig, events: u64, json: bool) -> io::Result<()> {
    let bridge = DemoBridge::new(events);
    let store_id = bridge.store_id().to_string();

    let started = SystemTime::now();
    let (state, stats) = run_session(config, Box::new(bridge)).await;

    // Operator side: pick an action, edit its arguments and start a recording
    let recording_id = Uuid::new_v4().to_string();
    let commands = [
        DashboardCommand::SelectAction {
            tracker: store_id.clone(),
            index: 1,
        },
        DashboardCommand::EditArguments {
            tracker: store_id.clone(),
            arguments: "[0]".into(),
        },
        DashboardCommand::AddRecording {
            tracker: store_id.clone(),
            recording_id: recording_id.clone(),
        },
        DashboardCommand::RenameRecording {
            tracker: store_id.clone(),
            recording_id,
            name: "first todos".into(),
        },
    ];
    {
        let mut guard = state.write().await;
        for cmd in &commands {
            if let Err(e) = apply(&mut guard, cmd) {
                tracing::warn!(error = %e, "demo command rejected");
            }
        }
    }

    print_session(&state, &stats, started, json).await
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Replay { script, json } => run_replay(config, &script, json).await,
        Commands::Demo { events, json } => run_demo(config, events, json).await,
    }
}
