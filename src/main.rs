//! chef-core - gesture-driven "chef decides" selection and session core
//!
//! Runs the session controller against a host transport:
//! - `--script <jsonl>` replays timed events (motion readings, taps, admin actions)
//! - otherwise each stdin line is one `CoreEvent` JSON object, applied on arrival
//!
//! Host notifications are written to stdout as JSON lines; logs go to stderr.
//!
//! Module structure:
//! - `domain/` - Core value types (MenuItem, MotionReading, CoreEvent, Catalog)
//! - `io/` - External interfaces (motion capability, key-value store, feedback, host channel)
//! - `services/` - Business logic (classifier, animator, idle timer, cart, admin, controller)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use chef_core::domain::{Catalog, CoreEvent, PermissionOutcome};
use chef_core::infra::{Config, Metrics};
use chef_core::io::{
    create_host_channel, replay_events, Availability, JsonFileStore, LogFeedback, MotionCapability,
    NoMotion, Script, ScriptedMotion,
};
use chef_core::services::{AdminGate, Collaborators, Picker, RandomPicker, SessionController};
use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// chef-core - shake-to-pick menu session core
#[derive(Parser, Debug)]
#[command(name = "chef-core", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// JSONL script of timed events to replay instead of reading stdin
    #[arg(short, long)]
    script: Option<String>,

    /// Seed for reproducible draws
    #[arg(long)]
    seed: Option<u64>,

    /// Keep running this long after the last script entry, in milliseconds
    #[arg(long, default_value_t = 3000)]
    linger_ms: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(git_hash = %env!("GIT_HASH"), "chef-core starting");

    let config_path = args.config.clone().unwrap_or_else(|| Config::resolve_config_path(&[]));
    let config = Config::load_from_path(&config_path);
    info!(
        config_file = %config.config_file(),
        acc_threshold = %config.acc_threshold(),
        gravity_threshold = %config.gravity_threshold(),
        ticks = %config.selection_ticks(),
        tick_interval_ms = %config.tick_interval_ms(),
        settle_ms = %config.settle_ms(),
        idle_quiet_ms = %config.idle_quiet_ms(),
        catalog_file = %config.catalog_file(),
        store_file = %config.store_file(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());
    let catalog = Catalog::load_from_path(config.catalog_file());
    let admin = AdminGate::load(config.admin_pin(), Arc::new(JsonFileStore::new(config.store_file())));

    // Host notifications go to stdout, one JSON object per line
    let (host, mut host_rx) = create_host_channel(1024, metrics.clone());
    let host_writer = tokio::spawn(async move {
        while let Some(event) = host_rx.recv().await {
            println!("{}", event.to_json());
        }
    });

    let picker: Box<dyn Picker> = match args.seed {
        Some(seed) => {
            info!(seed = %seed, "picker_seeded");
            Box::new(RandomPicker::seeded(seed))
        }
        None => Box::new(RandomPicker::from_entropy()),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (event_tx, event_rx) = mpsc::channel(1000);
    let origin = Instant::now();

    let motion: Arc<dyn MotionCapability> = match &args.script {
        Some(path) => {
            let script = Script::from_file(path).context("Failed to load replay script")?;
            let run_until = origin + Duration::from_millis(script.duration_ms() + args.linger_ms);
            let (readings, others) = script.split();

            let tx = event_tx.clone();
            let replay_shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                let sent = replay_events(others, tx.clone(), origin, replay_shutdown).await;
                info!(sent = %sent, "script_replay_finished");
                tokio::time::sleep_until(run_until).await;
                let _ = tx.send(CoreEvent::Shutdown).await;
            });

            if readings.is_empty() {
                Arc::new(NoMotion)
            } else {
                Arc::new(ScriptedMotion::new(
                    readings,
                    Availability::Available,
                    PermissionOutcome::Granted,
                    origin,
                ))
            }
        }
        None => {
            let tx = event_tx.clone();
            tokio::spawn(forward_stdin(tx));
            Arc::new(NoMotion)
        }
    };

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs().max(1);
    let mut reporter_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => metrics_clone.report().log(),
                _ = reporter_shutdown.changed() => break,
            }
        }
    });

    // Handle shutdown on Ctrl+C
    let signal_tx = event_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = signal_tx.send(CoreEvent::Shutdown).await;
    });

    let collaborators = Collaborators {
        host: Box::new(host),
        feedback: Arc::new(LogFeedback),
        picker,
        metrics: metrics.clone(),
    };
    let controller = SessionController::new(config, catalog, admin, collaborators, 0);
    info!("controller_started");

    let weak_tx = event_tx.downgrade();
    drop(event_tx);
    let controller = controller.run(event_rx, weak_tx, motion, origin).await;

    let _ = shutdown_tx.send(true);
    drop(controller);
    let _ = host_writer.await;

    metrics.report().log();
    info!("chef-core shutdown complete");
    Ok(())
}

/// Apply each stdin line as a `CoreEvent`; EOF shuts the controller down
async fn forward_stdin(tx: mpsc::Sender<CoreEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<CoreEvent>(line) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => warn!(error = %e, "stdin_event_invalid"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin_read_failed");
                break;
            }
        }
    }
    let _ = tx.send(CoreEvent::Shutdown).await;
}
