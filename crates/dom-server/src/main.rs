//! Domotic runtime
//!
//! Usage: `domotic [CONFIG]`. The configuration path defaults to
//! `$DOMOTIC_CONFIG`, then `domotic.yaml`. Log filtering follows `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dom_config::load_config;
use dom_hardware::SimulatedHardware;
use dom_runtime::ChannelListener;
use dom_storage::OutputSnapshotStore;
use dom_supervisor::Supervisor;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG: &str = "domotic.yaml";
const UI_QUEUE: usize = 16;

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("DOMOTIC_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = config_path();
    info!(config = %path.display(), "Starting domotic runtime");
    let config = load_config(&path)
        .with_context(|| format!("cannot load configuration {}", path.display()))?;

    let hw = SimulatedHardware::new();
    let runtime = config
        .runtime_builder()
        .context("invalid block graph")?
        .build(Box::new(hw));

    let (listener, mut snapshots) = ChannelListener::new(UI_QUEUE);
    runtime.subscribe(std::sync::Arc::new(listener));
    tokio::spawn(async move {
        while let Some(states) = snapshots.recv().await {
            for state in states.iter() {
                debug!(target: "ui", block = %state.name, state = %state.state, "UI state");
            }
        }
    });

    let supervisor = Supervisor::new(
        runtime,
        OutputSnapshotStore::new(&config.snapshot.path),
        config.supervisor.settings.launcher(),
        config.supervisor.settings.clone(),
        config.scheduler_settings(),
    );
    let handle = supervisor.spawn();
    info!("Domotic runtime is running");

    let mut states = handle.watch_state();
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down...");
            handle.stop().await?;
        }
        _ = async {
            while states.changed().await.is_ok() {
                if states.borrow().is_terminal() {
                    break;
                }
            }
        } => {
            warn!("Supervisor ended on its own");
            handle.join().await?;
        }
    }

    info!("Domotic runtime stopped");
    Ok(())
}
