//! Command-line runner: all the bunnies in the meadow die.

mod report;
mod telemetry;

use anyhow::{Context, Result};
use meadow_core::SimulationConfig;
use meadow_world::Simulation;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

const DEFAULT_OUTPUT: &str = "meadow-run.json";

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    // Load configuration
    let config = load_config()?;
    let output = std::env::var("MEADOW_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT));

    info!(
        seed = config.seed,
        width = config.meadow.width,
        height = config.meadow.height,
        "Starting bunny meadow runner"
    );

    let mut simulation = Simulation::new(config.clone())?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        stop_flag.store(true, Ordering::Relaxed);
    });

    // The step loop is synchronous; keep it off the async workers.
    let result = tokio::task::spawn_blocking(move || simulation.run(&stop))
        .await
        .context("simulation task panicked")?;

    report::RunReport::new(config, result).write(&output)?;

    Ok(())
}

/// Configuration from the first argument or `MEADOW_CONFIG`, else defaults
fn load_config() -> Result<SimulationConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MEADOW_CONFIG").ok());

    match path {
        Some(path) => {
            info!("Loading configuration from {}", path);
            SimulationConfig::load(&path)
                .with_context(|| format!("invalid configuration file {path}"))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(SimulationConfig::default())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Stop signal received, finishing the current tick");
}
