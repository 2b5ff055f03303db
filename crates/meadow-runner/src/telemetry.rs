//! Logging setup for the runner.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,meadow_world=info,meadow_runner=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter and
/// `MEADOW_LOG_FORMAT=json` switches to JSON lines.
pub fn init_telemetry() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let json = std::env::var("MEADOW_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    info!(json, "Telemetry initialized");
    Ok(())
}
