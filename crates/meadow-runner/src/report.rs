//! Run report written when the simulation ends.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use meadow_core::SimulationConfig;
use meadow_world::SimulationResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Everything a plotting tool needs to draw the population curve
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub finished_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub result: SimulationResult,
}

impl RunReport {
    pub fn new(config: SimulationConfig, result: SimulationResult) -> Self {
        Self {
            finished_at: Utc::now(),
            config,
            result,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write run report to {}", path.display()))?;
        info!(
            path = %path.display(),
            ticks = self.result.final_tick,
            "Run report written"
        );
        Ok(())
    }
}
