//! Configuration types for the simulation.

use crate::{Error, Result, Tick};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Meadow configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeadowConfig {
    /// Width of the meadow grid
    pub width: i32,
    /// Height of the meadow grid
    pub height: i32,
    /// Whether the edges wrap around (torus) or are fenced
    pub wraps: bool,
    /// Maximum greens per patch
    pub max_resource: f64,
    /// Greens on every patch when the run starts
    pub starting_resource: f64,
    /// Fractional growth of the greens per tick
    pub growth_rate: f64,
}

impl Default for MeadowConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            wraps: false,
            max_resource: 100.0,
            starting_resource: 100.0,
            growth_rate: 0.0155,
        }
    }
}

/// Bunny population and behavior parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BunnyConfig {
    pub starting_males: u32,
    pub starting_females: u32,
    /// Energy burned every tick; also how much a bunny tries to eat
    pub hunger: f64,
    /// Energy of the seed population, and the reference for energy-scaled mating
    pub starting_energy: f64,
    pub min_hops: u32,
    pub max_hops: u32,
    /// Base probability that an eligible pair mates
    pub mating_chance: f64,
    /// Multiply the mating chance by `energy / starting_energy`
    pub scale_mating_chance_with_energy: bool,
    /// Ticks a bunny must wait between matings
    pub mating_cooldown: Tick,
    pub min_litter: u32,
    pub max_litter: u32,
    pub min_lifespan: Tick,
    pub max_lifespan: Tick,
}

impl Default for BunnyConfig {
    fn default() -> Self {
        let mating_cooldown = 100;
        Self {
            starting_males: 10,
            starting_females: 10,
            hunger: 10.0,
            starting_energy: 100.0,
            min_hops: 2,
            max_hops: 10,
            mating_chance: 0.2,
            scale_mating_chance_with_energy: true,
            mating_cooldown,
            min_litter: 2,
            max_litter: 10,
            min_lifespan: 30 * mating_cooldown,
            max_lifespan: 40 * mating_cooldown,
        }
    }
}

/// Full configuration for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Stop after this many ticks even if bunnies remain
    pub max_ticks: Option<u64>,
    /// Ticks between population metric log lines (0 disables them)
    pub progress_interval: u64,
    pub meadow: MeadowConfig,
    pub bunny: BunnyConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: None,
            progress_interval: 100,
            meadow: MeadowConfig::default(),
            bunny: BunnyConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loaded configuration file");
        Self::from_json_str(&contents)
    }

    /// Check every parameter the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let meadow = &self.meadow;
        let bunny = &self.bunny;

        if meadow.width <= 0 || meadow.height <= 0 {
            return Err(invalid(format!(
                "meadow dimensions must be positive, got {}x{}",
                meadow.width, meadow.height
            )));
        }
        if meadow.width.checked_mul(meadow.height).is_none() {
            return Err(invalid(format!(
                "meadow of {}x{} patches is too large",
                meadow.width, meadow.height
            )));
        }
        if !(meadow.max_resource > 0.0) {
            return Err(invalid(format!(
                "max_resource must be positive, got {}",
                meadow.max_resource
            )));
        }
        if !(0.0..=meadow.max_resource).contains(&meadow.starting_resource) {
            return Err(invalid(format!(
                "starting_resource {} outside [0, {}]",
                meadow.starting_resource, meadow.max_resource
            )));
        }
        if !(meadow.growth_rate >= 0.0) {
            return Err(invalid(format!(
                "growth_rate must be non-negative, got {}",
                meadow.growth_rate
            )));
        }
        if !(bunny.hunger >= 0.0) {
            return Err(invalid(format!(
                "hunger must be non-negative, got {}",
                bunny.hunger
            )));
        }
        if !(bunny.starting_energy > 0.0) {
            return Err(invalid(format!(
                "starting_energy must be positive, got {}",
                bunny.starting_energy
            )));
        }
        if !(0.0..=1.0).contains(&bunny.mating_chance) {
            return Err(invalid(format!(
                "mating_chance {} outside [0, 1]",
                bunny.mating_chance
            )));
        }
        if bunny.mating_cooldown < 0 {
            return Err(invalid(format!(
                "mating_cooldown must be non-negative, got {}",
                bunny.mating_cooldown
            )));
        }
        check_range("hops", bunny.min_hops, bunny.max_hops)?;
        check_range("litter", bunny.min_litter, bunny.max_litter)?;
        check_range("lifespan", bunny.min_lifespan, bunny.max_lifespan)?;
        if bunny.min_lifespan < 0 {
            return Err(invalid(format!(
                "min_lifespan must be non-negative, got {}",
                bunny.min_lifespan
            )));
        }

        Ok(())
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(name: &str, min: T, max: T) -> Result<()> {
    if min > max {
        return Err(invalid(format!("min {name} {min} exceeds max {name} {max}")));
    }
    Ok(())
}

fn invalid(message: String) -> Error {
    Error::Validation(message)
}
