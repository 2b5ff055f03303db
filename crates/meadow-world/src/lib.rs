//! Meadow simulation engine.
//!
//! This crate implements the grid of patches where the bunnies hop, eat,
//! mate, and eventually die, and the driver that advances it tick by tick.

pub mod bunny;
pub mod mating;
pub mod meadow;
pub mod patch;
pub mod population;
pub mod simulation;
pub mod weighted;

pub use bunny::Bunny;
pub use meadow::Meadow;
pub use patch::Patch;
pub use population::Population;
pub use simulation::{RunOutcome, Simulation, SimulationResult, TickReport};
pub use weighted::WeightedTable;
