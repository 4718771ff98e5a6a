//! Evolarium: an evolutionary predator/prey simulation on a terrain grid.
//!
//! [`Simulation`] owns the world and advances it one tick at a time; the
//! other modules hold the pieces it is built from.

pub mod behavior;
pub mod config;
pub mod constants;
pub mod error;
pub mod food;
pub mod genetics;
pub mod mapgen;
pub mod organism;
pub mod simulation;
pub mod stats;
pub mod terrain;
pub mod utils;
pub mod wall;

pub use config::{
    AttributeMode, BalanceConfig, MapType, SimulationConfig, SpeciesBalance, TerrainPercentages,
};
pub use error::ConfigError;
pub use food::{Food, FoodId};
pub use genetics::AttributeOverrides;
pub use organism::{CommunicationType, Organism, OrganismId, Shape, Species};
pub use simulation::{MutableAttribute, Simulation, Snapshot};
pub use stats::{FinalStatistics, Statistics, Winner};
pub use terrain::{TerrainGrid, TerrainType};
pub use wall::Wall;
