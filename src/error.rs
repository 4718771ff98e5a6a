use thiserror::Error;

/// Rejections raised by [`SimulationConfig::validate`](crate::config::SimulationConfig::validate).
///
/// Validation always runs before any world state is touched, so a failed
/// `initialize` leaves the previous run intact.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("custom map terrain percentages must sum to 100, got {total}")]
    TerrainPercentages { total: u32 },
    #[error("world {width}x{height} with cell size {cell_size} is not a usable grid")]
    InvalidDimensions {
        width: f32,
        height: f32,
        cell_size: f32,
    },
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
}
