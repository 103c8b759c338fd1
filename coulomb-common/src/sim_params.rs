use serde::{Deserialize, Serialize};

/// Electrical constant, rounded (N m^2 / C^2).
pub const COULOMB_K: f64 = 9e9;
/// Display radius per unit mass. Cosmetic, never used by the physics.
pub const MASS_TO_RADIUS_RATIO: f64 = 0.5;
pub const DEFAULT_TIME_SCALE: f64 = 1.0;
/// Real-time driver cadence.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1;

/// Simulation parameters derived from the configuration, used frequently during simulation steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    // World bounds (stored for consumers, not consulted by the force law)
    pub world_width: f64,
    pub world_height: f64,

    // Physics
    pub coulomb_k: f64,
    pub mass_to_radius_ratio: f64,

    // Time
    pub time_scale: f64,
    pub dt: f64, // Fixed step used by manual stepping
    pub tick_interval_ms: u64,
}

impl SimParams {
    /// Parameters for a world of the given size with every other value at its default.
    pub fn with_bounds(world_width: f64, world_height: f64) -> Self {
        Self {
            world_width,
            world_height,
            ..Self::default()
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            world_width: 1000.0,
            world_height: 700.0,
            coulomb_k: COULOMB_K,
            mass_to_radius_ratio: MASS_TO_RADIUS_RATIO,
            time_scale: DEFAULT_TIME_SCALE,
            dt: 0.01,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}
