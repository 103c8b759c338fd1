pub mod config;
pub mod error;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    InitialConditions, OutputConfig, OutputFormat, ParticleConfig, PhysicsConfig,
    RunMode, SimulationConfig, TimingConfig, UniverseConfig,
};
pub use error::{ParticleError, VectorError};
pub use sim_params::{
    SimParams, COULOMB_K, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIME_SCALE, MASS_TO_RADIUS_RATIO,
};
pub use snapshot::{ParticleState, Snapshot};
pub use vecmath::Vec2;
