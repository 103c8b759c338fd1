use crate::sim_params::{
    SimParams, COULOMB_K, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TIME_SCALE, MASS_TO_RADIUS_RATIO,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// World bounds. Kept for consumers; the force law does not read them.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UniverseConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self { width: default_width(), height: default_height() }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PhysicsConfig {
    #[serde(default = "default_coulomb_k")]
    pub coulomb_k: f64,
    #[serde(default = "default_mass_to_radius_ratio")]
    pub mass_to_radius_ratio: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            coulomb_k: default_coulomb_k(),
            mass_to_radius_ratio: default_mass_to_radius_ratio(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Manual `update(dt)` calls with a constant step.
    #[default]
    Fixed,
    /// Wall-clock driver scaled by `time_scale`.
    Realtime,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_total_steps")]
    pub total_steps: u64,
    #[serde(default = "default_duration_secs")]
    pub duration_secs: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_record_interval_steps")]
    pub record_interval_steps: u64,
    #[serde(default = "default_record_interval_ms")]
    pub record_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Fixed,
            time_scale: default_time_scale(),
            dt: default_dt(),
            total_steps: default_total_steps(),
            duration_secs: default_duration_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            record_interval_steps: default_record_interval_steps(),
            record_interval_ms: default_record_interval_ms(),
        }
    }
}

/// One explicitly placed particle.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ParticleConfig {
    pub mass: f64,
    pub charge: f64,
    pub position: [f64; 2],
    #[serde(default)]
    pub radius: Option<f64>,
}

// Initial conditions for the simulation, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InitialConditions {
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of particles scattered at random inside the world bounds.
    #[serde(default)]
    pub random_count: u32,
    #[serde(default = "default_mass")]
    pub default_mass: f64,
    #[serde(default = "default_charge")]
    pub default_charge: f64,
    /// Flip the sign of every other randomly placed particle's charge.
    #[serde(default = "default_alternate_charge_signs")]
    pub alternate_charge_signs: bool,
    #[serde(default)]
    pub particles: Vec<ParticleConfig>,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            random_count: 0,
            default_mass: default_mass(),
            default_charge: default_charge(),
            alternate_charge_signs: default_alternate_charge_signs(),
            particles: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
    Messagepack,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_snapshots: bool,
    #[serde(default = "default_true")]
    pub save_final_states: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_filename: default_base_filename(),
            save_snapshots: true,
            save_final_states: true,
            format: OutputFormat::Json,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values a simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.universe.width > 0.0 && self.universe.height > 0.0) {
            anyhow::bail!("universe width and height must be positive.");
        }
        if !self.physics.coulomb_k.is_finite() {
            anyhow::bail!("coulomb_k must be finite.");
        }
        if !(self.physics.mass_to_radius_ratio > 0.0) {
            anyhow::bail!("mass_to_radius_ratio must be positive.");
        }
        if !(self.timing.time_scale >= 0.0 && self.timing.time_scale.is_finite()) {
            anyhow::bail!("time_scale must be a finite, non-negative number.");
        }
        if !(self.timing.dt >= 0.0 && self.timing.dt.is_finite()) {
            anyhow::bail!("dt must be a finite, non-negative number.");
        }
        if self.timing.mode == RunMode::Realtime
            && !(self.timing.duration_secs > 0.0 && self.timing.duration_secs.is_finite())
        {
            anyhow::bail!("duration_secs must be finite and positive in realtime mode.");
        }
        if !(self.initial_conditions.default_mass > 0.0) {
            anyhow::bail!("default_mass must be positive.");
        }
        for (i, p) in self.initial_conditions.particles.iter().enumerate() {
            if !(p.mass > 0.0) {
                anyhow::bail!("particle {} has non-positive mass {}.", i, p.mass);
            }
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams {
            world_width: self.universe.width,
            world_height: self.universe.height,
            coulomb_k: self.physics.coulomb_k,
            mass_to_radius_ratio: self.physics.mass_to_radius_ratio,
            time_scale: self.timing.time_scale,
            dt: self.timing.dt,
            tick_interval_ms: self.timing.tick_interval_ms.max(1),
        }
    }
}

fn default_width() -> f64 {
    1000.0
}

fn default_height() -> f64 {
    700.0
}

fn default_coulomb_k() -> f64 {
    COULOMB_K
}

fn default_mass_to_radius_ratio() -> f64 {
    MASS_TO_RADIUS_RATIO
}

fn default_time_scale() -> f64 {
    DEFAULT_TIME_SCALE
}

fn default_dt() -> f64 {
    0.01
}

fn default_total_steps() -> u64 {
    1000
}

fn default_duration_secs() -> f64 {
    5.0
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_record_interval_steps() -> u64 {
    10
}

fn default_record_interval_ms() -> u64 {
    100
}

fn default_seed() -> u64 {
    42
}

// Mass and charge the interactive controller gave each new particle
fn default_mass() -> f64 {
    0.1
}

fn default_charge() -> f64 {
    1e-3
}

fn default_alternate_charge_signs() -> bool {
    true
}

fn default_base_filename() -> String {
    "run".to_string()
}

fn default_true() -> bool {
    true
}
