use crate::vecmath::Vec2;
use serde::{Deserialize, Serialize};

/// Point-in-time copy of one particle, detached from the live simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleState {
    /// Position of the particle in the simulation's insertion order.
    pub index: usize,
    pub mass: f64,
    pub charge: f64,
    pub radius: f64,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Net force accumulated during the most recent update.
    pub force: Vec2,
}

/// A snapshot of the simulation state at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)] // Derive traits for easy saving
pub struct Snapshot {
    /// Accumulated simulated time (seconds) at which the snapshot was taken.
    pub time: f64,
    /// Number of completed updates.
    pub step: u64,
    /// The total number of particles in the simulation.
    pub total_particle_count: usize,
    /// Sum of `0.5 m |v|^2` over all particles. Diagnostic only.
    pub kinetic_energy: f64,
    pub particles: Vec<ParticleState>,
}
