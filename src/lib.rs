//! Charged-particle dynamics engine.
//!
//! Particles interact pairwise through an inverse-square (Coulomb) force and
//! are advanced with semi-implicit Euler steps, either by hand with a fixed
//! `dt` or by a background driver that scales wall-clock time.

pub mod cpu_state;
pub mod driver;
pub mod output;
pub mod particle;
pub mod scenario;
pub mod simulation;

pub use coulomb_common as common;
pub use cpu_state::CpuState;
pub use driver::{Clock, ManualClock, SystemClock};
pub use particle::{Particle, Polarity};
pub use simulation::{ParticlesView, Simulation};
