use crate::particle::Particle;
use coulomb_common::{SimParams, Snapshot};
use log::trace;

/// Holds the particle collection and the simulation clock on the CPU.
#[derive(Debug, Clone)]
pub struct CpuState {
    pub params: SimParams,
    particles: Vec<Particle>,
    /// Number of completed updates.
    time_step: u64,
    /// Sum of every `dt` passed to `update`.
    elapsed_time: f64,
}

impl CpuState {
    pub fn new(params: SimParams) -> Self {
        Self {
            params,
            particles: Vec::new(),
            time_step: 0,
            elapsed_time: 0.0,
        }
    }

    /// Appends a particle; it takes part from the next update on.
    pub fn add_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Advances every particle by `dt` seconds of simulated time.
    ///
    /// Three phases, each finished for all particles before the next starts:
    /// clear forces, accumulate pairwise forces, integrate.
    pub fn update(&mut self, dt: f64) {
        // --- 1. Reset ---
        for particle in self.particles.iter_mut() {
            particle.reset();
        }

        // --- 2. Accumulate ---
        // Every ordered pair (i, j), i != j: particle i pushes its force onto j.
        // Each unordered pair is therefore evaluated once from each side.
        let k = self.params.coulomb_k;
        for i in 0..self.particles.len() {
            let (before, rest) = self.particles.split_at_mut(i);
            if let Some((source, after)) = rest.split_first_mut() {
                source.act(before.iter_mut().chain(after.iter_mut()), k);
            }
        }

        // --- 3. Integrate ---
        for particle in self.particles.iter_mut() {
            particle.step(dt);
        }

        self.time_step += 1;
        self.elapsed_time += dt;
        trace!("update #{} dt={:.6}s particles={}", self.time_step, dt, self.particles.len());
    }

    /// Copies the current state into a detached snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let particles: Vec<_> = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| p.state(i))
            .collect();
        Snapshot {
            time: self.elapsed_time,
            step: self.time_step,
            total_particle_count: particles.len(),
            kinetic_energy: self.particles.iter().map(Particle::kinetic_energy).sum(),
            particles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coulomb_common::Vec2;

    fn state_with(particles: &[(f64, f64, f64, f64)]) -> CpuState {
        let mut state = CpuState::new(SimParams::default());
        for &(mass, charge, x, y) in particles {
            state.add_particle(Particle::new(mass, charge, Vec2::new(x, y)).unwrap());
        }
        state
    }

    #[test]
    fn update_with_zero_dt_only_recomputes_forces() {
        let mut state = state_with(&[(1.0, 1e-6, 0.0, 0.0), (1.0, 1e-6, 1.0, 0.0)]);
        state.update(0.0);

        for p in state.particles() {
            assert_eq!(p.velocity(), Vec2::zero());
            assert_ne!(p.force(), Vec2::zero());
        }
        assert_eq!(state.particles()[0].position(), Vec2::new(0.0, 0.0));
        assert_eq!(state.particles()[1].position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn forces_are_recomputed_not_accumulated_across_updates() {
        let mut state = state_with(&[(1.0, 1e-6, 0.0, 0.0), (1.0, -1e-6, 2.0, 0.0)]);
        state.update(0.0);
        let first = state.particles()[0].force();
        state.update(0.0);
        assert_eq!(state.particles()[0].force(), first);
    }

    #[test]
    fn net_force_on_middle_of_symmetric_row_cancels() {
        let mut state = state_with(&[
            (1.0, 1e-6, -1.0, 0.0),
            (1.0, 1e-6, 0.0, 0.0),
            (1.0, 1e-6, 1.0, 0.0),
        ]);
        state.update(0.0);
        assert!(state.particles()[1].force().length() < 1e-15);
        assert!(state.particles()[0].force().x < 0.0);
        assert!(state.particles()[2].force().x > 0.0);
    }

    #[test]
    fn single_particle_feels_nothing() {
        let mut state = state_with(&[(1.0, 1.0, 3.0, 4.0)]);
        state.update(1.0);
        let p = &state.particles()[0];
        assert_eq!(p.force(), Vec2::zero());
        assert_eq!(p.position(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn tracks_steps_and_elapsed_time() {
        let mut state = state_with(&[]);
        state.update(0.25);
        state.update(0.5);
        assert_eq!(state.time_step(), 2);
        assert!((state.elapsed_time() - 0.75).abs() < 1e-12);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.step, 2);
        assert_eq!(snapshot.total_particle_count, 0);
    }
}
