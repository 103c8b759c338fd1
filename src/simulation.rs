use crate::cpu_state::CpuState;
use crate::driver::{lock_state, Clock, Driver, SharedScale, SystemClock};
use crate::particle::Particle;
use anyhow::Result;
use coulomb_common::{SimParams, SimulationConfig, Snapshot};
use log::{debug, info, warn};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Manages the particle collection and the lifecycle of its real-time driver.
///
/// The simulation is the only writer of particle dynamic state. It can be
/// stepped by hand with [`Simulation::update`] or handed to a background
/// driver with [`Simulation::start`]; both paths run the same three-phase
/// update under the state lock.
pub struct Simulation {
    /// Particle collection plus step counter, shared with the driver thread.
    state: Arc<Mutex<CpuState>>,
    time_scale: SharedScale,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    /// The active driver, if running. At most one exists at a time.
    driver: Option<Driver>,
    /// Number of driver firings since construction.
    ticks: Arc<AtomicU64>,
    /// Stores collected snapshots at record intervals.
    recorded_snapshots: Vec<Snapshot>,
}

impl Simulation {
    /// Creates an idle simulation for a world of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_params(SimParams::with_bounds(width, height))
    }

    /// Creates an idle simulation from derived parameters.
    pub fn with_params(params: SimParams) -> Self {
        let time_scale = SharedScale::new(params.time_scale);
        let tick_interval = Duration::from_millis(params.tick_interval_ms.max(1));
        Self {
            state: Arc::new(Mutex::new(CpuState::new(params))),
            time_scale,
            clock: Arc::new(SystemClock::new()),
            tick_interval,
            driver: None,
            ticks: Arc::new(AtomicU64::new(0)),
            recorded_snapshots: Vec::new(),
        }
    }

    /// Creates an idle, empty simulation from a loaded configuration.
    /// Particles are added separately (see `scenario::build_particles`).
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::with_params(config.get_sim_params())
    }

    pub fn with_time_scale(self, scale: f64) -> Self {
        self.set_scale(scale);
        self
    }

    /// Replaces the time source used by the real-time driver.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_coulomb_constant(self, k: f64) -> Self {
        lock_state(&self.state).params.coulomb_k = k;
        self
    }

    /// Appends a particle. Allowed while running; it participates from the next tick.
    pub fn add(&self, particle: Particle) {
        let mut state = lock_state(&self.state);
        state.add_particle(particle);
        debug!("Added particle #{}.", state.num_particles());
    }

    /// Starts the real-time driver.
    ///
    /// Returns `Ok(false)` without spawning anything if a driver is already
    /// running.
    pub fn start(&mut self) -> Result<bool> {
        if self.driver.is_some() {
            warn!("Simulation already running; ignoring start().");
            return Ok(false);
        }
        let driver = Driver::spawn(
            Arc::clone(&self.state),
            self.time_scale.clone(),
            Arc::clone(&self.clock),
            self.tick_interval,
            Arc::clone(&self.ticks),
        )?;
        self.driver = Some(driver);
        info!(
            "Simulation started ({} particles, scale {}, tick every {:?}).",
            self.particle_count(),
            self.time_scale(),
            self.tick_interval
        );
        Ok(true)
    }

    /// Stops the real-time driver, waiting for an in-flight update to finish.
    ///
    /// Returns `false` if the simulation was idle.
    pub fn stop(&mut self) -> bool {
        match self.driver.take() {
            Some(driver) => {
                driver.stop();
                info!("Simulation stopped after {} ticks.", self.ticks());
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_some()
    }

    /// Sets the multiplier applied to elapsed clock time. Takes effect on the next tick.
    ///
    /// NaN, infinite and negative factors are ignored and the current scale is kept.
    pub fn set_scale(&self, scale: f64) {
        if !(scale >= 0.0 && scale.is_finite()) {
            warn!("Ignoring invalid time scale {}; keeping {}.", scale, self.time_scale());
            return;
        }
        self.time_scale.set(scale);
        lock_state(&self.state).params.time_scale = scale;
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale.get()
    }

    /// Runs one three-phase update with an explicit `dt`, independent of the driver.
    pub fn update(&self, dt: f64) {
        lock_state(&self.state).update(dt);
    }

    /// Runs `steps` fixed-`dt` updates back to back.
    pub fn run_steps(&self, steps: u64, dt: f64) {
        let mut state = lock_state(&self.state);
        for _ in 0..steps {
            state.update(dt);
        }
    }

    /// Live read-only view of the particles.
    ///
    /// Holds the state lock while alive, so the driver waits; keep it short.
    /// Calling any other method on this `Simulation` while the view is alive
    /// (including later in the same expression) deadlocks. Prefer
    /// [`Simulation::with_particles`] when that matters.
    pub fn particles(&self) -> ParticlesView<'_> {
        ParticlesView { guard: lock_state(&self.state) }
    }

    /// Runs `f` over the live particles and releases the lock before returning.
    pub fn with_particles<R>(&self, f: impl FnOnce(&[Particle]) -> R) -> R {
        let state = lock_state(&self.state);
        f(state.particles())
    }

    /// Point-in-time copy of every particle.
    pub fn snapshot(&self) -> Snapshot {
        lock_state(&self.state).snapshot()
    }

    pub fn particle_count(&self) -> usize {
        lock_state(&self.state).num_particles()
    }

    /// World bounds as `(width, height)`.
    pub fn bounds(&self) -> (f64, f64) {
        let state = lock_state(&self.state);
        (state.params.world_width, state.params.world_height)
    }

    /// Provides a copy of the runtime parameters.
    pub fn params(&self) -> SimParams {
        lock_state(&self.state).params.clone()
    }

    pub fn current_time_step(&self) -> u64 {
        lock_state(&self.state).time_step()
    }

    /// Total simulated time so far, in seconds.
    pub fn elapsed_time(&self) -> f64 {
        lock_state(&self.state).elapsed_time()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Takes a snapshot and stores it in the trajectory log.
    pub fn record_snapshot(&mut self) {
        let snapshot = self.snapshot();
        debug!(
            "Recording snapshot at t={:.4}s (step {}, KE {:.4e} J).",
            snapshot.time, snapshot.step, snapshot.kinetic_energy
        );
        self.recorded_snapshots.push(snapshot);
    }

    /// Provides access to the recorded snapshots.
    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Locked, read-only view of the live particle collection.
pub struct ParticlesView<'a> {
    guard: MutexGuard<'a, CpuState>,
}

impl Deref for ParticlesView<'_> {
    type Target = [Particle];

    fn deref(&self) -> &[Particle] {
        self.guard.particles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ManualClock;
    use coulomb_common::Vec2;
    use std::thread;
    use std::time::Instant;

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn stop_before_start_is_a_noop() {
        let mut sim = Simulation::new(100.0, 100.0);
        assert!(!sim.stop());
        assert!(!sim.is_running());
    }

    #[test]
    fn start_and_stop_toggle_running() {
        let mut sim = Simulation::new(100.0, 100.0).with_clock(Arc::new(ManualClock::new()));
        assert!(sim.start().unwrap());
        assert!(sim.is_running());
        wait_until(|| sim.ticks() > 0);
        assert!(sim.stop());
        assert!(!sim.is_running());
        assert!(!sim.stop());
    }

    #[test]
    fn second_start_does_not_double_time() {
        let clock = ManualClock::new();
        let mut sim = Simulation::new(100.0, 100.0).with_clock(Arc::new(clock.clone()));
        assert!(sim.start().unwrap());
        assert!(!sim.start().unwrap());

        clock.advance(Duration::from_secs(1));
        wait_until(|| sim.elapsed_time() >= 1.0);
        let ticks = sim.ticks();
        wait_until(|| sim.ticks() > ticks + 5);
        sim.stop();

        assert!((sim.elapsed_time() - 1.0).abs() < 1e-9, "elapsed {}", sim.elapsed_time());
    }

    #[test]
    fn driver_applies_time_scale() {
        let clock = ManualClock::new();
        let mut sim = Simulation::new(100.0, 100.0)
            .with_time_scale(0.5)
            .with_clock(Arc::new(clock.clone()));
        sim.start().unwrap();
        clock.advance(Duration::from_secs(2));
        wait_until(|| sim.elapsed_time() >= 1.0);
        sim.stop();
        assert!((sim.elapsed_time() - 1.0).abs() < 1e-9);
        assert_eq!(sim.params().time_scale, 0.5);
    }

    #[test]
    fn set_scale_while_running_applies_from_next_tick() {
        let clock = ManualClock::new();
        let mut sim = Simulation::new(100.0, 100.0).with_clock(Arc::new(clock.clone()));
        sim.start().unwrap();

        clock.advance(Duration::from_secs(1));
        wait_until(|| sim.elapsed_time() >= 1.0);
        sim.set_scale(2.0);
        clock.advance(Duration::from_secs(1));
        wait_until(|| sim.elapsed_time() >= 3.0);
        sim.stop();

        assert!((sim.elapsed_time() - 3.0).abs() < 1e-9, "elapsed {}", sim.elapsed_time());
    }

    #[test]
    fn invalid_time_scales_are_ignored() {
        let sim = Simulation::new(100.0, 100.0).with_time_scale(f64::NAN);
        assert_eq!(sim.time_scale(), 1.0);

        sim.set_scale(0.25);
        sim.set_scale(-3.0);
        sim.set_scale(f64::INFINITY);
        assert_eq!(sim.time_scale(), 0.25);
        assert_eq!(sim.params().time_scale, 0.25);

        sim.set_scale(0.0);
        assert_eq!(sim.time_scale(), 0.0);
    }

    #[test]
    fn with_particles_releases_the_lock_before_returning() {
        let sim = Simulation::new(100.0, 100.0);
        sim.add(Particle::new(1.0, 1e-6, Vec2::new(0.0, 0.0)).unwrap());
        sim.add(Particle::new(1.0, -1e-6, Vec2::new(1.0, 0.0)).unwrap());

        let total = sim.with_particles(|ps| ps.len()) + sim.particle_count();
        assert_eq!(total, 4);

        let charges = sim.with_particles(|ps| ps.iter().map(|p| p.charge()).sum::<f64>());
        assert_eq!(charges, 0.0);
    }

    #[test]
    fn particles_added_while_running_join_the_next_tick() {
        let mut sim = Simulation::new(100.0, 100.0).with_clock(Arc::new(ManualClock::new()));
        sim.add(Particle::new(1.0, 1e-6, Vec2::new(0.0, 0.0)).unwrap());
        sim.start().unwrap();
        sim.add(Particle::new(1.0, 1e-6, Vec2::new(1.0, 0.0)).unwrap());

        let ticks = sim.ticks();
        wait_until(|| sim.ticks() > ticks + 1);
        sim.stop();

        // Clock never moved, so nothing moved, but forces were computed.
        let particles = sim.particles();
        assert_eq!(particles.len(), 2);
        assert!(particles[1].force().x > 0.0);
        assert_eq!(particles[1].position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn snapshot_is_detached_from_later_updates() {
        let sim = Simulation::new(100.0, 100.0);
        sim.add(Particle::new(1.0, 1e-6, Vec2::new(0.0, 0.0)).unwrap());
        sim.add(Particle::new(1.0, -1e-6, Vec2::new(1.0, 0.0)).unwrap());
        let before = sim.snapshot();
        sim.run_steps(3, 0.1);

        assert_eq!(before.step, 0);
        assert_eq!(before.particles[0].position, Vec2::new(0.0, 0.0));
        assert_eq!(sim.current_time_step(), 3);
        assert!(sim.particles()[0].position().x > 0.0);
    }

    #[test]
    fn recorded_snapshots_accumulate() {
        let mut sim = Simulation::new(10.0, 10.0);
        sim.record_snapshot();
        sim.update(0.5);
        sim.record_snapshot();
        let times: Vec<f64> = sim.recorded_snapshots().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 0.5]);
        assert_eq!(sim.bounds(), (10.0, 10.0));
    }
}
