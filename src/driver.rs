//! Periodic real-time driver.
//!
//! The driver owns a background thread that repeatedly measures elapsed
//! clock time, scales it, and runs one update on the shared state. Time is
//! read through the [`Clock`] trait so tests can substitute a manual clock.

use crate::cpu_state::CpuState;
use anyhow::{Context, Result};
use log::{debug, error, trace};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary origin.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Time scale shared between the simulation and its driver thread.
///
/// Stored as the bit pattern of an `f64` so it can be swapped without a lock.
#[derive(Debug, Clone)]
pub struct SharedScale(Arc<AtomicU64>);

impl SharedScale {
    pub fn new(scale: f64) -> Self {
        Self(Arc::new(AtomicU64::new(scale.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, scale: f64) {
        self.0.store(scale.to_bits(), Ordering::Relaxed);
    }
}

/// Locks the shared state, recovering it if a previous holder panicked.
///
/// Each update only ever leaves fully written particle fields behind, so the
/// recovered collection is still usable.
pub fn lock_state(state: &Mutex<CpuState>) -> MutexGuard<'_, CpuState> {
    state.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        error!("Simulation state lock was poisoned; recovering last written state.");
        poisoned.into_inner()
    })
}

/// Handle to a running driver thread. Stopping joins the thread, so an
/// in-flight update always completes first.
#[derive(Debug)]
pub struct Driver {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Driver {
    /// Spawns the driver thread.
    ///
    /// The first `dt` is measured from the moment of this call, so clock
    /// time that passes while the thread starts up is not lost.
    pub fn spawn(
        state: Arc<Mutex<CpuState>>,
        scale: SharedScale,
        clock: Arc<dyn Clock>,
        interval: Duration,
        ticks: Arc<AtomicU64>,
    ) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);
        let mut last = clock.now();

        let handle = thread::Builder::new()
            .name("coulomb-driver".to_string())
            .spawn(move || {
                debug!("Driver thread started (interval {:?}).", interval);
                while !thread_stop.load(Ordering::Acquire) {
                    thread::sleep(interval);
                    if thread_stop.load(Ordering::Acquire) {
                        break;
                    }

                    let now = clock.now();
                    let dt = now.saturating_sub(last).as_secs_f64() * scale.get();
                    last = now;

                    let tick_start = Instant::now();
                    lock_state(&state).update(dt);
                    ticks.fetch_add(1, Ordering::Relaxed);
                    trace!("Driver tick dt={:.6}s took {:?}", dt, tick_start.elapsed());
                }
                debug!("Driver thread exiting.");
            })
            .context("Failed to spawn simulation driver thread")?;

        Ok(Self { stop_flag, handle: Some(handle) })
    }

    /// Signals the thread to stop and waits for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Simulation driver thread panicked.");
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
