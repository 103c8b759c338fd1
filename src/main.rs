use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, trace, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use coulomb_engine::common::{RunMode, SimulationConfig};
use coulomb_engine::{output, scenario, Simulation};

/// Headless runner for the charged-particle engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario TOML file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of fixed steps
    #[arg(long)]
    steps: Option<u64>,

    /// Run with the real-time driver for this many seconds instead of fixed steps
    #[arg(long)]
    realtime: Option<f64>,

    /// Override the time scale
    #[arg(long)]
    scale: Option<f64>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Coulomb engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(steps) = args.steps {
        config.timing.total_steps = steps;
    }
    if let Some(secs) = args.realtime {
        config.timing.mode = RunMode::Realtime;
        config.timing.duration_secs = secs;
    }
    if let Some(scale) = args.scale {
        config.timing.time_scale = scale;
    }
    config.validate().context("Invalid command-line overrides")?;

    // --- Initialize Simulation ---
    let mut sim = Simulation::from_config(&config);
    for particle in scenario::build_particles(&config)? {
        sim.add(particle);
    }
    if sim.particle_count() < 2 {
        warn!("Fewer than two particles; nothing will interact.");
    }
    debug!("Simulation Parameters: {:#?}", sim.params());

    let start_time = Instant::now();
    sim.record_snapshot();

    match config.timing.mode {
        RunMode::Fixed => run_fixed(&mut sim, &config),
        RunMode::Realtime => run_realtime(&mut sim, &config)?,
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished: {} updates, {:.4} s simulated, {:.3} s wall clock.",
        sim.current_time_step(),
        sim.elapsed_time(),
        total_duration.as_secs_f64()
    );

    // --- Save Recorded Data ---
    if config.output.save_snapshots {
        output::save_snapshots(
            &config.output.base_filename,
            config.output.format,
            sim.recorded_snapshots(),
        )?;
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if config.output.save_final_states {
        let filename = format!("{}_final_states.csv", config.output.base_filename);
        output::save_final_states(&filename, &sim.snapshot().particles)?;
    } else {
        info!("Skipping saving final states as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Deterministic mode: constant `dt`, no driver thread.
fn run_fixed(sim: &mut Simulation, config: &SimulationConfig) {
    let total_steps = config.timing.total_steps;
    let dt = config.timing.dt * config.timing.time_scale;
    let record_interval_steps = config.timing.record_interval_steps.max(1);
    info!("Running {} fixed steps of {:.6} s.", total_steps, dt);

    let mut previous_print_time = Instant::now();
    for step in 1..=total_steps {
        let step_start_time = Instant::now();
        sim.update(dt);
        trace!("Step [{}/{}] completed in {:?}", step, total_steps, step_start_time.elapsed());

        if previous_print_time.elapsed() >= Duration::from_secs(5) {
            info!("Step [{}/{}] | t = {:.4} s", step, total_steps, sim.elapsed_time());
            previous_print_time = Instant::now();
        }
        if step % record_interval_steps == 0 || step == total_steps {
            sim.record_snapshot();
        }
    }
}

/// Wall-clock mode: the driver thread advances the state while we sample it.
fn run_realtime(sim: &mut Simulation, config: &SimulationConfig) -> Result<()> {
    let duration = Duration::try_from_secs_f64(config.timing.duration_secs)
        .with_context(|| format!("Invalid realtime duration {} s", config.timing.duration_secs))?;
    let record_interval = Duration::from_millis(config.timing.record_interval_ms.max(1));
    info!("Running real-time for {:?}, sampling every {:?}.", duration, record_interval);

    let start = Instant::now();
    sim.start()?;
    while start.elapsed() < duration {
        thread::sleep(record_interval.min(duration.saturating_sub(start.elapsed())));
        sim.record_snapshot();
    }
    sim.stop();
    sim.record_snapshot();
    Ok(())
}
