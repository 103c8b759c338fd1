//! Builds the initial particle set from configuration.
//!
//! The world is centred on the origin: it spans `[-width/2, width/2]` by
//! `[-height/2, height/2]`.

use crate::particle::Particle;
use anyhow::{Context, Result};
use coulomb_common::{SimulationConfig, Vec2};
use log::{debug, info};
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Creates every particle the configuration asks for: explicit ones first,
/// in file order, then `random_count` randomly placed ones.
pub fn build_particles(config: &SimulationConfig) -> Result<Vec<Particle>> {
    let ratio = config.physics.mass_to_radius_ratio;
    let ic = &config.initial_conditions;
    let mut particles = Vec::with_capacity(ic.particles.len() + ic.random_count as usize);

    for (i, p) in ic.particles.iter().enumerate() {
        let particle = Particle::new(p.mass, p.charge, Vec2::from(p.position))
            .and_then(|particle| match p.radius {
                Some(radius) => particle.with_radius(radius),
                None => particle.with_mass_to_radius_ratio(ratio),
            })
            .with_context(|| format!("Invalid particle #{} in initial_conditions", i))?;
        particles.push(particle);
    }

    if ic.random_count > 0 {
        let mut rng = StdRng::seed_from_u64(ic.seed);
        let positions = place_random_particles(config, &mut rng)?;
        for (i, position) in positions.into_iter().enumerate() {
            let charge = if ic.alternate_charge_signs && i % 2 == 1 {
                -ic.default_charge
            } else {
                ic.default_charge
            };
            let particle = Particle::new(ic.default_mass, charge, position)
                .and_then(|particle| particle.with_mass_to_radius_ratio(ratio))
                .with_context(|| format!("Invalid random particle #{}", i))?;
            particles.push(particle);
        }
        debug!("Placed {} random particles (seed {}).", ic.random_count, ic.seed);
    }

    info!("Scenario built with {} particles.", particles.len());
    Ok(particles)
}

/// Scatters `random_count` positions over the world using jittered grid bins,
/// so particles do not start on top of each other.
fn place_random_particles(config: &SimulationConfig, rng: &mut StdRng) -> Result<Vec<Vec2>> {
    let count = config.initial_conditions.random_count as usize;
    let margin = config.initial_conditions.default_mass * config.physics.mass_to_radius_ratio;
    let half_w = config.universe.width / 2.0;
    let half_h = config.universe.height / 2.0;

    let (x_min, x_max) = (-half_w + margin, half_w - margin);
    let (y_min, y_max) = (-half_h + margin, half_h - margin);
    if x_min >= x_max || y_min >= y_max {
        anyhow::bail!("World is too small for particles of radius {}", margin);
    }
    let width = x_max - x_min;
    let height = y_max - y_min;

    let cols = ((count as f64 * width / height).sqrt().floor() as usize).max(1);
    let rows = count.div_ceil(cols).max(1);
    // Create and shuffle grid bins
    let mut bins: Vec<(usize, usize)> = (0..cols)
        .flat_map(|ix| (0..rows).map(move |iy| (ix, iy)))
        .collect();
    bins.shuffle(rng);
    bins.truncate(count);

    // Sample one position per bin
    let cell_w = width / cols as f64;
    let cell_h = height / rows as f64;
    let mut positions = Vec::with_capacity(count);
    for (ix, iy) in bins {
        let x0 = x_min + ix as f64 * cell_w;
        let y0 = y_min + iy as f64 * cell_h;
        let dist_x = Uniform::new(x0, x0 + cell_w)?;
        let dist_y = Uniform::new(y0, y0 + cell_h)?;
        positions.push(Vec2::new(rng.sample(dist_x), rng.sample(dist_y)));
    }
    Ok(positions)
}
