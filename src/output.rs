use anyhow::{Context, Result};
use coulomb_common::{OutputFormat, ParticleState, Snapshot};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes every recorded snapshot to `<base>_snapshots.<ext>` and returns the path.
pub fn save_snapshots(base_filename: &str, format: OutputFormat, snapshots: &[Snapshot]) -> Result<PathBuf> {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Bincode => "bin",
        OutputFormat::Messagepack => "msgpack",
    };
    let filename = PathBuf::from(format!("{}_snapshots.{}", base_filename, extension));
    let file = File::create(&filename)
        .with_context(|| format!("Error creating snapshot file '{}'", filename.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => serde_json::to_writer(&mut writer, snapshots)
            .context("Error serializing snapshots to JSON")?,
        OutputFormat::Bincode => bincode::serialize_into(&mut writer, snapshots)
            .context("Error serializing snapshots to bincode")?,
        OutputFormat::Messagepack => rmp_serde::encode::write(&mut writer, snapshots)
            .context("Error serializing snapshots to MessagePack")?,
    }
    writer.flush()?;

    info!("{} snapshots saved to {} ({:?} format)", snapshots.len(), filename.display(), format);
    Ok(filename)
}

/// Writes one CSV row per particle with its final state.
pub fn save_final_states<P: AsRef<Path>>(path: P, particles: &[ParticleState]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Error creating CSV file '{}'", path.display()))?;
    writer.write_record([
        "index", "mass", "charge", "radius", "x", "y", "vx", "vy", "fx", "fy",
    ])?;
    for p in particles {
        writer.write_record(&[
            p.index.to_string(),
            p.mass.to_string(),
            p.charge.to_string(),
            p.radius.to_string(),
            format!("{:.6}", p.position.x),
            format!("{:.6}", p.position.y),
            format!("{:.6}", p.velocity.x),
            format!("{:.6}", p.velocity.y),
            format!("{:.6e}", p.force.x),
            format!("{:.6e}", p.force.y),
        ])?;
    }
    writer.flush()?;
    info!("Final states saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coulomb_common::Vec2;

    fn sample_state() -> ParticleState {
        ParticleState {
            index: 0,
            mass: 1.0,
            charge: -2.0,
            radius: 0.5,
            position: Vec2::new(1.5, -2.0),
            velocity: Vec2::zero(),
            force: Vec2::new(0.09, 0.0),
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_particle() {
        let path = std::env::temp_dir().join(format!("coulomb_final_{}.csv", std::process::id()));
        save_final_states(&path, &[sample_state()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("index,mass,charge"));
        assert!(lines[1].starts_with("0,1,-2,0.5,1.500000,-2.000000"));
    }

    #[test]
    fn json_snapshots_parse_back() {
        let base = std::env::temp_dir()
            .join(format!("coulomb_json_{}", std::process::id()))
            .display()
            .to_string();
        let snapshot = Snapshot {
            time: 0.5,
            step: 5,
            total_particle_count: 1,
            kinetic_energy: 0.0,
            particles: vec![sample_state()],
        };
        let path = save_snapshots(&base, OutputFormat::Json, &[snapshot]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["step"], 5);
        assert_eq!(value[0]["particles"][0]["position"]["x"], 1.5);
    }
}
