//! JSON exporter for genesis runs.
//!
//! Records body positions and the population trajectory frame by frame
//! so a world can be replayed or plotted offline.

use crate::world::{GenesisReport, GenesisWorld, SimConfig};

use bloom_core::{Body, PopulationState};
use bloom_env::{BloomError, BloomResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Orbital time in years
    pub orbit_time: f64,

    /// Ecology model time
    pub ecology_time: f64,

    /// Body positions
    pub bodies: Vec<BodyPosition>,

    /// Prey and predator counts
    pub population: PopulationSample,

    /// Events (merges, ejections, extinctions)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

/// Position and mass of a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyPosition {
    pub id: u64,
    pub mass: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BodyPosition {
    pub fn new(body: &Body) -> Self {
        Self {
            id: body.id,
            mass: body.mass,
            x: body.position.x,
            y: body.position.y,
            z: body.position.z,
        }
    }
}

/// Population counts at a frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PopulationSample {
    pub prey: f64,
    pub predator: f64,
}

impl From<PopulationState> for PopulationSample {
    fn from(state: PopulationState) -> Self {
        Self {
            prey: state.prey,
            predator: state.predator,
        }
    }
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: String,

    /// Orbital time covered, in years
    pub duration: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Final world fingerprint if applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<u64>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: impl Into<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed: seed.into(),
            duration: 0.0,
            frames: Vec::new(),
            passed: false,
            fingerprint: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration = frame.orbit_time;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, fingerprint: Option<u64>) {
        self.passed = passed;
        self.fingerprint = fingerprint;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> BloomResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(BloomError::config)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Runs a genesis world and records a frame every `frame_interval` N-body
/// steps. Ecology advances in proportion so both finish together.
pub fn record_genesis(config: SimConfig, frame_interval: usize) -> BloomResult<(SimExport, GenesisReport)> {
    let interval = frame_interval.max(1);
    let orbit_steps = config.steps;
    let ecology_steps = config.ecology_steps;
    let mut export = SimExport::new("genesis", config.seed.to_string());
    let mut world = GenesisWorld::new(config)?;

    export.add_frame(snapshot(&world, Vec::new()));

    let mut orbit_done = 0;
    let mut ecology_done = 0;
    while orbit_done < orbit_steps {
        let chunk = interval.min(orbit_steps - orbit_done);
        orbit_done += chunk;
        let ecology_target = ecology_steps * orbit_done / orbit_steps;

        let bodies_before = world.bodies().len();
        let predator_alive = world.population().predator > 0.0;
        world.advance(chunk, ecology_target - ecology_done)?;
        ecology_done = ecology_target;

        let mut events = Vec::new();
        let lost = bodies_before - world.bodies().len();
        if lost > 0 {
            events.push(SimEvent {
                message: format!("{} bodies merged or ejected", lost),
                level: Some("info".to_string()),
            });
        }
        if predator_alive && world.population().predator == 0.0 {
            events.push(SimEvent {
                message: "predators extinct".to_string(),
                level: Some("warn".to_string()),
            });
        }
        export.add_frame(snapshot(&world, events));
    }

    // Ecology-only worlds still run their full trajectory
    if ecology_done < ecology_steps {
        world.advance(0, ecology_steps - ecology_done)?;
        export.add_frame(snapshot(&world, Vec::new()));
    }

    let report = world.finish()?;
    let violation = report.check_invariants();
    if let Some(reason) = &violation {
        warn!(reason = %reason, "recorded world broke an invariant");
    }
    export.finalize(violation.is_none(), Some(report.fingerprint));
    Ok((export, report))
}

fn snapshot(world: &GenesisWorld, events: Vec<SimEvent>) -> SimFrame {
    let population = world.population();
    SimFrame {
        orbit_time: world.orbit_time(),
        ecology_time: population.time,
        bodies: world.bodies().iter().map(BodyPosition::new).collect(),
        population: population.into(),
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig {
            body_count: 8,
            steps: 30,
            terrain_size: 4,
            ecology_steps: 90,
            ..SimConfig::default()
        }
        .with_seed("export-test")
    }

    #[test]
    fn test_record_frames() {
        let (export, report) = record_genesis(config(), 10).unwrap();
        // initial frame plus one per interval
        assert_eq!(export.frames.len(), 4);
        assert_eq!(export.frames[0].bodies.len(), 8);
        assert!(export.passed);
        assert_eq!(export.passed, report.check_invariants().is_none());
        assert_eq!(export.fingerprint, Some(report.fingerprint));

        let last = export.frames.last().unwrap();
        assert!((last.ecology_time - 0.9).abs() < 1e-9);
        assert!((export.duration - report.orbit_time).abs() < 1e-12);
    }

    #[test]
    fn test_recording_matches_plain_run() {
        let (_, recorded) = record_genesis(config(), 7).unwrap();
        let plain = GenesisWorld::new(config()).unwrap().run().unwrap();
        assert_eq!(recorded.fingerprint, plain.fingerprint);
    }

    #[test]
    fn test_ecology_only_world() {
        let cfg = SimConfig {
            steps: 0,
            ..config()
        };
        let (export, report) = record_genesis(cfg, 10).unwrap();
        assert_eq!(export.frames.len(), 2);
        assert!((report.population.time - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_export_serializes() {
        let (export, _) = record_genesis(config(), 15).unwrap();
        let json = serde_json::to_string(&export).unwrap();
        let back: SimExport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames.len(), export.frames.len());
        assert_eq!(back.seed, "export-test");
    }
}
