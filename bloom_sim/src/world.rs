//! GenesisWorld - one seeded world from disk to ecosystem.
//!
//! Pipeline (each stage on its own derived seed):
//! 1. `accretion`: sample a protoplanetary disk into N-body state vectors
//! 2. `gravity`: integrate the disk about the star (merges and ejections)
//! 3. `terrain`: fBm heightmap from a seeded noise field
//! 4. `ecology`: stochastic predator-prey run on the new world

use bloom_core::{
    Body, DiskParams, LotkaVolterraParams, MonteCarloAccretion, NBodyConfig, NBodySimulator, NBodySystem,
    NoiseField, OctaveParams, PopulationState, StochasticPopulationDynamics,
};
use bloom_core::bloom_gravity::total_momentum;
use bloom_core::statistics::SampleSummary;
use bloom_env::{ensure_positive, fnv1a_64, BloomError, BloomResult, Seed, Stepper};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Configuration for a genesis run.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: Seed,

    /// Bodies drawn from the disk
    pub body_count: usize,
    pub disk: DiskParams,
    pub nbody: NBodyConfig,

    /// N-body steps and step length (years)
    pub steps: usize,
    pub dt: f64,

    /// Heightmap resolution
    pub terrain_size: usize,
    pub terrain: OctaveParams,

    pub ecology: LotkaVolterraParams,
    pub initial_prey: f64,
    pub initial_predator: f64,
    pub ecology_steps: usize,
    pub ecology_dt: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let disk = DiskParams::default();
        Self {
            seed: Seed::default(),
            body_count: 40,
            nbody: NBodyConfig {
                central_mass: Some(disk.star_mass),
                ..NBodyConfig::default()
            },
            disk,
            steps: 500,
            dt: 0.001,
            terrain_size: 32,
            terrain: OctaveParams {
                scale: 0.05,
                ..OctaveParams::default()
            },
            ecology: LotkaVolterraParams::default(),
            initial_prey: 100.0,
            initial_predator: 10.0,
            ecology_steps: 1000,
            ecology_dt: 0.01,
        }
    }
}

impl SimConfig {
    /// Parses a (possibly partial) JSON config.
    pub fn from_json_str(json: &str) -> BloomResult<Self> {
        serde_json::from_str(json).map_err(BloomError::config)
    }

    /// Loads a (possibly partial) JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> BloomResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Same config under another seed.
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn validate(&self) -> BloomResult<()> {
        ensure_positive("dt", self.dt)?;
        ensure_positive("ecology_dt", self.ecology_dt)?;
        self.disk.validate()?;
        self.nbody.validate()?;
        self.terrain.validate()?;
        self.ecology.validate()?;
        Ok(())
    }
}

/// Heightmap statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainSummary {
    pub width: usize,
    pub height: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Outcome of a full genesis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisReport {
    pub seed: String,
    pub initial_body_count: usize,
    pub initial_mass: f64,
    pub bodies: Vec<Body>,
    pub merges: usize,
    pub ejections: usize,
    pub orbit_time: f64,
    pub terrain: Option<TerrainSummary>,
    pub population: PopulationState,
    pub prey_extinct: bool,
    pub predator_extinct: bool,
    /// Hash of every final body and population bit pattern
    pub fingerprint: u64,
}

impl GenesisReport {
    pub fn final_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.mass).sum()
    }

    /// True when nothing survived the disk phase.
    pub fn is_sterile(&self) -> bool {
        self.bodies.is_empty()
    }

    /// First violated world invariant, if any: mass never grows, body
    /// state stays finite, populations stay non-negative, terrain stays
    /// in `[-1, 1]`.
    pub fn check_invariants(&self) -> Option<String> {
        let finite = self
            .bodies
            .iter()
            .all(|b| b.position.iter().chain(b.velocity.iter()).all(|c| c.is_finite()));
        let terrain_ok = self.terrain.map_or(true, |t| t.min >= -1.0 && t.max <= 1.0);

        if self.final_mass() > self.initial_mass * (1.0 + 1e-9) {
            Some(format!("mass grew from {:e} to {:e}", self.initial_mass, self.final_mass()))
        } else if !finite {
            Some("non-finite body state".to_string())
        } else if self.population.prey < 0.0 || self.population.predator < 0.0 {
            Some("negative population".to_string())
        } else if !terrain_ok {
            Some("terrain out of range".to_string())
        } else {
            None
        }
    }
}

/// A seeded world advanced stage by stage.
pub struct GenesisWorld {
    config: SimConfig,
    system: NBodySystem,
    dynamics: StochasticPopulationDynamics,
    terrain: NoiseField,
    initial_body_count: usize,
    initial_mass: f64,
}

impl GenesisWorld {
    /// Samples the disk and sets up every engine on its derived seed.
    pub fn new(config: SimConfig) -> BloomResult<Self> {
        config.validate()?;
        let seed = &config.seed;

        let bodies = MonteCarloAccretion::sample(seed.derive("accretion"), config.body_count, &config.disk)?;
        let initial_mass: f64 = bodies.iter().map(|b| b.mass).sum();
        let initial_body_count = bodies.len();
        debug!(
            bodies = initial_body_count,
            momentum = total_momentum(&bodies).norm(),
            "disk ready"
        );

        let simulator = NBodySimulator::new(config.nbody)?;
        let system = NBodySystem::new(simulator, bodies)?;
        let dynamics = StochasticPopulationDynamics::new(
            config.initial_prey,
            config.initial_predator,
            config.ecology,
            seed.derive("ecology"),
        )?;
        let terrain = NoiseField::new(seed.derive("terrain"));

        Ok(Self {
            config,
            system,
            dynamics,
            terrain,
            initial_body_count,
            initial_mass,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn bodies(&self) -> &[Body] {
        self.system.bodies()
    }

    pub fn orbit_time(&self) -> f64 {
        self.system.time()
    }

    pub fn population(&self) -> PopulationState {
        self.dynamics.state()
    }

    /// Advances the disk by `orbit_steps` and the ecosystem by `ecology_steps`.
    pub fn advance(&mut self, orbit_steps: usize, ecology_steps: usize) -> BloomResult<()> {
        self.system.advance(orbit_steps, self.config.dt)?;
        Stepper::advance(&mut self.dynamics, ecology_steps, self.config.ecology_dt)?;
        Ok(())
    }

    /// Row-major heightmap of `terrain_size²` fBm samples in `[-1, 1]`.
    pub fn heightmap(&self) -> BloomResult<Vec<f64>> {
        let size = self.config.terrain_size;
        self.terrain.sample_grid(size, size, &self.config.terrain)
    }

    /// Runs the configured step counts and summarises the world.
    pub fn run(mut self) -> BloomResult<GenesisReport> {
        let orbit_left = self.config.steps;
        let ecology_left = self.config.ecology_steps;
        self.advance(orbit_left, ecology_left)?;
        self.finish()
    }

    /// Summarises the world in its current state.
    pub fn finish(self) -> BloomResult<GenesisReport> {
        let heightmap = self.heightmap()?;
        let terrain = SampleSummary::from_samples(&heightmap).map(|s| TerrainSummary {
            width: self.config.terrain_size,
            height: self.config.terrain_size,
            min: s.min,
            max: s.max,
            mean: s.mean,
        });

        let population = self.dynamics.state();
        let prey_extinct = self.dynamics.prey_extinct();
        let predator_extinct = self.dynamics.predator_extinct();
        let orbit_time = self.system.time();
        let seed = self.config.seed.to_string();
        let initial_body_count = self.initial_body_count;
        let initial_mass = self.initial_mass;
        let (merges, ejections) = (self.system.merges(), self.system.ejections());
        let bodies = self.system.into_report().bodies;

        let fingerprint = fingerprint(&bodies, &population);
        info!(
            seed = %seed,
            survivors = bodies.len(),
            merges,
            ejections,
            prey = population.prey,
            predator = population.predator,
            "genesis complete"
        );

        Ok(GenesisReport {
            seed,
            initial_body_count,
            initial_mass,
            bodies,
            merges,
            ejections,
            orbit_time,
            terrain,
            population,
            prey_extinct,
            predator_extinct,
            fingerprint,
        })
    }
}

/// FNV-1a over the raw bits of the final state.
pub fn fingerprint(bodies: &[Body], population: &PopulationState) -> u64 {
    let mut bytes = Vec::with_capacity(bodies.len() * 64 + 16);
    for body in bodies {
        bytes.extend_from_slice(&body.id.to_le_bytes());
        bytes.extend_from_slice(&body.mass.to_bits().to_le_bytes());
        for c in body.position.iter().chain(body.velocity.iter()) {
            bytes.extend_from_slice(&c.to_bits().to_le_bytes());
        }
    }
    bytes.extend_from_slice(&population.prey.to_bits().to_le_bytes());
    bytes.extend_from_slice(&population.predator.to_bits().to_le_bytes());
    fnv1a_64(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn small_config() -> SimConfig {
        SimConfig {
            body_count: 12,
            steps: 50,
            terrain_size: 8,
            ecology_steps: 100,
            ..SimConfig::default()
        }
        .with_seed("world-test")
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = SimConfig::from_json_str(r#"{"seed": "json-seed", "body_count": 7, "disk": {"disk_mass": 0.02}}"#).unwrap();
        assert_eq!(config.seed, Seed::from("json-seed"));
        assert_eq!(config.body_count, 7);
        assert_eq!(config.disk.disk_mass, 0.02);
        assert_eq!(config.disk.inner_radius, DiskParams::default().inner_radius);
        assert_eq!(config.steps, SimConfig::default().steps);

        let numeric = SimConfig::from_json_str(r#"{"seed": 42}"#).unwrap();
        assert_eq!(numeric.seed, Seed::from(42u64));

        assert!(matches!(SimConfig::from_json_str("{not json"), Err(BloomError::Config(_))));
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let err = SimConfig::from_json_file("/nonexistent/bloom/config.json").unwrap_err();
        assert!(matches!(err, BloomError::Io(_)));
    }

    #[test]
    fn test_genesis_is_reproducible() {
        let a = GenesisWorld::new(small_config()).unwrap().run().unwrap();
        let b = GenesisWorld::new(small_config()).unwrap().run().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.initial_body_count, 12);
        assert!(a.final_mass() <= a.initial_mass * (1.0 + 1e-12));

        let c = GenesisWorld::new(small_config().with_seed("world-test-2")).unwrap().run().unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_invariant_check_flags_broken_reports() {
        let report = GenesisWorld::new(small_config()).unwrap().run().unwrap();
        assert_eq!(report.check_invariants(), None);

        let mut heavier = report.clone();
        heavier.bodies.push(Body::new(999, 1.0, Vector3::zeros(), Vector3::zeros()));
        assert!(heavier.check_invariants().unwrap().contains("mass grew"));

        let mut negative = report.clone();
        negative.population.predator = -1.0;
        assert_eq!(negative.check_invariants().as_deref(), Some("negative population"));

        let mut blown_up = report;
        blown_up
            .bodies
            .push(Body::new(998, 0.0, Vector3::zeros(), Vector3::new(f64::NAN, 0.0, 0.0)));
        assert_eq!(blown_up.check_invariants().as_deref(), Some("non-finite body state"));
    }

    #[test]
    fn test_terrain_in_range() {
        let world = GenesisWorld::new(small_config()).unwrap();
        let heightmap = world.heightmap().unwrap();
        assert_eq!(heightmap.len(), 64);
        assert!(heightmap.iter().all(|h| (-1.0..=1.0).contains(h)));
    }

    #[test]
    fn test_empty_disk_is_sterile() {
        let config = SimConfig {
            body_count: 0,
            ..small_config()
        };
        let report = GenesisWorld::new(config).unwrap().run().unwrap();
        assert!(report.is_sterile());
        assert_eq!(report.merges, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            dt: 0.0,
            ..small_config()
        };
        assert!(GenesisWorld::new(config).is_err());
    }
}
