//! Scenario runner - executes genesis verification scenarios.

use crate::scenarios::ScenarioId;
use crate::world::{GenesisWorld, SimConfig};

use bloom_core::statistics::{correlation, SampleSummary};
use bloom_core::bloom_gravity::total_momentum;
use bloom_core::{
    Body, LotkaVolterraParams, NBodyConfig, NBodySimulator, NoiseField, SeededRandom,
    StochasticPopulationDynamics,
};
use bloom_env::{BloomResult, Seed};
use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: String,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total steps executed
    pub total_steps: u64,

    /// Final simulation time (years for orbits, model time for ecology)
    pub final_time: f64,

    /// Number of bodies at the end, where bodies are involved
    pub final_body_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Body merges
    pub merges: usize,

    /// Bodies removed past the ejection radius
    pub ejections: usize,

    /// Populations that hit zero
    pub extinctions: usize,

    /// Random draws or field samples checked
    pub samples: u64,

    /// Largest relative deviation from a reference
    pub max_deviation: f64,

    /// World fingerprint, for genesis scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<u64>,
}

/// Runs verification scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: Seed,

    /// World configuration for genesis scenarios
    config: SimConfig,

    /// N-body step override
    steps: Option<usize>,

    /// N-body dt override
    dt: Option<f64>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self {
            seed: seed.into(),
            config: SimConfig::default(),
            steps: None,
            dt: None,
        }
    }

    /// Sets the world configuration. The runner's seed still wins.
    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the number of N-body steps.
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Sets the N-body step length in years.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// The world config with this runner's seed and overrides applied.
    pub fn world_config(&self) -> SimConfig {
        let mut config = self.config.clone().with_seed(self.seed.clone());
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(dt) = self.dt {
            config.dt = dt;
        }
        config
    }

    /// Runs a scenario and returns the result.
    ///
    /// Parameter errors become a failed result rather than an `Err`.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let outcome = match scenario {
            ScenarioId::Determinism => self.run_determinism(),
            ScenarioId::RngMoments => self.run_rng_moments(),
            ScenarioId::NoiseBounds => self.run_noise_bounds(),
            ScenarioId::LotkaVolterra => self.run_lotka_volterra(),
            ScenarioId::Extinction => self.run_extinction(),
            ScenarioId::TwoBodyMerge => self.run_two_body_merge(),
            ScenarioId::SterileSystem => self.run_sterile_system(),
            ScenarioId::Genesis => self.run_genesis(),
        };

        outcome.unwrap_or_else(|e| {
            warn!("{} aborted: {}", scenario.name(), e);
            ScenarioResult {
                scenario,
                seed: self.seed.to_string(),
                passed: false,
                total_steps: 0,
                final_time: 0.0,
                final_body_count: 0,
                failure_reason: Some(e.to_string()),
                metrics: ScenarioMetrics::default(),
            }
        })
    }

    fn result(
        &self,
        scenario: ScenarioId,
        failure: Option<String>,
        total_steps: u64,
        final_time: f64,
        final_body_count: usize,
        metrics: ScenarioMetrics,
    ) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.seed.to_string(),
            passed: failure.is_none(),
            total_steps,
            final_time,
            final_body_count,
            failure_reason: failure,
            metrics,
        }
    }

    /// GEN-001: Determinism - identical seed, identical world.
    fn run_determinism(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-001: Determinism - genesis twice on one seed");

        let config = self.world_config();
        let first = GenesisWorld::new(config.clone())?.run()?;
        let second = GenesisWorld::new(config.clone())?.run()?;

        let failure = if first.fingerprint != second.fingerprint {
            Some(format!("fingerprints differ: {:016x} vs {:016x}", first.fingerprint, second.fingerprint))
        } else if first != second {
            Some("reports differ with matching fingerprints".to_string())
        } else {
            None
        };

        info!("✓ Determinism complete: {} bodies, fingerprint {:016x}", first.bodies.len(), first.fingerprint);
        let metrics = ScenarioMetrics {
            merges: first.merges,
            ejections: first.ejections,
            fingerprint: Some(first.fingerprint),
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::Determinism, failure, config.steps as u64, first.orbit_time, first.bodies.len(), metrics))
    }

    /// GEN-002: RngMoments - sample moments of the core distributions.
    fn run_rng_moments(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-002: RngMoments - 10,000 draws per distribution");

        const DRAWS: usize = 10_000;
        let mut rng = SeededRandom::new(self.seed.derive("rng-moments"));

        let uniforms: Vec<f64> = (0..DRAWS).map(|_| rng.uniform()).collect();
        let normals: Vec<f64> = (0..DRAWS).map(|_| rng.standard_normal()).collect();
        let mut poissons = Vec::with_capacity(DRAWS);
        for _ in 0..DRAWS {
            poissons.push(rng.poisson(5.0)? as f64);
        }

        let u = summarize(&uniforms);
        let n = summarize(&normals);
        let p = summarize(&poissons);
        debug!("  uniform mean={:.4} sd={:.4}", u.mean, u.std_dev);
        debug!("  normal mean={:.4} sd={:.4}", n.mean, n.std_dev);
        debug!("  poisson(5) mean={:.4}", p.mean);

        // Consecutive draws must be uncorrelated; 0.05 is five sigma at 10,000 draws
        let serial = correlation(&uniforms[..DRAWS - 1], &uniforms[1..]).unwrap_or(1.0);
        debug!("  uniform lag-1 correlation={:.4}", serial);

        let uniform_sd = 1.0 / 12f64.sqrt();
        let checks = [
            ("uniform mean", (u.mean - 0.5).abs(), 0.02),
            ("uniform stddev", (u.std_dev - uniform_sd).abs(), 0.05),
            ("normal mean", n.mean.abs(), 0.05),
            ("normal stddev", (n.std_dev - 1.0).abs(), 0.05),
            ("poisson mean", (p.mean - 5.0).abs(), 0.2),
            ("uniform serial correlation", serial.abs(), 0.05),
        ];
        let failure = checks
            .iter()
            .find(|(_, err, tol)| err > tol)
            .map(|(name, err, tol)| format!("{} off by {:.4} (tolerance {})", name, err, tol));
        let max_deviation = checks.iter().map(|(_, err, _)| *err).fold(0.0, f64::max);

        info!("✓ RngMoments complete: max deviation {:.4}", max_deviation);
        let metrics = ScenarioMetrics {
            samples: (3 * DRAWS) as u64,
            max_deviation,
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::RngMoments, failure, 0, 0.0, 0, metrics))
    }

    /// GEN-003: NoiseBounds - fBm stays in [-1, 1].
    fn run_noise_bounds(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-003: NoiseBounds - 64x64 fBm grid");

        let field = NoiseField::new(self.seed.derive("noise"));
        let grid = field.sample_grid(64, 64, &self.config.terrain)?;
        let summary = summarize(&grid);

        let failure = if summary.min < -1.0 || summary.max > 1.0 {
            Some(format!("noise range [{:.4}, {:.4}] exceeds [-1, 1]", summary.min, summary.max))
        } else if summary.max - summary.min < 1e-6 {
            Some("noise field is constant".to_string())
        } else {
            None
        };

        info!("✓ NoiseBounds complete: range [{:.3}, {:.3}]", summary.min, summary.max);
        let metrics = ScenarioMetrics {
            samples: grid.len() as u64,
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::NoiseBounds, failure, 0, 0.0, 0, metrics))
    }

    /// GEN-004: LotkaVolterra - zero noise tracks the ODE.
    fn run_lotka_volterra(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-004: LotkaVolterra - Euler-Maruyama vs RK4");

        const STEPS: usize = 1000;
        const DT: f64 = 0.01;
        const TOLERANCE: f64 = 0.05;
        let params = LotkaVolterraParams::default().deterministic();

        let mut dynamics = StochasticPopulationDynamics::new(100.0, 10.0, params, self.seed.derive("lv"))?;
        let trajectory = dynamics.run(STEPS, DT)?;
        let reference = params.deterministic_reference(100.0, 10.0, DT / 10.0, STEPS * 10, 10);

        let mut max_deviation: f64 = 0.0;
        for (state, (prey, predator)) in trajectory[1..].iter().zip(&reference) {
            max_deviation = max_deviation
                .max((state.prey - prey).abs() / prey)
                .max((state.predator - predator).abs() / predator);
        }
        let failure = (max_deviation >= TOLERANCE)
            .then(|| format!("max relative deviation {:.4} exceeds {}", max_deviation, TOLERANCE));

        let end = dynamics.state();
        info!("✓ LotkaVolterra complete: end ({:.2}, {:.2}), max deviation {:.4}", end.prey, end.predator, max_deviation);
        let metrics = ScenarioMetrics {
            samples: STEPS as u64,
            max_deviation,
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::LotkaVolterra, failure, STEPS as u64, end.time, 0, metrics))
    }

    /// GEN-005: Extinction - zero is absorbing.
    fn run_extinction(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-005: Extinction - starving predators under heavy noise");

        const STEPS: usize = 20_000;
        const DT: f64 = 0.05;
        let params = LotkaVolterraParams {
            environmental_noise: 1.5,
            ..LotkaVolterraParams::default()
        };
        let mut dynamics = StochasticPopulationDynamics::new(0.0, 5.0, params, self.seed.derive("extinction"))?;

        let mut extinct_at = None;
        let mut revived = false;
        for step in 0..STEPS {
            dynamics.step(DT)?;
            match (extinct_at, dynamics.predator_extinct()) {
                (None, true) => extinct_at = Some(step),
                (Some(_), false) => revived = true,
                _ => {}
            }
        }

        let failure = match extinct_at {
            None => Some(format!("predators survived {} steps", STEPS)),
            Some(_) if revived => Some("extinct population came back".to_string()),
            Some(_) if !dynamics.prey_extinct() => Some("prey appeared from nothing".to_string()),
            Some(_) => None,
        };

        if let Some(step) = extinct_at {
            info!("✓ Extinction complete: predators extinct at step {}", step);
        }
        let metrics = ScenarioMetrics {
            extinctions: usize::from(extinct_at.is_some()),
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::Extinction, failure, STEPS as u64, dynamics.state().time, 0, metrics))
    }

    /// GEN-006: TwoBodyMerge - inelastic merge conserves mass and momentum.
    fn run_two_body_merge(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-006: TwoBodyMerge - free fall from rest");

        const STEPS: usize = 1000;
        let sim = NBodySimulator::new(NBodyConfig::default())?;
        let bodies = vec![
            Body::new(0, 1e-3, Vector3::new(-0.005, 0.0, 0.0), Vector3::zeros()),
            Body::new(1, 1e-3, Vector3::new(0.005, 0.0, 0.0), Vector3::zeros()),
        ];
        let report = sim.integrate(bodies, STEPS, 1e-5)?;

        let mass: f64 = report.bodies.iter().map(|b| b.mass).sum();
        let momentum = total_momentum(&report.bodies).norm();
        let failure = if report.bodies.len() != 1 {
            Some(format!("expected 1 body, found {}", report.bodies.len()))
        } else if ((mass - 2e-3) / 2e-3).abs() > 1e-12 {
            Some(format!("mass {} is not the sum 0.002", mass))
        } else if momentum > 1e-12 {
            Some(format!("residual momentum {:e}", momentum))
        } else {
            None
        };

        info!("✓ TwoBodyMerge complete: {} merges", report.merges);
        let metrics = ScenarioMetrics {
            merges: report.merges,
            max_deviation: momentum,
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::TwoBodyMerge, failure, STEPS as u64, report.time, report.bodies.len(), metrics))
    }

    /// GEN-007: SterileSystem - nothing left is still a valid world.
    fn run_sterile_system(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-007: SterileSystem - empty and all-ejected disks");

        let empty = SimConfig {
            body_count: 0,
            ..self.world_config()
        };
        let empty_report = GenesisWorld::new(empty)?.run()?;

        let config = NBodyConfig {
            central_mass: Some(1.0),
            ejection_radius: 10.0,
            ..NBodyConfig::default()
        };
        let runaways: Vec<Body> = (0..5)
            .map(|i| {
                let angle = i as f64;
                Body::new(i, 1e-6, Vector3::new(25.0 * angle.cos(), 25.0 * angle.sin(), 0.0), Vector3::zeros())
            })
            .collect();
        let ejected = NBodySimulator::new(config)?.integrate(runaways, 10, 0.01)?;

        let failure = if !empty_report.is_sterile() {
            Some(format!("empty disk produced {} bodies", empty_report.bodies.len()))
        } else if !ejected.bodies.is_empty() || ejected.ejections != 5 {
            Some(format!("{} of 5 runaway bodies ejected", ejected.ejections))
        } else {
            None
        };

        info!("✓ SterileSystem complete");
        let metrics = ScenarioMetrics {
            ejections: ejected.ejections,
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::SterileSystem, failure, ejected.steps as u64, ejected.time, 0, metrics))
    }

    /// GEN-008: Genesis - the full pipeline stays physical.
    fn run_genesis(&self) -> BloomResult<ScenarioResult> {
        info!("GEN-008: Genesis - disk, orbits, terrain, ecology");

        let config = self.world_config();
        let report = GenesisWorld::new(config.clone())?.run()?;

        let failure = report.check_invariants();

        info!(
            "✓ Genesis complete: {} → {} bodies ({} merges, {} ejections)",
            report.initial_body_count,
            report.bodies.len(),
            report.merges,
            report.ejections
        );
        let metrics = ScenarioMetrics {
            merges: report.merges,
            ejections: report.ejections,
            extinctions: usize::from(report.prey_extinct) + usize::from(report.predator_extinct),
            fingerprint: Some(report.fingerprint),
            ..ScenarioMetrics::default()
        };
        Ok(self.result(ScenarioId::Genesis, failure, config.steps as u64, report.orbit_time, report.bodies.len(), metrics))
    }
}

fn summarize(samples: &[f64]) -> SampleSummary {
    SampleSummary::from_samples(samples).unwrap_or(SampleSummary {
        count: 0,
        mean: 0.0,
        variance: 0.0,
        std_dev: 0.0,
        min: 0.0,
        max: 0.0,
    })
}
