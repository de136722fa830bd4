//! The "ECOLOGY" Engine - Stochastic Lotka-Volterra dynamics
//!
//! Integrates a noisy predator-prey system one explicit step at a time with
//! the Euler-Maruyama scheme:
//!
//! ```text
//! dN = [r·N·(1 − N/K) − a·N·P]·dt + σ_env·N·dW₁ + σ_demo·√max(1, N)·dW₂
//! dP = [e·a·N·P − m·P]·dt         + σ_env·P·dW₃ + σ_demo·√max(1, P)·dW₄
//! ```
//!
//! with `dW ~ N(0, dt)`, i.e. every Wiener increment is `√dt·ξ`. Both
//! populations are clamped at zero after each step and zero is absorbing.
//!
//! The integrator never sub-steps on its own. Large `dt` can overshoot or
//! drive a population to zero in one step; callers choose a stable step.

use crate::bloom_random::SeededRandom;
use crate::laws;
use bloom_env::{ensure_finite, ensure_non_negative, ensure_positive, BloomError, BloomResult, Seed, Stepper};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rate constants and noise strengths of the predator-prey model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotkaVolterraParams {
    /// Intrinsic prey growth rate `r`
    pub prey_growth_rate: f64,
    /// Mass-action predation rate `a`
    pub predation_rate: f64,
    /// Predator death rate `m`
    pub predator_death_rate: f64,
    /// Fraction of predation converted to predators `e`
    pub conversion_efficiency: f64,
    /// Prey carrying capacity `K`
    pub prey_capacity: f64,
    /// Environmental noise `σ_env` (multiplicative)
    pub environmental_noise: f64,
    /// Demographic noise `σ_demo` (scales with √N)
    pub demographic_noise: f64,
}

impl Default for LotkaVolterraParams {
    fn default() -> Self {
        Self {
            prey_growth_rate: 1.0,
            predation_rate: 0.01,
            predator_death_rate: 0.5,
            conversion_efficiency: 0.5,
            prey_capacity: 1000.0,
            environmental_noise: 0.05,
            demographic_noise: 0.0,
        }
    }
}

impl LotkaVolterraParams {
    /// Same rates with all noise switched off.
    pub fn deterministic(self) -> Self {
        Self {
            environmental_noise: 0.0,
            demographic_noise: 0.0,
            ..self
        }
    }

    pub fn validate(&self) -> BloomResult<()> {
        ensure_non_negative("prey_growth_rate", self.prey_growth_rate)?;
        ensure_non_negative("predation_rate", self.predation_rate)?;
        ensure_non_negative("predator_death_rate", self.predator_death_rate)?;
        ensure_non_negative("conversion_efficiency", self.conversion_efficiency)?;
        ensure_positive("prey_capacity", self.prey_capacity)?;
        ensure_non_negative("environmental_noise", self.environmental_noise)?;
        ensure_non_negative("demographic_noise", self.demographic_noise)?;
        Ok(())
    }

    /// Deterministic drift `(dN/dt, dP/dt)` at the given state.
    pub fn drift(&self, prey: f64, predator: f64) -> (f64, f64) {
        let predation = laws::predation_flux(self.predation_rate, prey, predator);
        let d_prey = laws::logistic_growth(self.prey_growth_rate, prey, self.prey_capacity) - predation;
        let d_predator = self.conversion_efficiency * predation - self.predator_death_rate * predator;
        (d_prey, d_predator)
    }

    /// Noise-free solution by classical RK4 with step `h`, sampled every
    /// `sample_every` steps. Used as the reference the stochastic integrator
    /// converges to when both noise strengths are zero.
    pub fn deterministic_reference(
        &self,
        prey: f64,
        predator: f64,
        h: f64,
        steps: usize,
        sample_every: usize,
    ) -> Vec<(f64, f64)> {
        let (mut n, mut p) = (prey, predator);
        let every = sample_every.max(1);
        let mut out = Vec::with_capacity(steps / every);
        for i in 0..steps {
            let k1 = self.drift(n, p);
            let k2 = self.drift(n + h / 2.0 * k1.0, p + h / 2.0 * k1.1);
            let k3 = self.drift(n + h / 2.0 * k2.0, p + h / 2.0 * k2.1);
            let k4 = self.drift(n + h * k3.0, p + h * k3.1);
            n += h / 6.0 * (k1.0 + 2.0 * k2.0 + 2.0 * k3.0 + k4.0);
            p += h / 6.0 * (k1.1 + 2.0 * k2.1 + 2.0 * k3.1 + k4.1);
            if (i + 1) % every == 0 {
                out.push((n, p));
            }
        }
        out
    }
}

/// Read-only snapshot of the two populations and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationState {
    pub prey: f64,
    pub predator: f64,
    pub time: f64,
}

/// Seeded stochastic predator-prey integrator.
#[derive(Debug)]
pub struct StochasticPopulationDynamics {
    params: LotkaVolterraParams,
    state: PopulationState,
    rng: SeededRandom,
    steps: u64,
}

impl StochasticPopulationDynamics {
    /// Creates the integrator at `t = 0`.
    pub fn new(
        prey: f64,
        predator: f64,
        params: LotkaVolterraParams,
        seed: impl Into<Seed>,
    ) -> BloomResult<Self> {
        ensure_non_negative("prey", prey)?;
        ensure_non_negative("predator", predator)?;
        params.validate()?;

        Ok(Self {
            params,
            state: PopulationState {
                prey,
                predator,
                time: 0.0,
            },
            rng: SeededRandom::new(seed),
            steps: 0,
        })
    }

    /// Current populations and clock.
    pub fn state(&self) -> PopulationState {
        self.state
    }

    pub fn params(&self) -> &LotkaVolterraParams {
        &self.params
    }

    /// Number of steps taken so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Advances both populations by one Euler-Maruyama step of length `dt`.
    pub fn step(&mut self, dt: f64) -> BloomResult<()> {
        ensure_positive("dt", dt)?;

        let PopulationState { prey, predator, .. } = self.state;
        let (d_prey, d_predator) = self.params.drift(prey, predator);
        let sqrt_dt = dt.sqrt();

        let prey_noise = self.noise(prey, sqrt_dt);
        let predator_noise = self.noise(predator, sqrt_dt);

        let next_prey = if prey > 0.0 {
            (prey + d_prey * dt + prey_noise).max(0.0)
        } else {
            0.0
        };
        let next_predator = if predator > 0.0 {
            (predator + d_predator * dt + predator_noise).max(0.0)
        } else {
            0.0
        };

        if prey > 0.0 && next_prey == 0.0 {
            debug!(time = self.state.time + dt, "prey population extinct");
        }
        if predator > 0.0 && next_predator == 0.0 {
            debug!(time = self.state.time + dt, "predator population extinct");
        }

        self.state = PopulationState {
            prey: next_prey,
            predator: next_predator,
            time: self.state.time + dt,
        };
        self.steps += 1;
        Ok(())
    }

    /// Steps `steps` times and returns the trajectory, starting with the
    /// current state (so the result holds `steps + 1` snapshots).
    pub fn run(&mut self, steps: usize, dt: f64) -> BloomResult<Vec<PopulationState>> {
        let mut trajectory = Vec::with_capacity(steps + 1);
        trajectory.push(self.state);
        for _ in 0..steps {
            self.step(dt)?;
            trajectory.push(self.state);
        }
        Ok(trajectory)
    }

    /// Explicitly adds individuals. The only way out of extinction.
    pub fn reintroduce(&mut self, prey: f64, predator: f64) -> BloomResult<()> {
        ensure_non_negative("prey", prey)?;
        ensure_non_negative("predator", predator)?;
        self.state.prey += prey;
        self.state.predator += predator;
        Ok(())
    }

    pub fn prey_extinct(&self) -> bool {
        self.state.prey == 0.0
    }

    pub fn predator_extinct(&self) -> bool {
        self.state.predator == 0.0
    }

    /// One step of multi-species Lotka-Volterra competition.
    ///
    /// `dN_i = r_i·N_i·(K_i − Σ_j α_ij·N_j)/K_i·dt` plus the same
    /// environmental and demographic noise as [`Self::step`]. Draws from
    /// this integrator's stream; extinct species stay extinct.
    pub fn step_competition(
        &mut self,
        populations: &[f64],
        params: &CompetitionParams,
        dt: f64,
    ) -> BloomResult<Vec<f64>> {
        ensure_positive("dt", dt)?;
        params.validate(populations.len())?;
        for &n in populations {
            ensure_non_negative("populations", n)?;
        }
        let sqrt_dt = dt.sqrt();

        let mut next = Vec::with_capacity(populations.len());
        for (i, &n_i) in populations.iter().enumerate() {
            if n_i == 0.0 {
                next.push(0.0);
                continue;
            }

            let competition: f64 = params.competition_matrix[i]
                .iter()
                .zip(populations)
                .map(|(alpha, n_j)| alpha * n_j)
                .sum();
            let k_i = params.carrying_capacities[i];
            let growth = params.growth_rates[i] * n_i * (k_i - competition) / k_i;

            let mut noise = 0.0;
            if params.environmental_noise > 0.0 {
                noise += params.environmental_noise * n_i * sqrt_dt * self.rng.standard_normal();
            }
            if params.demographic_noise > 0.0 {
                noise += params.demographic_noise * n_i.max(1.0).sqrt() * sqrt_dt * self.rng.standard_normal();
            }

            next.push((n_i + growth * dt + noise).max(0.0));
        }
        Ok(next)
    }

    /// Random-access to the underlying stream, for companion analyses.
    pub fn rng_mut(&mut self) -> &mut SeededRandom {
        &mut self.rng
    }

    fn noise(&mut self, population: f64, sqrt_dt: f64) -> f64 {
        if population <= 0.0 {
            return 0.0;
        }
        let mut total = 0.0;
        if self.params.environmental_noise > 0.0 {
            total += self.params.environmental_noise * population * sqrt_dt * self.rng.standard_normal();
        }
        if self.params.demographic_noise > 0.0 {
            total += self.params.demographic_noise * population.max(1.0).sqrt() * sqrt_dt * self.rng.standard_normal();
        }
        total
    }
}

impl Stepper for StochasticPopulationDynamics {
    fn step(&mut self, dt: f64) -> BloomResult<()> {
        StochasticPopulationDynamics::step(self, dt)
    }

    fn time(&self) -> f64 {
        self.state.time
    }
}

/// Parameters of multi-species competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionParams {
    /// `r_i`
    pub growth_rates: Vec<f64>,
    /// `K_i`
    pub carrying_capacities: Vec<f64>,
    /// `α_ij`: effect of species `j` on species `i`
    pub competition_matrix: Vec<Vec<f64>>,
    pub environmental_noise: f64,
    pub demographic_noise: f64,
}

impl CompetitionParams {
    pub fn validate(&self, species: usize) -> BloomResult<()> {
        if self.growth_rates.len() != species
            || self.carrying_capacities.len() != species
            || self.competition_matrix.len() != species
            || self.competition_matrix.iter().any(|row| row.len() != species)
        {
            return Err(BloomError::invalid(
                "competition_matrix",
                format!("parameters do not match {} species", species),
            ));
        }
        for &r in &self.growth_rates {
            ensure_non_negative("growth_rates", r)?;
        }
        for &k in &self.carrying_capacities {
            ensure_positive("carrying_capacities", k)?;
        }
        for &alpha in self.competition_matrix.iter().flatten() {
            ensure_finite("competition_matrix", alpha)?;
        }
        ensure_non_negative("environmental_noise", self.environmental_noise)?;
        ensure_non_negative("demographic_noise", self.demographic_noise)?;
        Ok(())
    }
}
