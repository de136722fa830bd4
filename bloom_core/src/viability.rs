//! Small-population stochastics and population viability analysis.
//!
//! Birth-death processes at the individual level, where the continuous
//! Lotka-Volterra approximation stops being meaningful.

use crate::bloom_random::SeededRandom;
use crate::statistics::median;
use bloom_env::{ensure_non_negative, ensure_positive, BloomError, BloomResult, Seed};
use rand_distr::{Binomial, Distribution};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed time step of the viability Monte Carlo.
pub const VIABILITY_DT: f64 = 0.1;

/// Smallest and largest population tried by [`PopulationViabilityAnalysis::minimum_viable_population`].
pub const MVP_SEARCH_RANGE: (u64, u64) = (10, 10_000);

/// Simulations per candidate population in the MVP search.
pub const MVP_SIMULATIONS: usize = 200;

// =============================================================================
// GILLESPIE
// =============================================================================

/// One point of an exact birth-death trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GillespieEvent {
    pub time: f64,
    pub population: u64,
}

/// Exact stochastic simulation of a linear birth-death process.
///
/// Waiting times are exponential in the total propensity `(b + d)·n`; the
/// event is a birth with probability `b / (b + d)`. The trajectory starts at
/// `t = 0` and stops at extinction or before the first event past `max_time`.
pub fn gillespie(
    rng: &mut SeededRandom,
    initial: u64,
    birth_rate: f64,
    death_rate: f64,
    max_time: f64,
) -> BloomResult<Vec<GillespieEvent>> {
    ensure_non_negative("birth_rate", birth_rate)?;
    ensure_non_negative("death_rate", death_rate)?;
    ensure_non_negative("max_time", max_time)?;

    let mut trajectory = vec![GillespieEvent {
        time: 0.0,
        population: initial,
    }];
    let mut population = initial;
    let mut time = 0.0;

    while time < max_time && population > 0 {
        let births = birth_rate * population as f64;
        let deaths = death_rate * population as f64;
        let total = births + deaths;
        if total == 0.0 {
            break;
        }

        time += rng.exponential(total)?;
        if time > max_time {
            break;
        }

        if rng.uniform() < births / total {
            population += 1;
        } else {
            population -= 1;
        }
        trajectory.push(GillespieEvent { time, population });
    }

    Ok(trajectory)
}

// =============================================================================
// SHOCKS & CLOSED FORMS
// =============================================================================

/// Survivors of a catastrophe killing each individual with probability `severity`.
pub fn catastrophe(rng: &mut SeededRandom, population: u64, severity: f64) -> BloomResult<u64> {
    if !(0.0..=1.0).contains(&severity) {
        return Err(BloomError::invalid("severity", format!("{} is outside [0, 1]", severity)));
    }
    let survivors = Binomial::new(population, 1.0 - severity)
        .map_err(|e| BloomError::invalid("severity", e.to_string()))?
        .sample(rng);
    if survivors == 0 && population > 0 {
        debug!(population, severity, "catastrophe wiped out population");
    }
    Ok(survivors)
}

/// Ultimate extinction probability of a linear birth-death process from `n` individuals.
///
/// `(d / b)^n` when births outpace deaths, otherwise certain.
pub fn extinction_probability(population: u64, birth_rate: f64, death_rate: f64) -> BloomResult<f64> {
    ensure_non_negative("birth_rate", birth_rate)?;
    ensure_non_negative("death_rate", death_rate)?;

    if population == 0 {
        return Ok(1.0);
    }
    if birth_rate == 0.0 && death_rate == 0.0 {
        return Ok(0.0);
    }
    if birth_rate > death_rate {
        Ok((death_rate / birth_rate).powf(population as f64))
    } else {
        Ok(1.0)
    }
}

/// Logistic per-capita growth rate damped linearly below the Allee threshold.
pub fn allee_growth_rate(population: f64, threshold: f64, max_growth_rate: f64, capacity: f64) -> f64 {
    let modifier = if population < threshold {
        population / threshold
    } else {
        1.0
    };
    max_growth_rate * modifier * (1.0 - population / capacity)
}

// =============================================================================
// VIABILITY ANALYSIS
// =============================================================================

/// Per-capita rates of a single unstructured population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BirthDeathParams {
    pub birth_rate: f64,
    pub death_rate: f64,
    pub environmental_noise: f64,
}

impl Default for BirthDeathParams {
    fn default() -> Self {
        Self {
            birth_rate: 0.5,
            death_rate: 0.4,
            environmental_noise: 0.3,
        }
    }
}

impl BirthDeathParams {
    pub fn validate(&self) -> BloomResult<()> {
        ensure_non_negative("birth_rate", self.birth_rate)?;
        ensure_non_negative("death_rate", self.death_rate)?;
        ensure_non_negative("environmental_noise", self.environmental_noise)?;
        Ok(())
    }
}

/// Outcome of a batch of viability simulations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViabilityReport {
    pub extinction_probability: f64,
    pub mean_population: f64,
    /// `None` when no simulation went extinct
    pub median_time_to_extinction: Option<f64>,
    pub simulations: usize,
}

/// Monte Carlo viability estimates on one seeded stream.
#[derive(Debug)]
pub struct PopulationViabilityAnalysis {
    rng: SeededRandom,
}

impl PopulationViabilityAnalysis {
    pub fn new(seed: impl Into<Seed>) -> Self {
        Self {
            rng: SeededRandom::new(seed),
        }
    }

    /// Runs `simulations` independent trajectories of
    /// `dN = (b − d)·N·dt + σ·N·√dt·ξ` to `horizon` and reports how many die out.
    pub fn estimate_extinction_risk(
        &mut self,
        initial: f64,
        params: &BirthDeathParams,
        horizon: f64,
        simulations: usize,
    ) -> BloomResult<ViabilityReport> {
        ensure_non_negative("initial", initial)?;
        ensure_positive("horizon", horizon)?;
        params.validate()?;
        if simulations == 0 {
            return Err(BloomError::invalid("simulations", "must be at least 1"));
        }

        let sqrt_dt = VIABILITY_DT.sqrt();
        let mut extinction_times = Vec::new();
        let mut population_sum = 0.0;

        for _ in 0..simulations {
            let mut population = initial;
            let mut time = 0.0;
            while time < horizon && population > 0.0 {
                let growth = (params.birth_rate - params.death_rate) * population * VIABILITY_DT;
                let noise = if params.environmental_noise > 0.0 {
                    params.environmental_noise * population * sqrt_dt * self.rng.standard_normal()
                } else {
                    0.0
                };
                population = (population + growth + noise).max(0.0);
                time += VIABILITY_DT;
            }

            if population == 0.0 {
                extinction_times.push(time);
            }
            population_sum += population;
        }

        let report = ViabilityReport {
            extinction_probability: extinction_times.len() as f64 / simulations as f64,
            mean_population: population_sum / simulations as f64,
            median_time_to_extinction: median(&extinction_times),
            simulations,
        };
        debug!(
            initial,
            risk = report.extinction_probability,
            "viability estimate"
        );
        Ok(report)
    }

    /// Smallest population whose extinction risk over `horizon` is at most
    /// `target`, by binary search over [`MVP_SEARCH_RANGE`] to within 10.
    pub fn minimum_viable_population(
        &mut self,
        params: &BirthDeathParams,
        target: f64,
        horizon: f64,
    ) -> BloomResult<u64> {
        if !(0.0..=1.0).contains(&target) {
            return Err(BloomError::invalid("target", format!("{} is outside [0, 1]", target)));
        }

        let (mut low, mut high) = MVP_SEARCH_RANGE;
        while high - low > 10 {
            let mid = (low + high) / 2;
            let report = self.estimate_extinction_risk(mid as f64, params, horizon, MVP_SIMULATIONS)?;
            if report.extinction_probability > target {
                low = mid;
            } else {
                high = mid;
            }
        }
        Ok(high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gillespie_pure_death_walks_down_to_zero() {
        let mut rng = SeededRandom::new("gillespie-death");
        let trajectory = gillespie(&mut rng, 20, 0.0, 1.0, 1000.0).unwrap();

        assert_eq!(trajectory.len(), 21);
        assert_eq!(trajectory[0], GillespieEvent { time: 0.0, population: 20 });
        for (i, pair) in trajectory.windows(2).enumerate() {
            assert!(pair[1].time > pair[0].time);
            assert_eq!(pair[1].population, 20 - (i as u64 + 1));
        }
        assert_eq!(trajectory.last().unwrap().population, 0);
    }

    #[test]
    fn test_gillespie_respects_horizon() {
        let mut rng = SeededRandom::new("gillespie-birth");
        let trajectory = gillespie(&mut rng, 5, 1.0, 0.0, 2.0).unwrap();
        assert!(trajectory.iter().all(|e| e.time <= 2.0));
        assert!(trajectory.windows(2).all(|w| w[1].population == w[0].population + 1));

        let empty = gillespie(&mut rng, 0, 1.0, 1.0, 10.0).unwrap();
        assert_eq!(empty.len(), 1);
        assert!(gillespie(&mut rng, 5, -1.0, 0.0, 2.0).is_err());
    }

    #[test]
    fn test_catastrophe_severity_bounds() {
        let mut rng = SeededRandom::new("catastrophe");
        assert_eq!(catastrophe(&mut rng, 500, 0.0).unwrap(), 500);
        assert_eq!(catastrophe(&mut rng, 500, 1.0).unwrap(), 0);
        assert_eq!(catastrophe(&mut rng, 0, 0.5).unwrap(), 0);

        let half = catastrophe(&mut rng, 10_000, 0.5).unwrap();
        assert!((4800..=5200).contains(&half), "survivors = {}", half);

        assert!(catastrophe(&mut rng, 10, 1.5).is_err());
        assert!(catastrophe(&mut rng, 10, f64::NAN).is_err());
    }

    #[test]
    fn test_extinction_probability_closed_form() {
        assert_relative_eq!(extinction_probability(3, 2.0, 1.0).unwrap(), 0.125);
        assert_eq!(extinction_probability(3, 1.0, 2.0).unwrap(), 1.0);
        assert_eq!(extinction_probability(3, 1.0, 1.0).unwrap(), 1.0);
        assert_eq!(extinction_probability(0, 2.0, 1.0).unwrap(), 1.0);
        assert_eq!(extinction_probability(4, 0.0, 0.0).unwrap(), 0.0);
        assert!(extinction_probability(4, -1.0, 0.0).is_err());
    }

    #[test]
    fn test_allee_damping() {
        let full = allee_growth_rate(50.0, 20.0, 1.0, 100.0);
        assert_relative_eq!(full, 0.5);

        let damped = allee_growth_rate(10.0, 20.0, 1.0, 100.0);
        assert_relative_eq!(damped, 0.5 * 0.9);
        assert!(allee_growth_rate(150.0, 20.0, 1.0, 100.0) < 0.0);
    }

    #[test]
    fn test_growing_population_never_dies_without_noise() {
        let params = BirthDeathParams {
            birth_rate: 0.5,
            death_rate: 0.1,
            environmental_noise: 0.0,
        };
        let mut pva = PopulationViabilityAnalysis::new("pva-growth");
        let report = pva.estimate_extinction_risk(50.0, &params, 10.0, 20).unwrap();

        assert_eq!(report.extinction_probability, 0.0);
        assert!(report.median_time_to_extinction.is_none());
        assert!(report.mean_population > 50.0);
        assert_eq!(report.simulations, 20);
    }

    #[test]
    fn test_heavy_noise_causes_extinctions() {
        let params = BirthDeathParams {
            birth_rate: 0.2,
            death_rate: 0.2,
            environmental_noise: 3.0,
        };
        let mut pva = PopulationViabilityAnalysis::new("pva-noise");
        let report = pva.estimate_extinction_risk(100.0, &params, 100.0, 200).unwrap();

        assert!(report.extinction_probability > 0.9);
        let median = report.median_time_to_extinction.unwrap();
        assert!(median > 0.0 && median <= 100.0 + VIABILITY_DT);
    }

    #[test]
    fn test_viability_is_deterministic() {
        let params = BirthDeathParams::default();
        let a = PopulationViabilityAnalysis::new(7u64)
            .estimate_extinction_risk(30.0, &params, 20.0, 50)
            .unwrap();
        let b = PopulationViabilityAnalysis::new(7u64)
            .estimate_extinction_risk(30.0, &params, 20.0, 50)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minimum_viable_population_search() {
        let safe = BirthDeathParams {
            birth_rate: 0.5,
            death_rate: 0.1,
            environmental_noise: 0.0,
        };
        let mut pva = PopulationViabilityAnalysis::new("mvp");
        let mvp = pva.minimum_viable_population(&safe, 0.05, 10.0).unwrap();
        assert!(mvp <= MVP_SEARCH_RANGE.0 + 10, "mvp = {}", mvp);

        let doomed = BirthDeathParams {
            birth_rate: 0.1,
            death_rate: 0.1,
            environmental_noise: 10.0,
        };
        assert_eq!(pva.minimum_viable_population(&doomed, 0.05, 10.0).unwrap(), MVP_SEARCH_RANGE.1);
        assert!(pva.minimum_viable_population(&safe, 2.0, 10.0).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let mut pva = PopulationViabilityAnalysis::new("bad");
        let params = BirthDeathParams::default();
        assert!(pva.estimate_extinction_risk(10.0, &params, 10.0, 0).is_err());
        assert!(pva.estimate_extinction_risk(-1.0, &params, 10.0, 5).is_err());
        assert!(pva.estimate_extinction_risk(10.0, &params, 0.0, 5).is_err());
    }
}
