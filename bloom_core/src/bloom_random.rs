//! The "RANDOM" Engine - Seeded pseudo-random streams
//!
//! Every generator in the genesis core draws from a [`SeededRandom`]. One
//! uniform primitive (ChaCha8) feeds all distributions, so two instances
//! built from the same seed produce the same values for the same call
//! sequence, on every platform.

use bloom_env::{ensure_finite, ensure_non_negative, ensure_positive, BloomError, BloomResult, Seed};
use rand::distributions::WeightedIndex;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, Gamma, LogNormal, Poisson, StandardNormal};

/// Largest finite `f64` strictly below `x`.
fn float_below(x: f64) -> f64 {
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

/// Below this mean Knuth's multiplication method is used for Poisson draws.
const KNUTH_POISSON_LIMIT: f64 = 30.0;

/// Deterministic random stream seeded from a string or integer.
#[derive(Debug)]
pub struct SeededRandom {
    seed: Seed,
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a stream from any seed. Empty strings fall back to a fixed seed.
    pub fn new(seed: impl Into<Seed>) -> Self {
        let seed = seed.into();
        let rng = ChaCha8Rng::seed_from_u64(seed.value());
        Self { seed, rng }
    }

    /// Creates an independent stream for a labelled subsystem.
    pub fn derive(&self, label: &str) -> Self {
        Self::new(self.seed.derive(label))
    }

    /// Returns the seed this stream was built from.
    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Uniform value in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[min, max)`. `min == max` returns `min`.
    pub fn uniform_range(&mut self, min: f64, max: f64) -> BloomResult<f64> {
        ensure_finite("min", min)?;
        ensure_finite("max", max)?;
        if max < min {
            return Err(BloomError::invalid("max", format!("{} is below min {}", max, min)));
        }
        if max == min {
            return Ok(min);
        }
        let u = self.uniform();
        let span = max - min;
        let value = if span.is_finite() {
            min + u * span
        } else {
            (min * (1.0 - u) + max * u).max(min)
        };
        // Rounding can land on `max` for narrow ranges
        if value >= max {
            return Ok(float_below(max));
        }
        Ok(value)
    }

    /// Uniform integer in `[min, max)`.
    pub fn uniform_int(&mut self, min: i64, max: i64) -> BloomResult<i64> {
        if max <= min {
            return Err(BloomError::invalid("max", format!("empty range {}..{}", min, max)));
        }
        Ok(self.rng.gen_range(min..max))
    }

    /// Returns true with probability `p`.
    pub fn chance(&mut self, p: f64) -> BloomResult<bool> {
        if !(0.0..=1.0).contains(&p) {
            return Err(BloomError::invalid("p", format!("probability {} outside [0, 1]", p)));
        }
        Ok(self.uniform() < p)
    }

    /// Gaussian draw with the given mean and standard deviation.
    pub fn normal(&mut self, mean: f64, stddev: f64) -> BloomResult<f64> {
        ensure_finite("mean", mean)?;
        ensure_non_negative("stddev", stddev)?;
        Ok(mean + stddev * self.standard_normal())
    }

    /// Standard normal draw (ziggurat).
    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal)
    }

    /// Exponential draw by inverse CDF: `-ln(1 - u) / lambda`.
    pub fn exponential(&mut self, lambda: f64) -> BloomResult<f64> {
        ensure_positive("lambda", lambda)?;
        Ok(-(1.0 - self.uniform()).ln() / lambda)
    }

    /// Poisson draw.
    ///
    /// Knuth's multiplication method for small means, transformed rejection
    /// (`rand_distr::Poisson`) above [`KNUTH_POISSON_LIMIT`].
    pub fn poisson(&mut self, lambda: f64) -> BloomResult<u64> {
        ensure_positive("lambda", lambda)?;

        if lambda < KNUTH_POISSON_LIMIT {
            let limit = (-lambda).exp();
            let mut k = 0u64;
            let mut p = 1.0;
            loop {
                p *= self.uniform();
                if p <= limit {
                    return Ok(k);
                }
                k += 1;
            }
        }

        let dist = Poisson::new(lambda).map_err(|e| BloomError::invalid("lambda", e.to_string()))?;
        let draw: f64 = dist.sample(&mut self.rng);
        Ok(draw as u64)
    }

    /// Power-law draw on `[x_min, x_max]` with density `p(x) ∝ x^(-alpha)`.
    pub fn power_law(&mut self, alpha: f64, x_min: f64, x_max: f64) -> BloomResult<f64> {
        ensure_finite("alpha", alpha)?;
        ensure_positive("x_min", x_min)?;
        ensure_finite("x_max", x_max)?;
        if x_max <= x_min {
            return Err(BloomError::invalid("x_max", format!("{} is not above x_min {}", x_max, x_min)));
        }

        let u = self.uniform();
        let beta = alpha - 1.0;
        if beta.abs() < 1e-10 {
            return Ok(x_min * (u * (x_max / x_min).ln()).exp());
        }
        Ok(x_min * (1.0 - u * (1.0 - (x_min / x_max).powf(beta))).powf(-1.0 / beta))
    }

    /// Log-normal draw: `exp(mu_log + sigma_log * z)`.
    pub fn log_normal(&mut self, mu_log: f64, sigma_log: f64) -> BloomResult<f64> {
        ensure_finite("mu_log", mu_log)?;
        ensure_non_negative("sigma_log", sigma_log)?;
        let dist = LogNormal::new(mu_log, sigma_log)
            .map_err(|e| BloomError::invalid("sigma_log", e.to_string()))?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Beta draw on `[0, 1]`.
    pub fn beta(&mut self, alpha: f64, beta: f64) -> BloomResult<f64> {
        ensure_positive("alpha", alpha)?;
        ensure_positive("beta", beta)?;
        let dist = Beta::new(alpha, beta).map_err(|e| BloomError::invalid("beta", e.to_string()))?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Gamma draw with the given shape and scale.
    pub fn gamma(&mut self, shape: f64, scale: f64) -> BloomResult<f64> {
        ensure_positive("shape", shape)?;
        ensure_positive("scale", scale)?;
        let dist = Gamma::new(shape, scale).map_err(|e| BloomError::invalid("shape", e.to_string()))?;
        Ok(dist.sample(&mut self.rng))
    }

    /// Uniformly picks one item. Returns `None` for an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Picks one item with probability proportional to its weight.
    pub fn weighted_choice<'a, T>(&mut self, items: &'a [T], weights: &[f64]) -> BloomResult<&'a T> {
        if items.len() != weights.len() {
            return Err(BloomError::invalid(
                "weights",
                format!("{} weights for {} items", weights.len(), items.len()),
            ));
        }
        let index = WeightedIndex::new(weights).map_err(|e| BloomError::invalid("weights", e.to_string()))?;
        Ok(&items[index.sample(&mut self.rng)])
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

impl RngCore for SeededRandom {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}
