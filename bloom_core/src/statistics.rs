//! Sample statistics used to validate generator output.
//!
//! Key metrics:
//! - Moments (mean, variance, standard deviation)
//! - Order statistics (median, quantiles)
//! - Pairwise relations (Pearson correlation, least-squares fit, RMSE)

use serde::{Deserialize, Serialize};

// =============================================================================
// SUMMARY
// =============================================================================

/// Descriptive statistics for a slice of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample variance (n - 1 denominator)
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleSummary {
    /// Summarises `samples`. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = if samples.len() > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));

        Some(Self {
            count: samples.len(),
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

// =============================================================================
// ORDER STATISTICS
// =============================================================================

/// Linear-interpolated quantile, `p` in `[0, 1]`.
pub fn quantile(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median (50th percentile).
pub fn median(samples: &[f64]) -> Option<f64> {
    quantile(samples, 0.5)
}

// =============================================================================
// PAIRWISE
// =============================================================================

/// Pearson correlation coefficient. `None` for mismatched lengths or zero variance.
pub fn correlation(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let sx = SampleSummary::from_samples(xs)?;
    let sy = SampleSummary::from_samples(ys)?;
    if sx.std_dev == 0.0 || sy.std_dev == 0.0 {
        return None;
    }

    let cov = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - sx.mean) * (y - sy.mean))
        .sum::<f64>()
        / (xs.len() as f64 - 1.0);
    Some(cov / (sx.std_dev * sy.std_dev))
}

/// Root-mean-square difference between two equal-length series.
pub fn rmse(actual: &[f64], expected: &[f64]) -> Option<f64> {
    if actual.len() != expected.len() || actual.is_empty() {
        return None;
    }
    let sum_sq: f64 = actual.iter().zip(expected).map(|(a, e)| (a - e).powi(2)).sum();
    Some((sum_sq / actual.len() as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary() {
        let s = SampleSummary::from_samples(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.mean, 2.5);
        assert_relative_eq!(s.variance, 5.0 / 3.0, epsilon = 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!(SampleSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_quantiles() {
        let xs = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(median(&xs), Some(3.0));
        assert_eq!(quantile(&xs, 0.0), Some(1.0));
        assert_eq!(quantile(&xs, 1.0), Some(5.0));
        assert_relative_eq!(quantile(&xs, 0.25).unwrap(), 2.0);
        assert!(quantile(&xs, 1.5).is_none());
    }

    #[test]
    fn test_correlation() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x + 1.0).collect();
        let flipped: Vec<f64> = ys.iter().map(|y| -y).collect();

        assert_relative_eq!(correlation(&xs, &ys).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(correlation(&xs, &flipped).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rmse() {
        assert_relative_eq!(rmse(&[1.0, 2.0], &[1.0, 4.0]).unwrap(), 2.0f64.sqrt());
        assert!(rmse(&[1.0], &[]).is_none());
    }
}
