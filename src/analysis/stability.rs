//! Stability scoring and drift detection over a window snapshot
//!
//! The score is derived from the coefficient of variation of the window: a
//! steady signal scores 1.0 and the score falls by twice the relative
//! dispersion, clamped to `[0.0, 1.0]`. Drift is the slope of an ordinary
//! least-squares line through `(index, value)` pairs, flagged when it exceeds
//! 2% of the mean per sample.

use crate::signals::StabilityResult;

/// Fewer samples than this are reported as fully stable
pub const MIN_SAMPLES_FOR_SCORING: usize = 3;

/// Relative slope per step above which a trend counts as drift
pub const DRIFT_THRESHOLD_RATIO: f64 = 0.02;

/// Intermediate statistics of one snapshot, exposed for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStatistics {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    /// OLS slope of value against 0-based sample index
    pub slope: f64,
}

impl WindowStatistics {
    /// Compute statistics for a snapshot; `None` for fewer than two samples
    pub fn compute(samples: &[f64]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        // A zero mean would divide by zero; treat it as no dispersion
        let coefficient_of_variation = if mean != 0.0 { std_dev / mean } else { 0.0 };

        Some(Self {
            mean,
            std_dev,
            coefficient_of_variation,
            slope: ols_slope(samples, mean),
        })
    }
}

/// Closed-form least-squares slope for values sampled at x = 0, 1, 2, ...
fn ols_slope(samples: &[f64], mean: f64) -> f64 {
    let x_mean = (samples.len() as f64 - 1.0) / 2.0;

    let (covariance, x_variance) = samples.iter().enumerate().fold(
        (0.0, 0.0),
        |(cov, var), (index, value)| {
            let dx = index as f64 - x_mean;
            (cov + dx * (value - mean), var + dx * dx)
        },
    );

    if x_variance == 0.0 {
        0.0
    } else {
        covariance / x_variance
    }
}

/// Derives stability scores and drift verdicts from window snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityScorer;

impl StabilityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a snapshot that already includes the newest sample
    ///
    /// # Examples
    ///
    /// ```
    /// use skywatch::analysis::StabilityScorer;
    ///
    /// let result = StabilityScorer::new().score(&[300.0, 305.0, 310.0]);
    /// assert!(result.score > 0.9);
    /// assert!(!result.drift_detected);
    /// ```
    pub fn score(&self, samples: &[f64]) -> StabilityResult {
        if samples.len() < MIN_SAMPLES_FOR_SCORING {
            return StabilityResult::insufficient_history();
        }

        match WindowStatistics::compute(samples) {
            Some(stats) => Self::from_statistics(&stats),
            None => StabilityResult::insufficient_history(),
        }
    }

    fn from_statistics(stats: &WindowStatistics) -> StabilityResult {
        let score = (1.0 - 2.0 * stats.coefficient_of_variation).clamp(0.0, 1.0);
        let drift_detected = stats.slope.abs() > stats.mean * DRIFT_THRESHOLD_RATIO;

        StabilityResult {
            // NaN only arises from non-finite input; report it as unstable
            score: if score.is_nan() { 0.0 } else { score },
            drift_detected,
            drift_magnitude: drift_detected.then_some(stats.slope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_short_windows_are_fully_stable() {
        let scorer = StabilityScorer::new();
        for samples in [vec![], vec![5.0], vec![1.0, 1000.0]] {
            let result = scorer.score(&samples);
            assert_eq!(result.score, 1.0);
            assert!(!result.drift_detected);
            assert!(result.drift_magnitude.is_none());
        }
    }

    #[test]
    fn test_constant_sequence_scores_one() {
        let result = StabilityScorer::new().score(&[42.0; 10]);
        assert_eq!(result.score, 1.0);
        assert!(!result.drift_detected);
        assert!(result.drift_magnitude.is_none());
    }

    #[test]
    fn test_zero_mean_is_treated_as_stable() {
        let stats = WindowStatistics::compute(&[-1.0, 1.0, -1.0, 1.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.coefficient_of_variation, 0.0);

        let result = StabilityScorer::new().score(&[0.0, 0.0, 0.0]);
        assert_eq!(result.score, 1.0);
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_highly_dispersed_sequence_clamps_to_zero() {
        let result = StabilityScorer::new().score(&[1.0, 1000.0, 1.0, 1000.0, 1.0]);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_low_dispersion_scores_high() {
        let result = StabilityScorer::new().score(&[300.0, 305.0, 310.0]);
        // sigma = 4.0825, cv = 0.01339
        assert!(approx_eq(result.score, 1.0 - 2.0 * (50.0f64 / 3.0).sqrt() / 305.0));
        assert!(result.score > 0.9);
        // slope 5 < 2% of 305
        assert!(!result.drift_detected);
    }

    #[test]
    fn test_population_standard_deviation() {
        let stats = WindowStatistics::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx_eq(stats.mean, 5.0));
        assert!(approx_eq(stats.std_dev, 2.0));
        assert!(approx_eq(stats.coefficient_of_variation, 0.4));
    }

    #[test]
    fn test_ols_slope_of_linear_sequence() {
        let samples: Vec<f64> = (0..10).map(|i| 3.0 + 2.5 * i as f64).collect();
        let stats = WindowStatistics::compute(&samples).unwrap();
        assert!(approx_eq(stats.slope, 2.5));
    }

    #[test]
    fn test_ols_slope_of_noisy_sequence() {
        // Least-squares fit of (0,1) (1,3) (2,2) (3,5) has slope 1.1
        let stats = WindowStatistics::compute(&[1.0, 3.0, 2.0, 5.0]).unwrap();
        assert!(approx_eq(stats.slope, 1.1));
    }

    #[test]
    fn test_falling_trend_reports_negative_magnitude() {
        let result = StabilityScorer::new().score(&[100.0, 90.0, 80.0, 70.0]);
        assert!(result.drift_detected);
        assert!(approx_eq(result.drift_magnitude.unwrap(), -10.0));
    }

    #[test]
    fn test_drift_magnitude_is_unrounded() {
        let result = StabilityScorer::new().score(&[1.0, 1.123456, 1.246912]);
        assert!(result.drift_detected);
        assert!(approx_eq(result.drift_magnitude.unwrap(), 0.123456));
    }

    #[test]
    fn test_monotonic_sequence_detects_drift_once_window_has_three_samples() {
        let scorer = StabilityScorer::new();
        let mut window = crate::window::RollingWindow::new(20);

        for value in 1..=20 {
            window.append(value as f64);
            let snapshot = window.snapshot();
            let result = scorer.score(&snapshot);

            if snapshot.len() < 3 {
                assert!(!result.drift_detected, "no drift with {} samples", snapshot.len());
            } else {
                let mean = snapshot.iter().sum::<f64>() / snapshot.len() as f64;
                // Slope of 1..n is exactly 1 per step
                assert!(1.0 > mean * DRIFT_THRESHOLD_RATIO);
                assert!(result.drift_detected, "drift expected with {} samples", snapshot.len());
                assert!(approx_eq(result.drift_magnitude.unwrap(), 1.0));
            }
        }
    }
}
