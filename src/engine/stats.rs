use super::aggregate::Aggregator;

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation of an observation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub mean: f64,
    pub stddev: f64,
}

impl Statistics {
    pub fn compute(agg: &Aggregator, values: &[f64]) -> Self {
        let mean = mean(agg, values);
        Self {
            mean,
            stddev: stddev_around(agg, values, mean),
        }
    }

    pub fn upper(&self) -> f64 {
        self.mean + self.stddev
    }

    pub fn lower(&self) -> f64 {
        self.mean - self.stddev
    }

    /// False when a sum overflowed, e.g. for values near `f64::MAX`.
    pub fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.upper().is_finite() && self.lower().is_finite()
    }
}

/// Arithmetic mean; `0` for an empty sequence.
pub fn mean(agg: &Aggregator, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    agg.sum(values) / values.len() as f64
}

/// Bessel-corrected sample standard deviation.
///
/// Returns `0` for fewer than two values: with a single observation the
/// `n - 1` divisor is zero and there is no spread to report.
pub fn stddev(agg: &Aggregator, values: &[f64]) -> f64 {
    stddev_around(agg, values, mean(agg, values))
}

fn stddev_around(agg: &Aggregator, values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = agg.sum_squared_deltas(values, mean) / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_empty_sequence() {
        let agg = Aggregator::default();
        assert_eq!(mean(&agg, &[]), 0.0);
        assert_eq!(stddev(&agg, &[]), 0.0);
        assert_eq!(Statistics::compute(&agg, &[]), Statistics::default());
    }

    #[test]
    fn test_overflow_is_reported() {
        let agg = Aggregator::default();
        assert!(Statistics::compute(&agg, &[1.0, 2.0]).is_finite());
        assert!(!Statistics::compute(&agg, &[f64::MAX, -f64::MAX, f64::MAX]).is_finite());
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let agg = Aggregator::default();
        let s = stddev(&agg, &[42.0]);
        assert!(!s.is_nan());
        assert_eq!(s, 0.0);
        assert_eq!(mean(&agg, &[42.0]), 42.0);
    }

    #[test]
    fn test_mean_matches_sum_over_count() {
        let agg = Aggregator::default();
        let values = [3.5, -1.25, 8.0, 0.0, 12.75];
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        assert_approx_eq!(mean(&agg, &values), expected);
    }

    #[test]
    fn test_sample_stddev() {
        let agg = Aggregator::default();
        // Σ(x - 5)² = 32 over n - 1 = 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx_eq!(stddev(&agg, &values), (32.0_f64 / 7.0).sqrt());
    }

    #[test]
    fn test_stddev_is_not_shifted_by_mean() {
        let agg = Aggregator::default();
        let base = [1.0, 2.0, 3.0, 4.0];
        let shifted: Vec<f64> = base.iter().map(|v| v + 1000.0).collect();
        assert_approx_eq!(stddev(&agg, &base), stddev(&agg, &shifted), 1e-9);
    }

    #[test]
    fn test_constant_sequence() {
        let agg = Aggregator::default();
        let stats = Statistics::compute(&agg, &[5.0; 4]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.upper(), stats.lower());
    }
}
