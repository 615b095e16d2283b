use thiserror::Error;

use super::aggregate::Aggregator;
use super::stats::mean;
use super::style::{fixed2, LineStyle, REGRESSION_LINE};

/// Relative tolerance: the explained sum counts as zero below this fraction of
/// the total sum of squares, the residual sum below this fraction of `Σ y²`.
const EXACT_FIT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegressionError {
    #[error("cannot fit a trend line to an empty series")]
    Empty,
}

// ---------------------------------------------------------------------------
// Least-squares fit of value against 1-based position
// ---------------------------------------------------------------------------

/// Closed-form OLS fit. `fitted[i]` is the trend value at `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub fitted: Vec<f64>,
    /// `None` when the explained sum of squares is zero but the fit is not
    /// exact, i.e. the goodness of fit is undefined.
    pub r2: Option<f64>,
}

impl RegressionResult {
    pub fn is_finite(&self) -> bool {
        self.slope.is_finite()
            && self.intercept.is_finite()
            && self.fitted.iter().all(|v| v.is_finite())
    }
}

/// Fit `y = slope * x + intercept` with `x_i = i + 1`.
///
/// A single observation yields a flat line through it with `r2 = 1`.
pub fn fit(agg: &Aggregator, values: &[f64]) -> Result<RegressionResult, RegressionError> {
    match values.len() {
        0 => return Err(RegressionError::Empty),
        1 => {
            log::warn!("trend line over a single observation collapses to a flat line");
            return Ok(RegressionResult {
                slope: 0.0,
                intercept: values[0],
                fitted: vec![values[0]],
                r2: Some(1.0),
            });
        }
        _ => {}
    }

    let xs: Vec<f64> = (1..=values.len()).map(|i| i as f64).collect();
    let x_mean = mean(agg, &xs);
    let y_mean = mean(agg, values);

    let pairs: Vec<(f64, f64)> = xs.iter().copied().zip(values.iter().copied()).collect();
    let cross = agg.map(&pairs, |&(x, y)| (x - x_mean) * (y - y_mean));
    let numerator = agg.sum(&cross);
    // Non-zero for n >= 2 since the positions are distinct.
    let denominator = agg.sum_squared_deltas(&xs, x_mean);

    let slope = numerator / denominator;
    let intercept = y_mean - x_mean * slope;
    let fitted = agg.map(&xs, |&x| slope * x + intercept);

    let residual_pairs: Vec<(f64, f64)> =
        values.iter().copied().zip(fitted.iter().copied()).collect();
    let residuals = agg.map(&residual_pairs, |&(y, y_hat)| (y - y_hat).powi(2));
    let ss_residual = agg.sum(&residuals);
    let ss_explained = agg.sum_squared_deltas(&fitted, y_mean);
    let ss_total = agg.sum_squared_deltas(values, y_mean);
    let magnitude = agg.sum(&agg.map(values, |&y| y * y));

    let r2 = goodness_of_fit(ss_residual, ss_explained, ss_total, magnitude);
    if r2.is_none() {
        log::warn!("trend line explains no variance; r2 is undefined");
    }

    Ok(RegressionResult {
        slope,
        intercept,
        fitted,
        r2,
    })
}

/// `1 - SSres / SSreg`, with the zero-denominator case resolved:
/// an exact fit scores 1, anything else is undefined. Both thresholds scale
/// with the data, so multiplying a series by a constant leaves r2 unchanged.
fn goodness_of_fit(
    ss_residual: f64,
    ss_explained: f64,
    ss_total: f64,
    magnitude: f64,
) -> Option<f64> {
    if ss_explained <= EXACT_FIT_TOLERANCE * ss_total {
        return (ss_residual <= EXACT_FIT_TOLERANCE * magnitude).then_some(1.0);
    }
    let r2 = 1.0 - ss_residual / ss_explained;
    r2.is_finite().then_some(r2)
}

// ---------------------------------------------------------------------------
// Rendering descriptor
// ---------------------------------------------------------------------------

/// The fitted line as the chart layer consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionSeries {
    pub label: String,
    pub fit: RegressionResult,
    pub style: LineStyle,
}

impl RegressionSeries {
    pub fn new(fit: RegressionResult) -> Self {
        Self {
            label: trend_label(fit.r2),
            fit,
            style: REGRESSION_LINE,
        }
    }

    pub fn points(&self) -> &[f64] {
        &self.fit.fitted
    }
}

pub fn trend_label(r2: Option<f64>) -> String {
    match r2 {
        Some(r2) => format!("Line of Best Fit (r2: {})", fixed2(r2)),
        None => "Line of Best Fit (r2: n/a)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn agg() -> Aggregator {
        Aggregator::default()
    }

    #[test]
    fn test_empty_is_rejected() {
        assert_eq!(fit(&agg(), &[]), Err(RegressionError::Empty));
    }

    #[test]
    fn test_single_observation_is_flat() {
        let r = fit(&agg(), &[4.2]).unwrap();
        assert_eq!(r.slope, 0.0);
        assert_eq!(r.intercept, 4.2);
        assert_eq!(r.fitted, vec![4.2]);
        assert_eq!(r.r2, Some(1.0));
    }

    #[test]
    fn test_recovers_linear_series() {
        // y = 2.5 * x - 3 with x = 1..=10
        let values: Vec<f64> = (1..=10).map(|x| 2.5 * x as f64 - 3.0).collect();
        let r = fit(&agg(), &values).unwrap();
        assert_approx_eq!(r.slope, 2.5, 1e-9);
        assert_approx_eq!(r.intercept, -3.0, 1e-9);
        assert_approx_eq!(r.r2.unwrap(), 1.0, 1e-9);
        for (y, y_hat) in values.iter().zip(&r.fitted) {
            assert_approx_eq!(*y, *y_hat, 1e-9);
        }
    }

    #[test]
    fn test_constant_series_is_exact() {
        let r = fit(&agg(), &[5.0; 4]).unwrap();
        assert_eq!(r.slope, 0.0);
        assert_eq!(r.intercept, 5.0);
        assert_eq!(r.fitted, vec![5.0; 4]);
        assert_eq!(r.r2, Some(1.0));
    }

    #[test]
    fn test_flat_fit_with_residuals_is_undefined() {
        // Symmetric about the middle: slope 0, but not an exact fit.
        let r = fit(&agg(), &[1.0, 3.0, 1.0]).unwrap();
        assert_approx_eq!(r.slope, 0.0);
        assert_eq!(r.r2, None);
        assert!(r.fitted.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_noisy_series_r2() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let r = fit(&agg(), &values).unwrap();
        // slope = 8 / 10, intercept = 3 - 3 * 0.8
        assert_approx_eq!(r.slope, 0.8);
        assert_approx_eq!(r.intercept, 0.6);
        // SSres = 3.6, SSreg = 6.4
        assert_approx_eq!(r.r2.unwrap(), 1.0 - 3.6 / 6.4);
    }

    #[test]
    fn test_r2_is_scale_invariant() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let expected = fit(&agg(), &values).unwrap().r2.unwrap();
        for scale in [1e-7, 1e-12, 1e6] {
            let scaled: Vec<f64> = values.iter().map(|v| v * scale).collect();
            let r = fit(&agg(), &scaled).unwrap();
            assert_approx_eq!(r.r2.unwrap(), expected, 1e-9);
        }
    }

    #[test]
    fn test_small_flat_fit_with_residuals_is_undefined() {
        let values: Vec<f64> = [1.0, 3.0, 1.0].iter().map(|v| v * 1e-7).collect();
        assert_eq!(fit(&agg(), &values).unwrap().r2, None);
    }

    #[test]
    fn test_inexact_constant_series_is_exact() {
        // 0.1 has no exact binary form, so the mean may differ from it by an ulp.
        let r = fit(&agg(), &[0.1; 3]).unwrap();
        assert_eq!(r.r2, Some(1.0));
    }

    #[test]
    fn test_fitted_length_matches_input() {
        for n in 1..20 {
            let values: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
            let r = fit(&agg(), &values).unwrap();
            assert_eq!(r.fitted.len(), values.len());
        }
    }

    #[test]
    fn test_label_rounds_r2() {
        assert_eq!(trend_label(Some(0.98765)), "Line of Best Fit (r2: 0.99)");
        assert_eq!(trend_label(Some(1.0)), "Line of Best Fit (r2: 1.00)");
        assert_eq!(trend_label(None), "Line of Best Fit (r2: n/a)");
    }

    #[test]
    fn test_series_descriptor() {
        let series = RegressionSeries::new(fit(&agg(), &[1.0, 2.0, 3.0]).unwrap());
        assert_eq!(series.label, "Line of Best Fit (r2: 1.00)");
        assert_eq!(series.style, REGRESSION_LINE);
        assert_eq!(series.points().len(), 3);
    }
}
