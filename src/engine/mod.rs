/// Trend analytics: everything numeric that happens between a fetched
/// observation sequence and the chart.
///
/// ```text
///   Vec<Observation>
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌─────────┐   ┌────────────┐
///   │  stats   │   │ regression │  OLS over 1-based position
///   └─────────┘   └────────────┘
///        │              │
///        ▼              │
///   ┌────────────┐      │
///   │ annotation  │      │  mean line ± one stddev
///   └────────────┘      │
///        └──────┬───────┘
///               ▼
///          TrendResult
/// ```
///
/// All passes run on [`aggregate::Aggregator`].

pub mod aggregate;
pub mod annotation;
pub mod regression;
pub mod stats;
pub mod style;

use crate::config::WidgetConfig;
use crate::data::model::Observation;

use aggregate::Aggregator;
use annotation::AnnotationSet;
use regression::RegressionSeries;
use stats::Statistics;

/// Everything the chart needs for one observation sequence.
///
/// A new value is built on every recomputation; nothing is updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendResult {
    pub series: Vec<Observation>,
    pub statistics: Statistics,
    /// `None` for an empty series, or when the fit overflows.
    pub regression: Option<RegressionSeries>,
    pub annotations: AnnotationSet,
}

impl TrendResult {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.series.iter().map(|o| o.value).collect()
    }
}

/// Full recomputation from the raw sequence.
///
/// Observations with a NaN or infinite value are dropped before any pass
/// runs. If a sum still overflows, the affected part of the result falls back
/// to its empty form, so every number in a `TrendResult` is finite.
pub fn recompute(
    agg: &Aggregator,
    observations: &[Observation],
    config: &WidgetConfig,
) -> TrendResult {
    let series: Vec<Observation> = observations
        .iter()
        .filter(|o| o.value.is_finite())
        .cloned()
        .collect();
    if series.len() < observations.len() {
        log::warn!(
            "{}: dropped {} non-finite observations",
            config.name,
            observations.len() - series.len()
        );
    }
    let values = agg.map(&series, |o| o.value);

    let mut statistics = Statistics::compute(agg, &values);
    let mut annotations = AnnotationSet::build(&statistics, config.show_standard_deviation);
    if !statistics.is_finite() {
        log::warn!("{}: statistics overflow, omitting the band", config.name);
        statistics = Statistics::default();
        annotations = AnnotationSet::default();
    }

    let regression = match regression::fit(agg, &values) {
        Ok(fit) if fit.is_finite() => Some(RegressionSeries::new(fit)),
        Ok(_) => {
            log::warn!("{}: trend line overflows, omitting it", config.name);
            None
        }
        Err(e) => {
            log::warn!("{}: {e}", config.name);
            None
        }
    };

    log::debug!(
        "{}: recomputed {} observations (mean {:.4}, stddev {:.4}, slope {:?})",
        config.name,
        values.len(),
        statistics.mean,
        statistics.stddev,
        regression.as_ref().map(|r| r.fit.slope),
    );

    TrendResult {
        series,
        statistics,
        regression,
        annotations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RangeOption, WidgetConfig};

    fn config(show_band: bool) -> WidgetConfig {
        WidgetConfig {
            name: "Orders".to_string(),
            query: "orders".to_string(),
            ranges: vec![RangeOption::new("7d", "Last 7 days")],
            relation: None,
            show_standard_deviation: show_band,
        }
    }

    #[test]
    fn test_empty_series_has_no_regression() {
        let result = recompute(&Aggregator::default(), &[], &config(true));
        assert!(result.is_empty());
        assert!(result.regression.is_none());
        assert_eq!(result.statistics, Statistics::default());
        assert_eq!(result.annotations.len(), 3);
    }

    #[test]
    fn test_band_flag_controls_annotations() {
        let obs = vec![Observation::new("a", 1.0), Observation::new("b", 4.0)];
        let with = recompute(&Aggregator::default(), &obs, &config(true));
        let without = recompute(&Aggregator::default(), &obs, &config(false));
        assert_eq!(with.annotations.len(), 3);
        assert!(without.annotations.is_empty());
        assert_eq!(with.regression, without.regression);
    }

    #[test]
    fn test_non_finite_observations_are_dropped() {
        let obs = vec![
            Observation::new("a", 1.0),
            Observation::new("b", f64::NAN),
            Observation::new("c", f64::INFINITY),
            Observation::new("d", 3.0),
        ];
        let result = recompute(&Aggregator::default(), &obs, &config(true));
        assert_eq!(result.values(), vec![1.0, 3.0]);
        assert_eq!(result.statistics.mean, 2.0);
        let fit = &result.regression.as_ref().unwrap().fit;
        assert!(fit.is_finite());
        assert!(result.annotations.iter().all(|a| a.value.is_finite()));
        assert_eq!(result.annotations.mean_line().unwrap().label, "Average: 2.00");
    }

    #[test]
    fn test_overflowing_series_falls_back() {
        let obs = vec![
            Observation::new("a", f64::MAX),
            Observation::new("b", -f64::MAX),
            Observation::new("c", f64::MAX),
        ];
        let result = recompute(&Aggregator::default(), &obs, &config(true));
        assert_eq!(result.series.len(), 3);
        assert_eq!(result.statistics, Statistics::default());
        assert!(result.annotations.is_empty());
        if let Some(regression) = &result.regression {
            assert!(regression.fit.is_finite());
        }
    }
}
