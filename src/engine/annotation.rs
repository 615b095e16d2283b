use super::stats::Statistics;
use super::style::{fixed2, LabelPosition, LineStyle, BAND_LINE, MEAN_LINE};

// ---------------------------------------------------------------------------
// Overlay descriptors: mean line and one-sigma band
// ---------------------------------------------------------------------------

/// A horizontal overlay line. `key` is stable across recomputations so the
/// chart layer can update an existing overlay instead of recreating it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationLine {
    pub key: &'static str,
    pub value: f64,
    pub label: String,
    pub label_position: LabelPosition,
    pub style: LineStyle,
}

/// Either empty (band disabled) or exactly upper band, lower band, mean line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationSet {
    lines: Vec<AnnotationLine>,
}

impl AnnotationSet {
    pub const UPPER_BAND: &'static str = "upper_band";
    pub const LOWER_BAND: &'static str = "lower_band";
    pub const MEAN_LINE: &'static str = "mean_line";

    pub fn build(stats: &Statistics, show_band: bool) -> Self {
        if !show_band {
            return Self::default();
        }

        let upper = stats.upper();
        let lower = stats.lower();
        let lines = vec![
            AnnotationLine {
                key: Self::UPPER_BAND,
                value: upper,
                label: fixed2(upper),
                label_position: LabelPosition::Start,
                style: BAND_LINE,
            },
            AnnotationLine {
                key: Self::LOWER_BAND,
                value: lower,
                label: fixed2(lower),
                label_position: LabelPosition::End,
                style: BAND_LINE,
            },
            AnnotationLine {
                key: Self::MEAN_LINE,
                value: stats.mean,
                label: format!("Average: {}", fixed2(stats.mean)),
                label_position: LabelPosition::Center,
                style: MEAN_LINE,
            },
        ];
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationLine> {
        self.lines.iter()
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationLine> {
        self.lines.iter().find(|line| line.key == key)
    }

    pub fn upper_band(&self) -> Option<&AnnotationLine> {
        self.get(Self::UPPER_BAND)
    }

    pub fn lower_band(&self) -> Option<&AnnotationLine> {
        self.get(Self::LOWER_BAND)
    }

    pub fn mean_line(&self) -> Option<&AnnotationLine> {
        self.get(Self::MEAN_LINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_band_is_empty() {
        let stats = Statistics {
            mean: 3.0,
            stddev: 1.0,
        };
        let set = AnnotationSet::build(&stats, false);
        assert!(set.is_empty());
        assert!(set.mean_line().is_none());
    }

    #[test]
    fn test_three_lines_in_order() {
        let stats = Statistics {
            mean: 10.0,
            stddev: 2.5,
        };
        let set = AnnotationSet::build(&stats, true);
        let keys: Vec<&str> = set.iter().map(|l| l.key).collect();
        assert_eq!(keys, vec!["upper_band", "lower_band", "mean_line"]);

        assert_eq!(set.upper_band().unwrap().value, 12.5);
        assert_eq!(set.upper_band().unwrap().label, "12.50");
        assert_eq!(set.lower_band().unwrap().value, 7.5);
        assert_eq!(set.lower_band().unwrap().label_position, LabelPosition::End);
        assert_eq!(set.mean_line().unwrap().label, "Average: 10.00");
        assert_eq!(set.mean_line().unwrap().style, MEAN_LINE);
    }

    #[test]
    fn test_zero_spread_collapses_band() {
        let stats = Statistics {
            mean: 5.0,
            stddev: 0.0,
        };
        let set = AnnotationSet::build(&stats, true);
        let mean = set.mean_line().unwrap().value;
        assert_eq!(set.upper_band().unwrap().value, mean);
        assert_eq!(set.lower_band().unwrap().value, mean);
    }
}
