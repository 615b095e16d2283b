use compensated_summation::KahanBabuskaNeumaier;
use rayon::prelude::*;

type Kbn = KahanBabuskaNeumaier<f64>;

// ---------------------------------------------------------------------------
// Aggregator – map / reduce over flat numeric sequences
// ---------------------------------------------------------------------------

/// Map/reduce primitives the statistics and regression passes are built on.
///
/// Inputs at or above `parallel_threshold` elements are fanned out over the
/// rayon pool; smaller inputs run inline. Both paths return the same values
/// (up to rounding for sums) and always preserve element order for `map`.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    parallel_threshold: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl Aggregator {
    /// Below this many elements the rayon hand-off costs more than it saves.
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

    /// Chunk size for the compensated parallel sum.
    const SUM_CHUNK: usize = 1024;

    pub fn new(parallel_threshold: usize) -> Self {
        Self {
            parallel_threshold: parallel_threshold.max(1),
        }
    }

    /// An aggregator that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
        }
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    fn is_parallel(&self, len: usize) -> bool {
        len >= self.parallel_threshold
    }

    /// Apply `f` to every item, keeping index alignment with the input.
    pub fn map<T, F>(&self, items: &[T], f: F) -> Vec<f64>
    where
        T: Sync,
        F: Fn(&T) -> f64 + Sync + Send,
    {
        if self.is_parallel(items.len()) {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }

    /// Fold `values` with an associative, commutative `combine`.
    ///
    /// Returns `None` for an empty sequence; there is no identity element to
    /// fall back on, so callers decide what an empty input means.
    pub fn reduce<F>(&self, values: &[f64], combine: F) -> Option<f64>
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        if self.is_parallel(values.len()) {
            values.par_iter().copied().reduce_with(combine)
        } else {
            values.iter().copied().reduce(combine)
        }
    }

    /// Compensated (Kahan-Babuška-Neumaier) sum; `0.0` for an empty input.
    pub fn sum(&self, values: &[f64]) -> f64 {
        if !self.is_parallel(values.len()) {
            return kbn_total(values.iter().copied());
        }

        // Partial sums are combined in chunk order, so the result does not
        // depend on how rayon scheduled the chunks.
        let partials: Vec<f64> = values
            .par_chunks(Self::SUM_CHUNK)
            .map(|chunk| kbn_total(chunk.iter().copied()))
            .collect();
        kbn_total(partials)
    }

    /// `Σ (v - center)²`, the building block of every variance-like pass.
    pub fn sum_squared_deltas(&self, values: &[f64], center: f64) -> f64 {
        let squared = self.map(values, |&v| (v - center).powi(2));
        self.sum(&squared)
    }
}

fn kbn_total<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let mut acc = Kbn::default();
    for v in values {
        acc += v;
    }
    acc.total()
}
