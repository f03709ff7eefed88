//! Per-channel baseline averaging and the rise test.

use crate::data::Sample;

/// Accumulates a fixed number of ticks per channel and yields the integer mean.
#[derive(Debug, Clone)]
pub struct BaselineEstimator {
    sums: Vec<u64>,
    count: usize,
    target: usize,
    values: Vec<Sample>,
}

impl BaselineEstimator {
    /// Estimator over `channels` channels averaging `target` ticks (at least 1).
    pub fn new(channels: usize, target: usize) -> Self {
        Self {
            sums: vec![0; channels],
            count: 0,
            target: target.max(1),
            values: vec![0; channels],
        }
    }

    /// Add one tick. Returns true on the tick that completes the average.
    ///
    /// Ticks after completion are ignored until [`reset`](Self::reset).
    pub fn accumulate(&mut self, samples: &[Sample]) -> bool {
        if self.is_ready() {
            return false;
        }
        for (sum, &sample) in self.sums.iter_mut().zip(samples) {
            *sum += u64::from(sample);
        }
        self.count += 1;
        if self.count < self.target {
            return false;
        }

        let target = self.target as u64;
        for (value, &sum) in self.values.iter_mut().zip(&self.sums) {
            *value = Sample::try_from(sum / target).unwrap_or(Sample::MAX);
        }
        true
    }

    /// True once `target` ticks have been accumulated.
    pub fn is_ready(&self) -> bool {
        self.count >= self.target
    }

    /// Ticks accumulated so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The averages; all zero until ready.
    pub fn values(&self) -> &[Sample] {
        &self.values
    }

    /// Forget everything for a new cycle.
    pub fn reset(&mut self) {
        self.sums.iter_mut().for_each(|s| *s = 0);
        self.values.iter_mut().for_each(|v| *v = 0);
        self.count = 0;
    }
}

/// Absolute distance between a sample and its baseline.
pub fn deviation(baseline: Sample, sample: Sample) -> u16 {
    baseline.abs_diff(sample)
}

/// True if `sample` lies strictly further than `threshold` from `baseline`.
pub fn exceeds_threshold(baseline: Sample, sample: Sample, threshold: u16) -> bool {
    deviation(baseline, sample) > threshold
}
