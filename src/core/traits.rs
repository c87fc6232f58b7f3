//! Progress reporting seam
//!
//! The aggregator emits a monotonically increasing `(done, total)` signal
//! after each output record. What is done with it (a terminal progress bar,
//! nothing at all) is up to the caller.

/// Receives progress of an aggregation pass
pub trait ProgressReporter {
    /// Called once before the pass with the number of data rows
    fn start(&mut self, _total: usize) {}

    /// Called after each output record is written
    fn advance(&mut self, done: usize, total: usize);

    /// Called once after the pass
    fn finish(&mut self, _done: usize, _total: usize) {}
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn advance(&mut self, _done: usize, _total: usize) {}
}

/// Percentage of `done` over `total`, 100 for an empty pass
pub fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (done as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 4, 0.0)]
    #[case(1, 4, 25.0)]
    #[case(4, 4, 100.0)]
    #[case(0, 0, 100.0)]
    fn test_percent(#[case] done: usize, #[case] total: usize, #[case] expected: f64) {
        assert!((percent(done, total) - expected).abs() < f64::EPSILON);
    }
}
