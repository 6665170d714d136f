//! Timer statistics reduction

use super::types::TimerStats;

/// Reduce a bag of timer samples to count/min/max/avg.
///
/// An empty bag yields all zeros rather than NaN.
pub fn reduce(samples: &[f64]) -> TimerStats {
    if samples.is_empty() {
        return TimerStats::EMPTY;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();

    TimerStats {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        avg: sum / count as f64,
    }
}
