//! Derivatives sentiment trackers fed from ticker events.
//!
//! Both trackers keep a bounded FIFO window and recompute their statistics
//! from exactly the current window contents, so evicting the oldest sample
//! immediately drops it from the mean and deviation. Until a tracker has its
//! minimum sample count it abstains with a `Neutral` vote, the same way a
//! warming candle indicator does.

pub mod funding_rate;
pub mod open_interest;

pub use funding_rate::FundingTracker;
pub use open_interest::OpenInterestTracker;

/// Sample mean and standard deviation (n - 1 denominator) over a window.
///
/// Returns `None` for windows shorter than two samples, where the sample
/// deviation is undefined.
pub(crate) fn sample_stats(values: impl Iterator<Item = f64> + Clone) -> Option<(f64, f64)> {
    let n = values.clone().count();
    if n < 2 {
        return None;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some((mean, variance.sqrt()))
}

/// Deviations this small are treated as zero variance to avoid exploding
/// z-scores on effectively constant windows.
pub(crate) const STDDEV_FLOOR: f64 = 1e-10;
