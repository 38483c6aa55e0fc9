//! Funding-rate sentiment scoring.

use std::collections::VecDeque;

use crate::signals::Vote;

use super::{sample_stats, STDDEV_FLOOR};

/// Funding settles every 8 hours on Bybit perpetuals, three times a day.
const FUNDING_PERIODS_PER_DAY: f64 = 3.0;

/// Windowed funding-rate tracker voting contrarian on crowding extremes.
///
/// A rate is extreme when its z-score against the window breaks
/// `extreme_zscore` or the raw rate breaks `extreme_rate`. Extreme positive
/// funding means longs are crowded and paying heavily, so the squeeze risk
/// is downward and the tracker votes `Short`; extreme negative funding is
/// the mirrored short squeeze and votes `Long`. Anything inside the band
/// abstains.
///
/// The z-score needs a full window; before that only the raw-rate threshold
/// can trip, and before `min_samples` observations the tracker abstains
/// entirely.
#[derive(Debug, Clone)]
pub struct FundingTracker {
    lookback: usize,
    min_samples: usize,
    extreme_zscore: f64,
    extreme_rate: f64,
    window: VecDeque<f64>,
}

impl FundingTracker {
    pub fn new(lookback: usize, min_samples: usize, extreme_zscore: f64, extreme_rate: f64) -> Self {
        debug_assert!(lookback >= 1, "funding lookback must be at least 1");
        Self {
            lookback,
            min_samples,
            extreme_zscore,
            extreme_rate,
            window: VecDeque::with_capacity(lookback),
        }
    }

    /// Record one funding-rate observation, evicting the oldest once the
    /// window is full.
    pub fn update(&mut self, funding_rate: f64) {
        if self.window.len() == self.lookback {
            self.window.pop_front();
        }
        self.window.push_back(funding_rate);
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.min_samples
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    pub fn latest_rate(&self) -> Option<f64> {
        self.window.back().copied()
    }

    /// Latest rate annualized as a percentage:
    /// `rate * settlements_per_day * 365 * 100`.
    pub fn annualized_pct(&self) -> f64 {
        self.latest_rate().unwrap_or(0.0) * FUNDING_PERIODS_PER_DAY * 365.0 * 100.0
    }

    /// Z-score of the latest rate against the window. Zero until the window
    /// is full, so early extremes can only trip on the raw rate.
    pub fn zscore(&self) -> f64 {
        if self.window.len() < self.lookback {
            return 0.0;
        }
        let latest = match self.window.back() {
            Some(rate) => *rate,
            None => return 0.0,
        };
        match sample_stats(self.window.iter().copied()) {
            Some((mean, stddev)) if stddev >= STDDEV_FLOOR => (latest - mean) / stddev,
            _ => 0.0,
        }
    }

    pub fn is_extreme_positive(&self) -> bool {
        let Some(rate) = self.latest_rate() else {
            return false;
        };
        self.zscore() > self.extreme_zscore || rate > self.extreme_rate
    }

    pub fn is_extreme_negative(&self) -> bool {
        let Some(rate) = self.latest_rate() else {
            return false;
        };
        self.zscore() < -self.extreme_zscore || rate < -self.extreme_rate
    }

    pub fn vote(&self) -> Vote {
        if !self.is_ready() {
            return Vote::Neutral;
        }
        if self.is_extreme_negative() {
            Vote::Long
        } else if self.is_extreme_positive() {
            Vote::Short
        } else {
            Vote::Neutral
        }
    }
}
