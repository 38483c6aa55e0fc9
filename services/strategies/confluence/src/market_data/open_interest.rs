//! Open-interest deviation scoring.

use std::collections::VecDeque;

use crate::signals::Vote;

use super::{sample_stats, STDDEV_FLOOR};

/// Windowed open-interest tracker with price confirmation.
///
/// Keeps the latest `lookback` (open interest, price) pairs. The z-score of
/// the newest open-interest sample against the window mean tells whether
/// positioning is building faster than usual; the price trend across the
/// same window decides which side is building it. Rising OI with rising
/// price votes `Long`, rising OI with falling price votes `Short`, and a
/// flat or shrinking book abstains.
#[derive(Debug, Clone)]
pub struct OpenInterestTracker {
    lookback: usize,
    zscore_threshold: f64,
    extreme_threshold: f64,
    window: VecDeque<OiSample>,
}

#[derive(Debug, Clone, Copy)]
struct OiSample {
    open_interest: f64,
    price: f64,
}

impl OpenInterestTracker {
    pub fn new(lookback: usize, zscore_threshold: f64, extreme_threshold: f64) -> Self {
        debug_assert!(lookback >= 1, "OI lookback must be at least 1");
        Self {
            lookback,
            zscore_threshold,
            extreme_threshold,
            window: VecDeque::with_capacity(lookback),
        }
    }

    /// Record one (open interest, mark price) observation, evicting the
    /// oldest once the window is full.
    pub fn update(&mut self, open_interest: f64, price: f64) {
        if self.window.len() == self.lookback {
            self.window.pop_front();
        }
        self.window.push_back(OiSample {
            open_interest,
            price,
        });
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.lookback
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Z-score of the latest open-interest sample against the window.
    /// Zero while the window is short or effectively constant.
    pub fn zscore(&self) -> f64 {
        if !self.is_ready() {
            return 0.0;
        }
        let latest = match self.window.back() {
            Some(sample) => sample.open_interest,
            None => return 0.0,
        };
        match sample_stats(self.window.iter().map(|s| s.open_interest)) {
            Some((mean, stddev)) if stddev >= STDDEV_FLOOR => (latest - mean) / stddev,
            _ => 0.0,
        }
    }

    /// Unusually large deviation in either direction. Observability only:
    /// the vote uses `zscore_threshold`, not this flag.
    pub fn is_extreme(&self) -> bool {
        self.zscore().abs() > self.extreme_threshold
    }

    fn price_trend(&self) -> Option<std::cmp::Ordering> {
        let oldest = self.window.front()?.price;
        let latest = self.window.back()?.price;
        latest.partial_cmp(&oldest)
    }

    pub fn vote(&self) -> Vote {
        if !self.is_ready() || self.zscore() <= self.zscore_threshold {
            return Vote::Neutral;
        }
        match self.price_trend() {
            Some(std::cmp::Ordering::Greater) => Vote::Long,
            Some(std::cmp::Ordering::Less) => Vote::Short,
            _ => Vote::Neutral,
        }
    }
}
