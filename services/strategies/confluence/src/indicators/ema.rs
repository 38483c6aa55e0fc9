//! Exponential moving average and the dual-EMA trend voter.

use crate::signals::Vote;

/// Incremental EMA with an SMA warm-up seed.
///
/// The first `period` inputs are accumulated into a simple average which
/// becomes the initial EMA value; every later input applies the standard
/// recurrence `ema = (price - prev) * k + prev` with `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        debug_assert!(period >= 1, "EMA period must be at least 1");
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    /// Feed one value. Returns the updated EMA once the seed is complete.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        match self.value {
            Some(prev) => {
                self.value = Some((price - prev) * self.multiplier + prev);
            }
            None => {
                self.seed_sum += price;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Trend direction from a fast EMA against a slow EMA over the same closes.
///
/// Votes `Long` while the fast average sits above the slow one, `Short` while
/// below, and `Neutral` when they coincide or either average is still warming
/// up. Both averages see every close from the first candle onward, so the
/// fast side becomes ready earlier but the vote waits for the slow side.
#[derive(Debug, Clone)]
pub struct TrendState {
    fast: EmaState,
    slow: EmaState,
}

impl TrendState {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
        }
    }

    pub fn update(&mut self, close: f64) {
        self.fast.update(close);
        self.slow.update(close);
    }

    pub fn is_ready(&self) -> bool {
        self.fast.is_ready() && self.slow.is_ready()
    }

    pub fn fast_value(&self) -> Option<f64> {
        self.fast.value()
    }

    pub fn slow_value(&self) -> Option<f64> {
        self.slow.value()
    }

    pub fn vote(&self) -> Vote {
        match (self.fast.value(), self.slow.value()) {
            (Some(fast), Some(slow)) if fast > slow => Vote::Long,
            (Some(fast), Some(slow)) if fast < slow => Vote::Short,
            _ => Vote::Neutral,
        }
    }
}
