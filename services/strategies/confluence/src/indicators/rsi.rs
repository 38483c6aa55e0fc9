//! Relative strength index with Wilder smoothing.

use crate::signals::Vote;

/// Incremental RSI voter.
///
/// Needs `period + 1` prices before producing a value: the first price only
/// anchors the change series, the average gain and loss are seeded from a
/// simple average of the first `period` changes, and later changes fold in
/// with Wilder smoothing `avg = (avg * (period - 1) + x) / period`.
///
/// The vote requires both a zone hit and one-step momentum out of it:
/// oversold and rising votes `Long`, overbought and falling votes `Short`.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    oversold: f64,
    overbought: f64,
    prev_price: Option<f64>,
    seed_gain_sum: f64,
    seed_loss_sum: f64,
    seed_count: usize,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
    value: Option<f64>,
    prev_value: Option<f64>,
}

impl RsiState {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        debug_assert!(period >= 1, "RSI period must be at least 1");
        Self {
            period,
            oversold,
            overbought,
            prev_price: None,
            seed_gain_sum: 0.0,
            seed_loss_sum: 0.0,
            seed_count: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
            value: None,
            prev_value: None,
        }
    }

    /// Feed one close. Returns the updated RSI once warm-up completes.
    pub fn update(&mut self, price: f64) -> Option<f64> {
        if let Some(prev_price) = self.prev_price {
            let change = price - prev_price;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if self.seeded {
                let p = self.period as f64;
                self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
                self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
            } else {
                self.seed_gain_sum += gain;
                self.seed_loss_sum += loss;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.avg_gain = self.seed_gain_sum / self.period as f64;
                    self.avg_loss = self.seed_loss_sum / self.period as f64;
                    self.seeded = true;
                }
            }

            if self.seeded {
                self.prev_value = self.value;
                self.value = Some(Self::rsi_from_averages(self.avg_gain, self.avg_loss));
            }
        }
        self.prev_price = Some(price);
        self.value
    }

    fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
        if avg_loss == 0.0 {
            return 100.0;
        }
        let rs = avg_gain / avg_loss;
        (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn is_rising(&self) -> bool {
        matches!((self.value, self.prev_value), (Some(now), Some(prev)) if now > prev)
    }

    fn is_falling(&self) -> bool {
        matches!((self.value, self.prev_value), (Some(now), Some(prev)) if now < prev)
    }

    pub fn vote(&self) -> Vote {
        match self.value {
            Some(value) if value < self.oversold && self.is_rising() => Vote::Long,
            Some(value) if value > self.overbought && self.is_falling() => Vote::Short,
            _ => Vote::Neutral,
        }
    }
}
