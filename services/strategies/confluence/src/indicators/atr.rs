//! Average true range for stop placement and position sizing.

/// Incremental ATR with Wilder smoothing.
///
/// The very first bar has no prior close, so its true range is just
/// `high - low`; every later bar uses the full
/// `max(high - low, |high - prev_close|, |low - prev_close|)`. The first
/// ATR value is a simple average of the first `period` true ranges.
///
/// ATR never votes — it only scales stops and sizing once a signal clears
/// the confluence gates.
#[derive(Debug, Clone)]
pub struct AtrState {
    period: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl AtrState {
    pub fn new(period: usize) -> Self {
        debug_assert!(period >= 1, "ATR period must be at least 1");
        Self {
            period,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    /// Feed one confirmed bar. Returns the updated ATR once seeded.
    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let true_range = match self.prev_close {
            Some(prev_close) => (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs()),
            None => high - low,
        };

        match self.value {
            Some(prev) => {
                let p = self.period as f64;
                self.value = Some((prev * (p - 1.0) + true_range) / p);
            }
            None => {
                self.seed_sum += true_range;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }

        self.prev_close = Some(close);
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}
