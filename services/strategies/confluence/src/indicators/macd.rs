//! MACD confirmation voter.

use crate::signals::Vote;

use super::EmaState;

/// Incremental MACD: fast and slow EMAs over closes, a signal EMA over the
/// MACD line itself.
///
/// The MACD line only exists once the slow EMA is seeded, and the signal EMA
/// is fed exclusively from those valid MACD values with its own SMA seed —
/// so the voter becomes ready after `slow + signal - 1` closes.
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    macd: Option<f64>,
}

impl MacdState {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
            signal: EmaState::new(signal_period),
            macd: None,
        }
    }

    /// Feed one close. Returns `(macd, signal)` once both lines exist.
    pub fn update(&mut self, close: f64) -> Option<(f64, f64)> {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        if let (Some(fast), Some(slow)) = (fast, slow) {
            let macd = fast - slow;
            self.macd = Some(macd);
            self.signal.update(macd);
        }
        self.lines()
    }

    fn lines(&self) -> Option<(f64, f64)> {
        match (self.macd, self.signal.value()) {
            (Some(macd), Some(signal)) => Some((macd, signal)),
            _ => None,
        }
    }

    pub fn macd_value(&self) -> Option<f64> {
        self.macd
    }

    pub fn signal_value(&self) -> Option<f64> {
        self.signal.value()
    }

    pub fn histogram(&self) -> Option<f64> {
        self.lines().map(|(macd, signal)| macd - signal)
    }

    pub fn is_ready(&self) -> bool {
        self.lines().is_some()
    }

    pub fn vote(&self) -> Vote {
        match self.lines() {
            Some((macd, signal)) if macd > signal => Vote::Long,
            Some((macd, signal)) if macd < signal => Vote::Short,
            _ => Vote::Neutral,
        }
    }
}
