//! Per-symbol position lifecycle and cooldown state.
//!
//! The engine owns one `PositionState` per symbol. Signal emission moves it
//! to `Pending`; only execution-side confirmations move it onward, so the
//! engine never books a fill the exchange did not report.

use chrono::{DateTime, Utc};

use types::Direction;

/// NoPosition -> Pending -> Open -> NoPosition, with Pending -> NoPosition
/// when execution rejects the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionPhase {
    #[default]
    NoPosition,
    /// Signal emitted, fill confirmation outstanding.
    Pending { direction: Direction },
    /// Fill confirmed by the execution side.
    Open { direction: Direction },
}

#[derive(Debug, Clone, Default)]
pub struct PositionState {
    pub phase: PositionPhase,
    pub last_signal_time: Option<DateTime<Utc>>,
}

impl PositionState {
    /// Seconds of cooldown left at `now`, or `None` when a new signal is
    /// allowed. A symbol that has never signalled is always allowed.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown_seconds: i64) -> Option<i64> {
        let last = self.last_signal_time?;
        let elapsed = (now - last).num_seconds();
        if elapsed < cooldown_seconds {
            Some(cooldown_seconds - elapsed)
        } else {
            None
        }
    }

    /// Book a successful emission: starts the cooldown clock and marks the
    /// direction pending. Called only after every gate has passed.
    pub fn record_signal(&mut self, direction: Direction, now: DateTime<Utc>) {
        self.phase = PositionPhase::Pending { direction };
        self.last_signal_time = Some(now);
    }

    /// Execution confirmed a fill. Returns the phase it replaced so the
    /// caller can flag an out-of-order confirmation.
    pub fn confirm_opened(&mut self, direction: Direction) -> PositionPhase {
        std::mem::replace(&mut self.phase, PositionPhase::Open { direction })
    }

    /// Execution confirmed the position is closed.
    pub fn confirm_closed(&mut self) -> PositionPhase {
        std::mem::replace(&mut self.phase, PositionPhase::NoPosition)
    }

    /// Execution rejected the order. The cooldown stays burned — the signal
    /// was emitted even though nothing filled.
    pub fn clear_pending(&mut self) -> PositionPhase {
        std::mem::replace(&mut self.phase, PositionPhase::NoPosition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_fresh_symbol_has_no_cooldown() {
        let state = PositionState::default();
        assert_eq!(state.phase, PositionPhase::NoPosition);
        assert_eq!(state.cooldown_remaining(at(0), 300), None);
    }

    #[test]
    fn test_cooldown_counts_down_and_expires() {
        let mut state = PositionState::default();
        state.record_signal(Direction::Long, at(0));

        assert_eq!(state.cooldown_remaining(at(0), 300), Some(300));
        assert_eq!(state.cooldown_remaining(at(299), 300), Some(1));
        assert_eq!(state.cooldown_remaining(at(300), 300), None);
        assert_eq!(state.cooldown_remaining(at(10_000), 300), None);
    }

    #[test]
    fn test_signal_marks_direction_pending() {
        let mut state = PositionState::default();
        state.record_signal(Direction::Short, at(5));
        assert_eq!(
            state.phase,
            PositionPhase::Pending {
                direction: Direction::Short
            }
        );
        assert_eq!(state.last_signal_time, Some(at(5)));
    }

    #[test]
    fn test_full_lifecycle_round_trip() {
        let mut state = PositionState::default();
        state.record_signal(Direction::Long, at(0));

        let prev = state.confirm_opened(Direction::Long);
        assert_eq!(
            prev,
            PositionPhase::Pending {
                direction: Direction::Long
            }
        );
        assert_eq!(
            state.phase,
            PositionPhase::Open {
                direction: Direction::Long
            }
        );

        let prev = state.confirm_closed();
        assert_eq!(
            prev,
            PositionPhase::Open {
                direction: Direction::Long
            }
        );
        assert_eq!(state.phase, PositionPhase::NoPosition);
    }

    #[test]
    fn test_rejection_clears_pending_but_keeps_cooldown() {
        let mut state = PositionState::default();
        state.record_signal(Direction::Long, at(0));
        state.clear_pending();

        assert_eq!(state.phase, PositionPhase::NoPosition);
        assert_eq!(state.cooldown_remaining(at(100), 300), Some(200));
    }
}
