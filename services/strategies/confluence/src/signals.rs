//! Signal and vote definitions shared across the scoring and gating layers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::Direction;

/// Directional lean of a single indicator.
///
/// A closed vocabulary so the scorer can match exhaustively; `Neutral` covers
/// both a genuine no-lean reading and an indicator still warming up (the
/// scorer distinguishes the two through the readiness flags it is handed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Long,
    Short,
    Neutral,
}

impl Vote {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Vote::Long => Some(Direction::Long),
            Vote::Short => Some(Direction::Short),
            Vote::Neutral => None,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::Long => write!(f, "LONG"),
            Vote::Short => write!(f, "SHORT"),
            Vote::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// The five votes feeding the confluence score, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSet {
    pub trend: Vote,
    pub momentum: Vote,
    pub confirmation: Vote,
    pub open_interest: Vote,
    pub funding: Vote,
}

impl VoteSet {
    pub fn all_neutral() -> Self {
        Self {
            trend: Vote::Neutral,
            momentum: Vote::Neutral,
            confirmation: Vote::Neutral,
            open_interest: Vote::Neutral,
            funding: Vote::Neutral,
        }
    }

    pub fn as_array(&self) -> [Vote; 5] {
        [
            self.trend,
            self.momentum,
            self.confirmation,
            self.open_interest,
            self.funding,
        ]
    }
}

/// Outcome of fusing the current votes for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceResult {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub votes: VoteSet,
    pub long_score: u8,
    pub short_score: u8,
    /// max(long_score, short_score), 0..=100.
    pub total_score: u8,
    /// Votes agreeing with the dominant direction, 0..=5.
    pub aligned_count: u8,
    /// None when the sides tie (including 0-0): no direction asserted.
    pub dominant_direction: Option<Direction>,
}

/// An actionable, risk-bounded trade intent.
///
/// Only produced when every gate passes; a neutral evaluation produces no
/// signal object at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub signal_id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub requested_quantity: Decimal,
    pub position_value: Decimal,
    pub leverage: u32,
    pub score: u8,
    pub aligned_count: u8,
    /// Human-readable vote summary ("EMA↑, RSI oversold, MACD↑, OI↑").
    pub reason: String,
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} | SL {} | TP {} | qty {} | {}% ({}/5) | {}",
            self.direction,
            self.symbol,
            self.entry_price,
            self.stop_loss,
            self.take_profit,
            self.requested_quantity,
            self.score,
            self.aligned_count,
            self.reason
        )
    }
}

/// Why an evaluation produced no signal.
///
/// None of these are errors: abstention and gating are normal outcomes, and
/// the strategy surfaces them at debug level only.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Not enough confirmed candles for any voting indicator yet.
    WarmupIncomplete,
    /// Gates passed but the volatility gauge has no value to size with.
    VolatilityWarmup,
    ConfluenceTooLow { long_score: u8, short_score: u8 },
    /// Scores tied at or above threshold: no direction asserted.
    TiedVotes { score: u8 },
    CooldownActive { remaining_secs: i64 },
    /// A prior signal is awaiting execution confirmation; decision in flight.
    DecisionPending,
    /// An open position blocks this signal (same direction, or reversal
    /// disabled).
    PositionOpen { direction: Direction },
    /// Computed quantity or value below the exchange minimum.
    SizingRejected { detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WarmupIncomplete => write!(f, "indicators warming up"),
            SkipReason::VolatilityWarmup => write!(f, "volatility gauge warming up"),
            SkipReason::ConfluenceTooLow {
                long_score,
                short_score,
            } => write!(f, "confluence too low (L:{}% S:{}%)", long_score, short_score),
            SkipReason::TiedVotes { score } => write!(f, "tied votes at {}%", score),
            SkipReason::CooldownActive { remaining_secs } => {
                write!(f, "cooldown active ({}s remaining)", remaining_secs)
            }
            SkipReason::DecisionPending => write!(f, "decision already in flight"),
            SkipReason::PositionOpen { direction } => {
                write!(f, "{} position already open", direction)
            }
            SkipReason::SizingRejected { detail } => write!(f, "sizing rejected: {}", detail),
        }
    }
}

/// Result of evaluating one symbol after a confirmed candle.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Signal(TradeSignal),
    Skipped(SkipReason),
}

impl Evaluation {
    pub fn signal(&self) -> Option<&TradeSignal> {
        match self {
            Evaluation::Signal(s) => Some(s),
            Evaluation::Skipped(_) => None,
        }
    }
}

/// Signal generation statistics, shared behind a lock with the strategy.
#[derive(Debug, Default, Clone)]
pub struct SignalStats {
    pub total_signals: u64,
    pub long_signals: u64,
    pub short_signals: u64,
    pub sizing_rejections: u64,
    pub avg_score: f64,
    pub last_signal_at: Option<DateTime<Utc>>,
}

impl SignalStats {
    /// Update stats with a newly generated signal.
    pub fn record_signal(&mut self, signal: &TradeSignal) {
        self.total_signals += 1;

        match signal.direction {
            Direction::Long => self.long_signals += 1,
            Direction::Short => self.short_signals += 1,
        }

        let total_score = self.avg_score * (self.total_signals - 1) as f64 + signal.score as f64;
        self.avg_score = total_score / self.total_signals as f64;

        self.last_signal_at = Some(signal.generated_at);
    }

    pub fn record_sizing_rejection(&mut self) {
        self.sizing_rejections += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_signal(direction: Direction, score: u8) -> TradeSignal {
        TradeSignal {
            signal_id: 1,
            symbol: "BTCUSDT".to_string(),
            direction,
            entry_price: dec!(50000),
            stop_loss: dec!(49000),
            take_profit: dec!(52000),
            requested_quantity: dec!(0.02),
            position_value: dec!(1000),
            leverage: 5,
            score,
            aligned_count: 4,
            reason: "EMA↑, RSI oversold, MACD↑, OI↑".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_vote_direction_mapping() {
        assert_eq!(Vote::Long.direction(), Some(Direction::Long));
        assert_eq!(Vote::Short.direction(), Some(Direction::Short));
        assert_eq!(Vote::Neutral.direction(), None);
    }

    #[test]
    fn test_signal_stats_rolling_average() {
        let mut stats = SignalStats::default();
        stats.record_signal(&sample_signal(Direction::Long, 80));
        stats.record_signal(&sample_signal(Direction::Short, 100));

        assert_eq!(stats.total_signals, 2);
        assert_eq!(stats.long_signals, 1);
        assert_eq!(stats.short_signals, 1);
        assert_eq!(stats.avg_score, 90.0);
        assert!(stats.last_signal_at.is_some());
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::ConfluenceTooLow {
            long_score: 40,
            short_score: 20,
        };
        assert_eq!(reason.to_string(), "confluence too low (L:40% S:20%)");

        let cooldown = SkipReason::CooldownActive { remaining_secs: 42 };
        assert_eq!(cooldown.to_string(), "cooldown active (42s remaining)");
    }
}
