//! Candle, ticker, and direction types shared across services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The opposing direction, used by reversal-policy checks.
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A single OHLCV bar for one symbol and interval.
///
/// `confirmed` is true once the bar's time window has fully elapsed. Only
/// confirmed candles may mutate indicator state; unconfirmed bars repaint
/// until the window closes and are for display/last-price use only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    /// Bar open time, milliseconds since the Unix epoch.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Quote-currency turnover over the bar.
    pub turnover: f64,
    pub confirmed: bool,
}

impl Candle {
    /// Price-field sanity: all prices positive and high/low actually bound
    /// the bar. Timestamp monotonicity is checked by the consumer, which
    /// knows the previous bar.
    pub fn has_valid_prices(&self) -> bool {
        self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.high >= self.low
            && self.high >= self.open.min(self.close)
            && self.low <= self.open.max(self.close)
    }
}

/// Snapshot of a symbol's derivatives ticker state.
///
/// Exchange ticker streams are delta-encoded; adapters merge deltas onto the
/// last full snapshot and always emit a complete record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerUpdate {
    pub symbol: String,
    pub last_price: f64,
    pub mark_price: f64,
    /// Current funding rate as a raw per-period fraction (e.g. 0.0001).
    pub funding_rate: f64,
    /// Next funding settlement, milliseconds since the Unix epoch.
    pub next_funding_time: i64,
    /// Open interest in contracts.
    pub open_interest: f64,
    /// Exchange event time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Events flowing from a market-data adapter to strategy consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    Candle(Candle),
    Ticker(TickerUpdate),
}

impl MarketEvent {
    pub fn symbol(&self) -> &str {
        match self {
            MarketEvent::Candle(c) => &c.symbol,
            MarketEvent::Ticker(t) => &t.symbol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".to_string(),
            open_time: 1_700_000_000_000,
            open,
            high,
            low,
            close,
            volume: 10.0,
            turnover: 450_000.0,
            confirmed: true,
        }
    }

    #[test]
    fn test_valid_candle_prices() {
        assert!(candle(100.0, 105.0, 99.0, 103.0).has_valid_prices());
        assert!(candle(100.0, 100.0, 100.0, 100.0).has_valid_prices());
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        assert!(!candle(0.0, 105.0, 99.0, 103.0).has_valid_prices());
        assert!(!candle(100.0, 105.0, -1.0, 103.0).has_valid_prices());
    }

    #[test]
    fn test_rejects_inverted_range() {
        // High below low can't describe a real bar.
        assert!(!candle(100.0, 99.0, 105.0, 103.0).has_valid_prices());
        // High below the bar body.
        assert!(!candle(100.0, 101.0, 99.0, 102.0).has_valid_prices());
    }

    #[test]
    fn test_direction_display_and_opposite() {
        assert_eq!(Direction::Long.to_string(), "LONG");
        assert_eq!(Direction::Short.to_string(), "SHORT");
        assert_eq!(Direction::Long.opposite(), Direction::Short);
        assert_eq!(Direction::Short.opposite(), Direction::Long);
    }

    #[test]
    fn test_market_event_symbol() {
        let event = MarketEvent::Candle(candle(100.0, 105.0, 99.0, 103.0));
        assert_eq!(event.symbol(), "BTCUSDT");
    }

    #[test]
    fn test_candle_serde_round_trip() {
        let c = candle(100.0, 105.0, 99.0, 103.0);
        let json = serde_json::to_string(&c).unwrap();
        let back: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
