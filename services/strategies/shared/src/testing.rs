//! Testing utilities for strategies

use crate::StrategyMetrics;
use types::Candle;

/// Mock strategy for exercising the lifecycle trait in tests.
pub struct MockStrategy {
    pub name: &'static str,
    pub started: bool,
    pub metrics: StrategyMetrics,
}

impl MockStrategy {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            started: false,
            metrics: StrategyMetrics::default(),
        }
    }
}

#[async_trait::async_trait]
impl crate::Strategy for MockStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        self.started = true;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.started = false;
        Ok(())
    }

    fn metrics(&self) -> StrategyMetrics {
        self.metrics.clone()
    }
}

/// Build a single confirmed candle with explicit OHLC.
pub fn confirmed_candle(
    symbol: &str,
    open_time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
) -> Candle {
    Candle {
        symbol: symbol.to_string(),
        open_time,
        open,
        high,
        low,
        close,
        volume: 1.0,
        turnover: close,
        confirmed: true,
    }
}

/// Build a series of confirmed zero-wick candles from a close sequence.
///
/// Each bar opens at the previous close (the first opens at its own close),
/// with high/low set to the bar body. Deterministic, suitable for feeding
/// indicator recurrences with hand-chosen close paths.
pub fn candle_series(symbol: &str, start_time: i64, interval_ms: i64, closes: &[f64]) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(closes.len());
    let mut prev_close = match closes.first() {
        Some(first) => *first,
        None => return candles,
    };

    for (i, &close) in closes.iter().enumerate() {
        let open = prev_close;
        candles.push(confirmed_candle(
            symbol,
            start_time + i as i64 * interval_ms,
            open,
            open.max(close),
            open.min(close),
            close,
        ));
        prev_close = close;
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;

    #[tokio::test]
    async fn test_mock_strategy_lifecycle() {
        let mut strategy = MockStrategy::new("mock");
        assert_eq!(strategy.name(), "mock");
        strategy.start().await.unwrap();
        assert!(strategy.started);
        strategy.stop().await.unwrap();
        assert!(!strategy.started);
    }

    #[test]
    fn test_candle_series_links_opens_to_closes() {
        let candles = candle_series("BTCUSDT", 0, 60_000, &[100.0, 102.0, 101.0]);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[1].open, 100.0);
        assert_eq!(candles[1].close, 102.0);
        assert_eq!(candles[2].open, 102.0);
        assert_eq!(candles[2].high, 102.0);
        assert_eq!(candles[2].low, 101.0);
        assert!(candles.iter().all(|c| c.confirmed));
        assert_eq!(candles[2].open_time, 120_000);
    }
}
