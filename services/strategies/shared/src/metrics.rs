//! Strategy metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe metrics collector for strategy services.
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    candles_processed: AtomicU64,
    tickers_processed: AtomicU64,
    evaluations: AtomicU64,
    signals_generated: AtomicU64,
    trades_executed: AtomicU64,
    trades_rejected: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            candles_processed: AtomicU64::new(0),
            tickers_processed: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            signals_generated: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            trades_rejected: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn increment_candles(&self) {
        self.candles_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_tickers(&self) {
        self.tickers_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_evaluations(&self) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals(&self) {
        self.signals_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_trades(&self) {
        self.trades_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejects(&self) {
        self.trades_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> super::StrategyMetrics {
        super::StrategyMetrics {
            candles_processed: self.candles_processed.load(Ordering::Relaxed),
            tickers_processed: self.tickers_processed.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            signals_generated: self.signals_generated.load(Ordering::Relaxed),
            trades_executed: self.trades_executed.load(Ordering::Relaxed),
            trades_rejected: self.trades_rejected.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let collector = MetricsCollector::new();
        collector.increment_candles();
        collector.increment_candles();
        collector.increment_signals();
        collector.increment_rejects();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.candles_processed, 2);
        assert_eq!(metrics.signals_generated, 1);
        assert_eq!(metrics.trades_rejected, 1);
        assert_eq!(metrics.trades_executed, 0);
    }
}
