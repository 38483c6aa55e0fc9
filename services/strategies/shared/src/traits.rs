//! Strategy traits and interfaces

use anyhow::Result;
use async_trait::async_trait;

/// Core lifecycle trait implemented by every strategy service.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name for identification
    fn name(&self) -> &'static str;

    /// Start the strategy event loop; returns when the input stream ends
    /// or the strategy is stopped.
    async fn start(&mut self) -> Result<()>;

    /// Stop the strategy
    async fn stop(&mut self) -> Result<()>;

    /// Get current strategy metrics
    fn metrics(&self) -> StrategyMetrics;
}

/// Counters every strategy reports, snapshotted from its collector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyMetrics {
    /// Confirmed candles ingested (including ones rejected as malformed).
    pub candles_processed: u64,
    /// Derivatives ticker updates applied.
    pub tickers_processed: u64,
    /// Confluence evaluations run (one per confirmed candle per symbol).
    pub evaluations: u64,
    pub signals_generated: u64,
    pub trades_executed: u64,
    /// Signals the execution seam rejected (sizing, balance, exchange).
    pub trades_rejected: u64,
    pub errors: u64,
}

/// Validation hook for strategy configuration types.
pub trait StrategyConfig: Send + Sync + Clone {
    /// Validate configuration, returning the first hard error found.
    fn validate(&self) -> Result<()>;
}
