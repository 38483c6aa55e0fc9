//! Confluence strategy service.
//!
//! Consumes the market-event stream, drives the engine, and hands generated
//! signals to the execution seam. Execution results feed straight back into
//! the engine's position lifecycle so internal state always mirrors what the
//! execution side confirmed.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use confluence_strategy_shared::{MetricsCollector, Strategy, StrategyMetrics};
use types::{Candle, MarketEvent};

use crate::config::EngineConfig;
use crate::engine::ConfluenceEngine;
use crate::error::EngineError;
use crate::executor::ExecutionClient;
use crate::notifier::TelegramNotifier;
use crate::signals::{Evaluation, SignalStats, SkipReason, TradeSignal};

/// How many confirmed candles between per-symbol status lines.
const STATUS_EVERY: u64 = 20;

pub struct ConfluenceStrategy {
    engine: Arc<ConfluenceEngine>,
    executor: Arc<dyn ExecutionClient>,
    notifier: Arc<TelegramNotifier>,
    stats: Arc<RwLock<SignalStats>>,
    metrics: Arc<MetricsCollector>,
    events: Option<mpsc::Receiver<MarketEvent>>,
    shutdown: Arc<Notify>,
}

impl ConfluenceStrategy {
    pub fn new(
        config: EngineConfig,
        events: mpsc::Receiver<MarketEvent>,
        executor: Arc<dyn ExecutionClient>,
        notifier: Arc<TelegramNotifier>,
    ) -> crate::error::Result<Self> {
        use confluence_strategy_shared::StrategyConfig as _;
        config
            .validate()
            .map_err(|e| EngineError::Configuration {
                message: e.to_string(),
            })?;

        Ok(Self {
            engine: Arc::new(ConfluenceEngine::new(config)?),
            executor,
            notifier,
            stats: Arc::new(RwLock::new(SignalStats::default())),
            metrics: Arc::new(MetricsCollector::new()),
            events: Some(events),
            shutdown: Arc::new(Notify::new()),
        })
    }

    pub fn engine(&self) -> Arc<ConfluenceEngine> {
        Arc::clone(&self.engine)
    }

    pub fn stats(&self) -> SignalStats {
        self.stats.read().clone()
    }

    /// Handle for requesting shutdown from outside the running task.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    async fn handle_event(&self, event: MarketEvent) -> crate::error::Result<()> {
        match event {
            MarketEvent::Candle(candle) => self.handle_candle(candle).await,
            MarketEvent::Ticker(ticker) => {
                self.engine.apply_ticker(&ticker);
                self.metrics.increment_tickers();
                Ok(())
            }
        }
    }

    async fn handle_candle(&self, candle: Candle) -> crate::error::Result<()> {
        if !candle.confirmed {
            return Ok(());
        }

        let balance = match self.executor.balance().await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(symbol = %candle.symbol, "balance unavailable, skipping evaluation: {e}");
                self.metrics.increment_errors();
                return Ok(());
            }
        };

        self.metrics.increment_candles();
        match self.engine.process_candle(&candle, balance, Utc::now()) {
            Ok(Some(evaluation)) => {
                self.metrics.increment_evaluations();
                match evaluation {
                    Evaluation::Signal(signal) => self.dispatch_signal(signal).await,
                    Evaluation::Skipped(SkipReason::SizingRejected { .. }) => {
                        self.stats.write().record_sizing_rejection();
                    }
                    Evaluation::Skipped(reason) => {
                        debug!(symbol = %candle.symbol, "no signal: {reason}");
                    }
                }
                self.log_status(&candle.symbol);
                Ok(())
            }
            Ok(None) => Ok(()),
            // Malformed candles are a recoverable skip; anything else means
            // per-symbol state can no longer be trusted.
            Err(EngineError::MalformedCandle { symbol, detail }) => {
                warn!(%symbol, "candle rejected: {detail}");
                self.metrics.increment_errors();
                Ok(())
            }
            Err(fatal) => Err(fatal),
        }
    }

    async fn dispatch_signal(&self, signal: TradeSignal) {
        self.metrics.increment_signals();
        self.stats.write().record_signal(&signal);
        if let Some(r) = self.engine.indicator_readout(&signal.symbol) {
            debug!(
                "{} at signal | EMA {}/{} | RSI {} | MACD hist {} | ATR {} | OI z {:.2} | funding {:.4}%",
                r.symbol,
                fmt_opt(r.ema_fast, 2),
                fmt_opt(r.ema_slow, 2),
                fmt_opt(r.rsi, 1),
                fmt_opt(r.macd_histogram, 4),
                fmt_opt(r.atr, 4),
                r.oi_zscore,
                r.funding_annualized_pct,
            );
        }
        self.notifier.notify_signal(&signal).await;

        match self.executor.execute(&signal).await {
            Ok(result) if result.accepted => {
                self.engine
                    .on_position_opened(&signal.symbol, signal.direction);
                self.metrics.increment_trades();
                self.notifier.notify_executed(&signal, &result).await;
            }
            Ok(result) => {
                let reason = result
                    .error
                    .unwrap_or_else(|| "execution rejected".to_string());
                warn!(symbol = %signal.symbol, "trade rejected: {reason}");
                self.engine.on_execution_rejected(&signal.symbol);
                self.metrics.increment_rejects();
                self.notifier.notify_failed(&signal, &reason).await;
            }
            Err(e) => {
                warn!(symbol = %signal.symbol, "trade execution failed: {e}");
                self.engine.on_execution_rejected(&signal.symbol);
                self.metrics.increment_rejects();
                self.notifier.notify_failed(&signal, &e.to_string()).await;
            }
        }
    }

    fn log_status(&self, symbol: &str) {
        let Some(readout) = self.engine.indicator_readout(symbol) else {
            return;
        };
        if readout.candles_seen % STATUS_EVERY != 0 {
            return;
        }
        info!(
            "📊 {} | candles {} | ready {}/5 | RSI {} | ATR {} | OI z {:.2} | funding {:.4}% | {:?}",
            readout.symbol,
            readout.candles_seen,
            readout.ready_voters,
            fmt_opt(readout.rsi, 1),
            fmt_opt(readout.atr, 4),
            readout.oi_zscore,
            readout.funding_annualized_pct,
            readout.phase,
        );
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

#[async_trait::async_trait]
impl Strategy for ConfluenceStrategy {
    fn name(&self) -> &'static str {
        "confluence"
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        let mut events = self
            .events
            .take()
            .ok_or_else(|| anyhow::anyhow!("strategy already started"))?;

        info!("🚀 confluence strategy started, waiting for market data");

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("shutdown requested");
                    break;
                }
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            if let Err(e) = self.handle_event(event).await {
                                error!("fatal engine error: {e}");
                                self.notifier.notify_shutdown().await;
                                return Err(e.into());
                            }
                        }
                        None => {
                            info!("market data stream ended");
                            break;
                        }
                    }
                }
            }
        }

        let metrics = self.metrics.get_metrics();
        info!(
            "confluence strategy stopping | candles {} | signals {} | trades {} | rejected {}",
            metrics.candles_processed,
            metrics.signals_generated,
            metrics.trades_executed,
            metrics.trades_rejected
        );
        self.notifier.notify_shutdown().await;
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.shutdown.notify_one();
        Ok(())
    }

    fn metrics(&self) -> StrategyMetrics {
        self.metrics.get_metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelegramSettings;
    use crate::executor::PaperExecutor;
    use confluence_strategy_shared::testing::confirmed_candle;
    use rust_decimal_macros::dec;
    use types::TickerUpdate;

    fn fast_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.indicators.ema_fast = 2;
        config.indicators.ema_slow = 3;
        config.indicators.rsi_period = 2;
        config.indicators.macd_fast = 2;
        config.indicators.macd_slow = 3;
        config.indicators.macd_signal = 2;
        config.indicators.atr_period = 2;
        config.derivatives.oi_lookback = 3;
        config.derivatives.funding_lookback = 5;
        config.derivatives.funding_min_samples = 2;
        config
    }

    fn build(
        config: EngineConfig,
    ) -> (ConfluenceStrategy, mpsc::Sender<MarketEvent>, Arc<PaperExecutor>) {
        let (tx, rx) = mpsc::channel(64);
        let executor = Arc::new(PaperExecutor::new(dec!(10000)));
        let notifier = Arc::new(TelegramNotifier::new(TelegramSettings::default()));
        let strategy =
            ConfluenceStrategy::new(config, rx, executor.clone(), notifier).unwrap();
        (strategy, tx, executor)
    }

    fn ramp_close(i: i64) -> f64 {
        100.0 + i as f64 + 0.25 * (i as f64).powi(2)
    }

    fn ramp_candle(i: i64) -> Candle {
        let close = ramp_close(i);
        let open = if i == 0 { close - 1.0 } else { ramp_close(i - 1) };
        confirmed_candle("BTCUSDT", i * 60_000, open, close + 0.5, open - 0.5, close)
    }

    fn ramp_ticker(i: i64) -> TickerUpdate {
        TickerUpdate {
            symbol: "BTCUSDT".to_string(),
            last_price: ramp_close(i),
            mark_price: ramp_close(i),
            funding_rate: 0.0001,
            next_funding_time: 0,
            open_interest: 1000.0 + 10.0 * i as f64,
            timestamp: i * 60_000,
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (_tx, rx) = mpsc::channel(4);
        let mut config = EngineConfig::default();
        config.risk.leverage = 0;
        let executor = Arc::new(PaperExecutor::new(dec!(1000)));
        let notifier = Arc::new(TelegramNotifier::new(TelegramSettings::default()));
        assert!(ConfluenceStrategy::new(config, rx, executor, notifier).is_err());
    }

    #[tokio::test]
    async fn test_stream_end_stops_strategy() {
        let (mut strategy, tx, _executor) = build(fast_config());
        drop(tx);
        assert!(strategy.start().await.is_ok());
    }

    #[tokio::test]
    async fn test_uptrend_stream_produces_one_executed_trade() {
        let (strategy, tx, executor) = build(fast_config());
        let handle = tokio::spawn(async move {
            let mut strategy = strategy;
            let result = strategy.start().await;
            (strategy, result)
        });

        for i in 0..10 {
            tx.send(MarketEvent::Ticker(ramp_ticker(i))).await.unwrap();
            tx.send(MarketEvent::Candle(ramp_candle(i))).await.unwrap();
        }
        drop(tx);

        let (strategy, result) = handle.await.unwrap();
        assert!(result.is_ok());

        let metrics = strategy.metrics();
        assert_eq!(metrics.candles_processed, 10);
        assert_eq!(metrics.tickers_processed, 10);
        assert_eq!(metrics.signals_generated, 1);
        assert_eq!(metrics.trades_executed, 1);
        assert_eq!(metrics.trades_rejected, 0);
        assert_eq!(executor.fills(), 1);
        assert_eq!(strategy.stats().total_signals, 1);
        assert_eq!(strategy.stats().long_signals, 1);
    }

    #[tokio::test]
    async fn test_shutdown_handle_stops_running_strategy() {
        let (strategy, tx, _executor) = build(fast_config());
        let shutdown = strategy.shutdown_handle();
        let handle = tokio::spawn(async move {
            let mut strategy = strategy;
            strategy.start().await
        });

        tx.send(MarketEvent::Ticker(ramp_ticker(0))).await.unwrap();
        shutdown.notify_one();
        assert!(handle.await.unwrap().is_ok());
        // Sender still alive: shutdown, not stream end, stopped the loop.
        drop(tx);
    }

    #[tokio::test]
    async fn test_malformed_candle_is_counted_not_fatal() {
        let (strategy, tx, _executor) = build(fast_config());
        let handle = tokio::spawn(async move {
            let mut strategy = strategy;
            let result = strategy.start().await;
            (strategy, result)
        });

        let mut bad = ramp_candle(0);
        bad.low = bad.high + 5.0;
        tx.send(MarketEvent::Candle(bad)).await.unwrap();
        tx.send(MarketEvent::Candle(ramp_candle(1))).await.unwrap();
        drop(tx);

        let (strategy, result) = handle.await.unwrap();
        assert!(result.is_ok());
        let metrics = strategy.metrics();
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.candles_processed, 2);
        assert_eq!(metrics.evaluations, 1);
    }
}
