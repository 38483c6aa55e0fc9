//! Per-symbol confluence engine.
//!
//! Owns every piece of mutable per-symbol state: the five voting indicators,
//! the volatility gauge, the derivatives windows and the position lifecycle.
//! Each symbol lives in one `DashMap` slot and every update runs start to
//! finish under that slot's exclusive guard, so an evaluation always sees a
//! consistent snapshot and symbols never contend with each other.
//!
//! Candle flow: a confirmed candle mutates indicator state and immediately
//! evaluates the gates; unconfirmed candles are ignored outright, which is
//! what keeps the no-lookahead guarantee. Ticker flow only feeds the
//! derivatives windows — evaluation happens exclusively on candle close.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use types::{Candle, Direction, TickerUpdate};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::indicators::{AtrState, MacdState, RsiState, TrendState};
use crate::market_data::{FundingTracker, OpenInterestTracker};
use crate::positions::{PositionPhase, PositionState};
use crate::risk::{plan_order, RiskParams};
use crate::scoring::score_votes;
use crate::signals::{ConfluenceResult, Evaluation, SkipReason, TradeSignal, Vote, VoteSet};

/// All mutable state for one symbol. Accessed only through the engine's
/// per-symbol map guard.
struct SymbolState {
    trend: TrendState,
    momentum: RsiState,
    confirmation: MacdState,
    volatility: AtrState,
    open_interest: OpenInterestTracker,
    funding: FundingTracker,
    position: PositionState,
    last_candle_time: Option<i64>,
    last_close: Option<f64>,
    last_result: Option<ConfluenceResult>,
    candles_seen: u64,
    tickers_seen: u64,
}

impl SymbolState {
    fn new(config: &EngineConfig) -> Self {
        let i = &config.indicators;
        let d = &config.derivatives;
        Self {
            trend: TrendState::new(i.ema_fast, i.ema_slow),
            momentum: RsiState::new(i.rsi_period, i.rsi_oversold, i.rsi_overbought),
            confirmation: MacdState::new(i.macd_fast, i.macd_slow, i.macd_signal),
            volatility: AtrState::new(i.atr_period),
            open_interest: OpenInterestTracker::new(
                d.oi_lookback,
                d.oi_zscore_threshold,
                d.oi_extreme_threshold,
            ),
            funding: FundingTracker::new(
                d.funding_lookback,
                d.funding_min_samples,
                d.funding_extreme_zscore,
                d.funding_extreme_rate,
            ),
            position: PositionState::default(),
            last_candle_time: None,
            last_close: None,
            last_result: None,
            candles_seen: 0,
            tickers_seen: 0,
        }
    }

    fn apply_candle(&mut self, candle: &Candle) {
        self.trend.update(candle.close);
        self.momentum.update(candle.close);
        self.confirmation.update(candle.close);
        self.volatility.update(candle.high, candle.low, candle.close);
        self.last_candle_time = Some(candle.open_time);
        self.last_close = Some(candle.close);
        self.candles_seen += 1;
    }

    fn votes(&self) -> VoteSet {
        VoteSet {
            trend: self.trend.vote(),
            momentum: self.momentum.vote(),
            confirmation: self.confirmation.vote(),
            open_interest: self.open_interest.vote(),
            funding: self.funding.vote(),
        }
    }

    fn ready_voters(&self) -> u8 {
        [
            self.trend.is_ready(),
            self.momentum.is_ready(),
            self.confirmation.is_ready(),
            self.open_interest.is_ready(),
            self.funding.is_ready(),
        ]
        .iter()
        .filter(|ready| **ready)
        .count() as u8
    }
}

/// Point-in-time view of one symbol's indicator and position state, for
/// status logging and alerting.
#[derive(Debug, Clone)]
pub struct IndicatorReadout {
    pub symbol: String,
    pub candles_seen: u64,
    pub tickers_seen: u64,
    pub ready_voters: u8,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub atr: Option<f64>,
    pub oi_zscore: f64,
    pub oi_extreme: bool,
    pub funding_rate: Option<f64>,
    pub funding_annualized_pct: f64,
    pub phase: PositionPhase,
    pub last_score: Option<u8>,
}

/// The confluence engine: shared, thread-safe, symbol-keyed.
pub struct ConfluenceEngine {
    config: EngineConfig,
    risk: RiskParams,
    symbols: DashMap<String, SymbolState>,
    signal_seq: AtomicU64,
}

impl ConfluenceEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let risk = RiskParams::from_settings(&config.risk)?;
        Ok(Self {
            config,
            risk,
            symbols: DashMap::new(),
            signal_seq: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ingest one candle. Unconfirmed candles are ignored; confirmed candles
    /// mutate indicator state and run a full gate evaluation, all under the
    /// symbol's exclusive guard.
    ///
    /// Malformed candles (bad prices, stale or repeated timestamps) come back
    /// as a recoverable error and leave the symbol's state untouched.
    pub fn process_candle(
        &self,
        candle: &Candle,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<Evaluation>> {
        if !candle.confirmed {
            return Ok(None);
        }
        if !candle.has_valid_prices() {
            return Err(EngineError::MalformedCandle {
                symbol: candle.symbol.clone(),
                detail: format!(
                    "invalid prices o={} h={} l={} c={}",
                    candle.open, candle.high, candle.low, candle.close
                ),
            });
        }

        let mut entry = self
            .symbols
            .entry(candle.symbol.clone())
            .or_insert_with(|| SymbolState::new(&self.config));
        let state = entry.value_mut();

        if let Some(last) = state.last_candle_time {
            if candle.open_time <= last {
                return Err(EngineError::MalformedCandle {
                    symbol: candle.symbol.clone(),
                    detail: format!(
                        "non-monotonic open_time {} after {}",
                        candle.open_time, last
                    ),
                });
            }
        }

        state.apply_candle(candle);

        let result = score_votes(&candle.symbol, now, state.votes());
        debug!(
            symbol = %candle.symbol,
            long = result.long_score,
            short = result.short_score,
            aligned = result.aligned_count,
            ready = state.ready_voters(),
            "confluence evaluated"
        );

        let evaluation = self.generate(state, &result, balance, now)?;
        state.last_result = Some(result);
        Ok(Some(evaluation))
    }

    /// Feed a ticker into the symbol's derivatives windows. Tickers with no
    /// price yet (partial snapshots) are dropped whole; zero open interest is
    /// dropped so an exchange gap cannot poison the window statistics.
    pub fn apply_ticker(&self, ticker: &TickerUpdate) {
        if ticker.last_price <= 0.0 {
            return;
        }
        let mut entry = self
            .symbols
            .entry(ticker.symbol.clone())
            .or_insert_with(|| SymbolState::new(&self.config));
        let state = entry.value_mut();

        if ticker.open_interest > 0.0 {
            state
                .open_interest
                .update(ticker.open_interest, ticker.last_price);
        }
        state.funding.update(ticker.funding_rate);
        state.tickers_seen += 1;
    }

    /// Run the gating ladder for one scored evaluation. First failing gate
    /// wins; position state mutates only when every gate has passed and the
    /// order plan sized successfully.
    fn generate(
        &self,
        state: &mut SymbolState,
        result: &ConfluenceResult,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        if state.ready_voters() == 0 {
            return Ok(Evaluation::Skipped(SkipReason::WarmupIncomplete));
        }

        let gates = &self.config.engine;
        if result.total_score < gates.min_confluence_score
            || result.aligned_count < gates.min_indicators_aligned
        {
            return Ok(Evaluation::Skipped(SkipReason::ConfluenceTooLow {
                long_score: result.long_score,
                short_score: result.short_score,
            }));
        }

        let Some(direction) = result.dominant_direction else {
            return Ok(Evaluation::Skipped(SkipReason::TiedVotes {
                score: result.total_score,
            }));
        };

        if let Some(remaining_secs) = state
            .position
            .cooldown_remaining(now, gates.cooldown_seconds)
        {
            return Ok(Evaluation::Skipped(SkipReason::CooldownActive {
                remaining_secs,
            }));
        }

        match state.position.phase {
            PositionPhase::Pending { .. } => {
                return Ok(Evaluation::Skipped(SkipReason::DecisionPending));
            }
            PositionPhase::Open {
                direction: open_direction,
            } => {
                if open_direction == direction || !self.config.risk.allow_reversal {
                    return Ok(Evaluation::Skipped(SkipReason::PositionOpen {
                        direction: open_direction,
                    }));
                }
            }
            PositionPhase::NoPosition => {}
        }

        let Some(atr) = state.volatility.value() else {
            return Ok(Evaluation::Skipped(SkipReason::VolatilityWarmup));
        };
        if !atr.is_finite() || atr < 0.0 {
            // Corrupt volatility state means upstream data the engine cannot
            // reason about; refuse to trade on it.
            return Err(EngineError::InvariantViolation {
                message: format!("ATR {atr} for {} is not a usable range", result.symbol),
            });
        }
        let Some(close) = state.last_close else {
            return Ok(Evaluation::Skipped(SkipReason::WarmupIncomplete));
        };

        let entry_price = decimal_from(close, "close", &result.symbol)?;
        let atr_value = decimal_from(atr, "atr", &result.symbol)?;

        let plan = match plan_order(direction, entry_price, atr_value, balance, &self.risk) {
            Ok(plan) => plan,
            Err(skip) => {
                info!(symbol = %result.symbol, "signal dropped: {skip}");
                return Ok(Evaluation::Skipped(skip));
            }
        };

        let signal_id = self.signal_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let signal = TradeSignal {
            signal_id,
            symbol: result.symbol.clone(),
            direction,
            entry_price: plan.entry_price,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            requested_quantity: plan.quantity,
            position_value: plan.position_value,
            leverage: self.risk.leverage,
            score: result.total_score,
            aligned_count: result.aligned_count,
            reason: describe_votes(&result.votes, direction),
            generated_at: now,
        };

        state.position.record_signal(direction, now);
        info!(symbol = %signal.symbol, "🎯 {signal}");
        Ok(Evaluation::Signal(signal))
    }

    /// Execution confirmed a fill for this symbol.
    pub fn on_position_opened(&self, symbol: &str, direction: Direction) {
        let Some(mut state) = self.symbols.get_mut(symbol) else {
            warn!(symbol, "fill confirmation for untracked symbol");
            return;
        };
        let prev = state.position.confirm_opened(direction);
        match prev {
            PositionPhase::Pending {
                direction: pending,
            } if pending == direction => {
                info!(symbol, %direction, "📈 position open");
            }
            other => {
                warn!(symbol, %direction, ?other, "fill confirmation arrived in unexpected phase");
            }
        }
    }

    /// Execution confirmed this symbol's position is closed.
    pub fn on_position_closed(&self, symbol: &str) {
        let Some(mut state) = self.symbols.get_mut(symbol) else {
            warn!(symbol, "close confirmation for untracked symbol");
            return;
        };
        let prev = state.position.confirm_closed();
        match prev {
            PositionPhase::Open { direction } => {
                info!(symbol, %direction, "🏁 position closed");
            }
            other => {
                warn!(symbol, ?other, "close confirmation arrived in unexpected phase");
            }
        }
    }

    /// Execution rejected the pending order; the cooldown stays burned.
    pub fn on_execution_rejected(&self, symbol: &str) {
        let Some(mut state) = self.symbols.get_mut(symbol) else {
            warn!(symbol, "rejection for untracked symbol");
            return;
        };
        let prev = state.position.clear_pending();
        match prev {
            PositionPhase::Pending { direction } => {
                info!(symbol, %direction, "↩️ pending order rejected, slot freed");
            }
            other => {
                warn!(symbol, ?other, "rejection arrived in unexpected phase");
            }
        }
    }

    pub fn indicator_readout(&self, symbol: &str) -> Option<IndicatorReadout> {
        let state = self.symbols.get(symbol)?;
        Some(IndicatorReadout {
            symbol: symbol.to_string(),
            candles_seen: state.candles_seen,
            tickers_seen: state.tickers_seen,
            ready_voters: state.ready_voters(),
            ema_fast: state.trend.fast_value(),
            ema_slow: state.trend.slow_value(),
            rsi: state.momentum.value(),
            macd_histogram: state.confirmation.histogram(),
            atr: state.volatility.value(),
            oi_zscore: state.open_interest.zscore(),
            oi_extreme: state.open_interest.is_extreme(),
            funding_rate: state.funding.latest_rate(),
            funding_annualized_pct: state.funding.annualized_pct(),
            phase: state.position.phase,
            last_score: state.last_result.as_ref().map(|r| r.total_score),
        })
    }

    pub fn last_result(&self, symbol: &str) -> Option<ConfluenceResult> {
        self.symbols
            .get(symbol)
            .and_then(|state| state.last_result.clone())
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        self.symbols.iter().map(|e| e.key().clone()).collect()
    }
}

fn decimal_from(value: f64, what: &str, symbol: &str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| EngineError::InvariantViolation {
        message: format!("{what} {value} for {symbol} is not representable as a decimal"),
    })
}

/// Compact vote summary for the signal's reason line, listing only voters
/// that agree with the chosen direction.
fn describe_votes(votes: &VoteSet, direction: Direction) -> String {
    let arrow = match direction {
        Direction::Long => "↑",
        Direction::Short => "↓",
    };
    let wanted = match direction {
        Direction::Long => Vote::Long,
        Direction::Short => Vote::Short,
    };

    let mut parts = Vec::new();
    if votes.trend == wanted {
        parts.push(format!("EMA{arrow}"));
    }
    if votes.momentum == wanted {
        parts.push(
            match direction {
                Direction::Long => "RSI oversold bounce",
                Direction::Short => "RSI overbought fade",
            }
            .to_string(),
        );
    }
    if votes.confirmation == wanted {
        parts.push(format!("MACD{arrow}"));
    }
    if votes.open_interest == wanted {
        parts.push(format!("OI building{arrow}"));
    }
    if votes.funding == wanted {
        parts.push(
            match direction {
                Direction::Long => "short-squeeze funding",
                Direction::Short => "long-squeeze funding",
            }
            .to_string(),
        );
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use confluence_strategy_shared::testing::confirmed_candle;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

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

    fn engine() -> ConfluenceEngine {
        ConfluenceEngine::new(fast_config()).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    /// Accelerating uptrend so the MACD line pulls away from its lagging
    /// signal; a perfectly linear ramp leaves the two equal.
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

    fn qualifying_result(direction: Direction) -> ConfluenceResult {
        let votes = match direction {
            Direction::Long => VoteSet {
                trend: Vote::Long,
                momentum: Vote::Neutral,
                confirmation: Vote::Long,
                open_interest: Vote::Long,
                funding: Vote::Neutral,
            },
            Direction::Short => VoteSet {
                trend: Vote::Short,
                momentum: Vote::Neutral,
                confirmation: Vote::Short,
                open_interest: Vote::Short,
                funding: Vote::Neutral,
            },
        };
        score_votes("BTCUSDT", at(0), votes)
    }

    /// Symbol state with warm volatility and a last close, for driving the
    /// gate ladder directly with synthetic scores.
    fn warm_state(config: &EngineConfig) -> SymbolState {
        let mut state = SymbolState::new(config);
        for i in 0..6 {
            state.apply_candle(&ramp_candle(i));
        }
        state
    }

    #[test]
    fn test_unconfirmed_candle_is_ignored() {
        let engine = engine();
        let mut candle = ramp_candle(0);
        candle.confirmed = false;
        let result = engine
            .process_candle(&candle, dec!(10000), at(0))
            .unwrap();
        assert!(result.is_none());
        assert!(engine.indicator_readout("BTCUSDT").is_none());
    }

    #[test]
    fn test_malformed_candle_is_rejected() {
        let engine = engine();
        let mut candle = ramp_candle(0);
        candle.high = candle.low - 1.0;
        let err = engine
            .process_candle(&candle, dec!(10000), at(0))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedCandle { .. }));
    }

    #[test]
    fn test_repeated_open_time_is_rejected_and_state_untouched() {
        let engine = engine();
        engine
            .process_candle(&ramp_candle(0), dec!(10000), at(0))
            .unwrap();
        let err = engine
            .process_candle(&ramp_candle(0), dec!(10000), at(60))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedCandle { .. }));
        assert_eq!(engine.indicator_readout("BTCUSDT").unwrap().candles_seen, 1);
    }

    #[test]
    fn test_first_candle_reports_warmup() {
        let engine = engine();
        let evaluation = engine
            .process_candle(&ramp_candle(0), dec!(10000), at(0))
            .unwrap()
            .unwrap();
        assert_eq!(
            evaluation,
            Evaluation::Skipped(SkipReason::WarmupIncomplete)
        );
    }

    #[test]
    fn test_score_below_sixty_never_passes() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        let mut result = qualifying_result(Direction::Long);
        result.long_score = 59;
        result.total_score = 59;

        let evaluation = engine
            .generate(&mut state, &result, dec!(10000), at(0))
            .unwrap();
        assert!(matches!(
            evaluation,
            Evaluation::Skipped(SkipReason::ConfluenceTooLow { .. })
        ));
    }

    #[test]
    fn test_alignment_below_three_never_passes() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        let mut result = qualifying_result(Direction::Long);
        result.aligned_count = 2;

        let evaluation = engine
            .generate(&mut state, &result, dec!(10000), at(0))
            .unwrap();
        assert!(matches!(
            evaluation,
            Evaluation::Skipped(SkipReason::ConfluenceTooLow { .. })
        ));
    }

    #[test]
    fn test_qualifying_result_emits_signal_and_marks_pending() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        let result = qualifying_result(Direction::Long);

        let evaluation = engine
            .generate(&mut state, &result, dec!(10000), at(0))
            .unwrap();
        let signal = evaluation.signal().expect("signal expected");
        assert_eq!(signal.direction, Direction::Long);
        assert_eq!(signal.score, 60);
        assert_eq!(signal.aligned_count, 3);
        assert!(signal.reason.contains("EMA↑"));
        assert_eq!(
            state.position.phase,
            PositionPhase::Pending {
                direction: Direction::Long
            }
        );
        assert_eq!(state.position.last_signal_time, Some(at(0)));
    }

    #[test]
    fn test_cooldown_blocks_second_signal() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        let result = qualifying_result(Direction::Long);

        engine
            .generate(&mut state, &result, dec!(10000), at(0))
            .unwrap();
        let second = engine
            .generate(&mut state, &result, dec!(10000), at(120))
            .unwrap();
        assert_eq!(
            second,
            Evaluation::Skipped(SkipReason::CooldownActive {
                remaining_secs: 180
            })
        );
    }

    #[test]
    fn test_pending_blocks_after_cooldown_expiry() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        let result = qualifying_result(Direction::Long);

        engine
            .generate(&mut state, &result, dec!(10000), at(0))
            .unwrap();
        let evaluation = engine
            .generate(&mut state, &result, dec!(10000), at(600))
            .unwrap();
        assert_eq!(evaluation, Evaluation::Skipped(SkipReason::DecisionPending));
    }

    #[test]
    fn test_open_position_blocks_same_direction() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        state.position.confirm_opened(Direction::Long);

        let evaluation = engine
            .generate(&mut state, &qualifying_result(Direction::Long), dec!(10000), at(0))
            .unwrap();
        assert_eq!(
            evaluation,
            Evaluation::Skipped(SkipReason::PositionOpen {
                direction: Direction::Long
            })
        );
    }

    #[test]
    fn test_opposite_direction_rejected_by_default() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        state.position.confirm_opened(Direction::Long);

        let evaluation = engine
            .generate(&mut state, &qualifying_result(Direction::Short), dec!(10000), at(0))
            .unwrap();
        assert_eq!(
            evaluation,
            Evaluation::Skipped(SkipReason::PositionOpen {
                direction: Direction::Long
            })
        );
    }

    #[test]
    fn test_opposite_direction_allowed_when_reversal_enabled() {
        let mut config = fast_config();
        config.risk.allow_reversal = true;
        let engine = ConfluenceEngine::new(config).unwrap();
        let mut state = warm_state(engine.config());
        state.position.confirm_opened(Direction::Long);

        let evaluation = engine
            .generate(&mut state, &qualifying_result(Direction::Short), dec!(10000), at(0))
            .unwrap();
        assert!(evaluation.signal().is_some());
    }

    #[test]
    fn test_volatility_warmup_blocks_sizing() {
        let mut config = fast_config();
        config.indicators.atr_period = 50;
        let engine = ConfluenceEngine::new(config).unwrap();
        let mut state = warm_state(engine.config());

        let evaluation = engine
            .generate(&mut state, &qualifying_result(Direction::Long), dec!(10000), at(0))
            .unwrap();
        assert_eq!(evaluation, Evaluation::Skipped(SkipReason::VolatilityWarmup));
    }

    #[test]
    fn test_dust_balance_is_a_sizing_skip() {
        let engine = engine();
        let mut state = warm_state(engine.config());

        let evaluation = engine
            .generate(&mut state, &qualifying_result(Direction::Long), dec!(1), at(0))
            .unwrap();
        assert!(matches!(
            evaluation,
            Evaluation::Skipped(SkipReason::SizingRejected { .. })
        ));
        // A sizing skip must not burn the cooldown.
        assert_eq!(state.position.last_signal_time, None);
    }

    #[test]
    fn test_uptrend_with_building_oi_emits_one_long() {
        let engine = engine();
        let mut signals = Vec::new();

        for i in 0..10 {
            engine.apply_ticker(&ramp_ticker(i));
            let evaluation = engine
                .process_candle(&ramp_candle(i), dec!(10000), at(i * 60))
                .unwrap()
                .unwrap();
            if let Evaluation::Signal(signal) = evaluation {
                signals.push(signal);
            }
        }

        assert_eq!(signals.len(), 1, "cooldown must suppress repeats");
        let signal = &signals[0];
        assert_eq!(signal.direction, Direction::Long);
        assert!(signal.score >= 60);
        assert!(signal.aligned_count >= 3);
        assert!(signal.stop_loss < signal.entry_price);
        assert!(signal.take_profit > signal.entry_price);
    }

    #[test]
    fn test_ticker_feeds_derivatives_windows() {
        let engine = engine();
        for i in 0..4 {
            engine.apply_ticker(&ramp_ticker(i));
        }
        let readout = engine.indicator_readout("BTCUSDT").unwrap();
        assert_eq!(readout.tickers_seen, 4);
        assert!(readout.oi_zscore > 0.0);
        assert_eq!(readout.funding_rate, Some(0.0001));
    }

    #[test]
    fn test_partial_ticker_without_price_is_dropped() {
        let engine = engine();
        let mut ticker = ramp_ticker(0);
        ticker.last_price = 0.0;
        engine.apply_ticker(&ticker);
        assert!(engine.indicator_readout("BTCUSDT").is_none());
    }

    #[test]
    fn test_lifecycle_callbacks_drive_phase() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        engine
            .generate(&mut state, &qualifying_result(Direction::Long), dec!(10000), at(0))
            .unwrap();
        // Move the warmed state into the engine's map so callbacks find it.
        engine.symbols.insert("BTCUSDT".to_string(), state);

        engine.on_position_opened("BTCUSDT", Direction::Long);
        assert_eq!(
            engine.indicator_readout("BTCUSDT").unwrap().phase,
            PositionPhase::Open {
                direction: Direction::Long
            }
        );

        engine.on_position_closed("BTCUSDT");
        assert_eq!(
            engine.indicator_readout("BTCUSDT").unwrap().phase,
            PositionPhase::NoPosition
        );
    }

    #[test]
    fn test_rejection_frees_slot_but_keeps_cooldown() {
        let engine = engine();
        let mut state = warm_state(engine.config());
        engine
            .generate(&mut state, &qualifying_result(Direction::Long), dec!(10000), at(0))
            .unwrap();
        engine.symbols.insert("BTCUSDT".to_string(), state);

        engine.on_execution_rejected("BTCUSDT");
        let readout = engine.indicator_readout("BTCUSDT").unwrap();
        assert_eq!(readout.phase, PositionPhase::NoPosition);

        let state = engine.symbols.get("BTCUSDT").unwrap();
        assert_eq!(state.position.cooldown_remaining(at(100), 300), Some(200));
    }
}
