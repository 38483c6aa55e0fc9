//! Engine configuration.
//!
//! Loaded from TOML at startup and read-only afterwards. Every section has a
//! complete default so the engine runs out of the box in dry-run mode; a
//! config file only needs the sections it overrides.

use anyhow::{bail, Result};
use confluence_bybit_adapter::BybitAdapterConfig;
use confluence_strategy_shared::StrategyConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub indicators: IndicatorSettings,
    #[serde(default)]
    pub derivatives: DerivativesSettings,
    #[serde(default)]
    pub risk: RiskSettings,
    #[serde(default)]
    pub execution: ExecutionSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    /// Exchange connection settings. Symbol list and interval are taken
    /// from `[engine]` at wiring time; this section covers endpoints and
    /// session tuning.
    #[serde(default)]
    pub bybit: BybitAdapterConfig,
}

/// Symbol universe, candle interval and signal gating thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Symbols to trade. Empty means discover liquid USDT perpetuals at
    /// startup.
    pub symbols: Vec<String>,

    /// Bybit kline interval in minutes, as the exchange spells it.
    pub interval: String,

    /// How many symbols to take when discovering the universe.
    pub max_symbols: usize,

    /// Minimum confluence score (0-100) before a signal is considered.
    pub min_confluence_score: u8,

    /// Minimum voters aligned in the dominant direction.
    pub min_indicators_aligned: u8,

    /// Minimum seconds between two signals for the same symbol.
    pub cooldown_seconds: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval: "5".to_string(),
            max_symbols: 10,
            min_confluence_score: 60,
            min_indicators_aligned: 3,
            cooldown_seconds: 300,
        }
    }
}

/// Candle-driven indicator periods and zones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
        }
    }
}

/// Ticker-driven derivatives windows and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativesSettings {
    /// Open-interest window length (samples).
    pub oi_lookback: usize,

    /// Z-score above which open interest counts as rising.
    pub oi_zscore_threshold: f64,

    /// |z| above which an OI deviation is flagged as extreme.
    pub oi_extreme_threshold: f64,

    /// Funding-rate window length (samples).
    pub funding_lookback: usize,

    /// Funding samples required before the tracker may vote.
    pub funding_min_samples: usize,

    /// |z| beyond which funding counts as extreme.
    pub funding_extreme_zscore: f64,

    /// Raw per-period rate beyond which funding counts as extreme.
    /// 0.0005 per 8h is roughly 55% annualized.
    pub funding_extreme_rate: f64,
}

impl Default for DerivativesSettings {
    fn default() -> Self {
        Self {
            oi_lookback: 20,
            oi_zscore_threshold: 0.5,
            oi_extreme_threshold: 2.0,
            funding_lookback: 50,
            funding_min_samples: 5,
            funding_extreme_zscore: 2.0,
            funding_extreme_rate: 0.0005,
        }
    }
}

/// Stop/target geometry and position sizing bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Percent of account balance committed per trade (before leverage).
    pub max_capital_per_trade_pct: f64,

    pub leverage: u32,
    pub max_leverage: u32,

    /// Stop distance in ATR multiples.
    pub stoploss_atr_multiplier: f64,

    /// Target distance as a multiple of the stop distance.
    pub takeprofit_ratio: f64,

    /// Accept a signal opposite to an open position instead of rejecting it.
    pub allow_reversal: bool,

    /// Exchange quantity increment; quantities are floored to this step.
    pub qty_step: f64,

    /// Exchange minimum order quantity.
    pub min_qty: f64,

    /// Exchange minimum order value in quote currency.
    pub min_order_value: f64,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            max_capital_per_trade_pct: 2.0,
            leverage: 5,
            max_leverage: 10,
            stoploss_atr_multiplier: 1.5,
            takeprofit_ratio: 2.0,
            allow_reversal: false,
            qty_step: 0.001,
            min_qty: 0.001,
            min_order_value: 7.0,
        }
    }
}

/// Execution seam settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Simulate fills instead of placing orders.
    pub dry_run: bool,

    /// Starting balance for the paper account.
    pub initial_balance: f64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            dry_run: true,
            initial_balance: 1000.0,
        }
    }
}

/// Telegram alerting; disabled unless a token and chat id are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramSettings {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

impl StrategyConfig for EngineConfig {
    fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.min_confluence_score > 100 {
            bail!(
                "min_confluence_score {} exceeds 100",
                e.min_confluence_score
            );
        }
        if e.min_indicators_aligned > 5 {
            bail!(
                "min_indicators_aligned {} exceeds the 5 available voters",
                e.min_indicators_aligned
            );
        }
        if e.cooldown_seconds < 0 {
            bail!("cooldown_seconds must be non-negative");
        }

        let i = &self.indicators;
        if i.ema_fast == 0 || i.ema_slow == 0 || i.rsi_period == 0 || i.atr_period == 0 {
            bail!("indicator periods must be at least 1");
        }
        if i.ema_fast >= i.ema_slow {
            bail!(
                "ema_fast {} must be shorter than ema_slow {}",
                i.ema_fast,
                i.ema_slow
            );
        }
        if i.macd_fast >= i.macd_slow {
            bail!(
                "macd_fast {} must be shorter than macd_slow {}",
                i.macd_fast,
                i.macd_slow
            );
        }
        if i.macd_signal == 0 {
            bail!("macd_signal must be at least 1");
        }
        if !(0.0..=100.0).contains(&i.rsi_oversold)
            || !(0.0..=100.0).contains(&i.rsi_overbought)
            || i.rsi_oversold >= i.rsi_overbought
        {
            bail!(
                "rsi zones must satisfy 0 <= oversold < overbought <= 100, got {} / {}",
                i.rsi_oversold,
                i.rsi_overbought
            );
        }

        let d = &self.derivatives;
        if d.oi_lookback == 0 || d.funding_lookback == 0 {
            bail!("derivatives lookbacks must be at least 1");
        }
        if d.funding_min_samples > d.funding_lookback {
            bail!(
                "funding_min_samples {} exceeds funding_lookback {}",
                d.funding_min_samples,
                d.funding_lookback
            );
        }

        let r = &self.risk;
        if !(0.0..=100.0).contains(&r.max_capital_per_trade_pct) {
            bail!(
                "max_capital_per_trade_pct {} must be within (0, 100]",
                r.max_capital_per_trade_pct
            );
        }
        if r.leverage == 0 || r.leverage > r.max_leverage {
            bail!(
                "leverage {} must be within 1..={}",
                r.leverage,
                r.max_leverage
            );
        }
        if r.stoploss_atr_multiplier <= 0.0 || r.takeprofit_ratio <= 0.0 {
            bail!("stoploss_atr_multiplier and takeprofit_ratio must be positive");
        }
        if r.qty_step <= 0.0 || r.min_qty < 0.0 || r.min_order_value < 0.0 {
            bail!("sizing bounds must be positive");
        }

        if self.execution.initial_balance <= 0.0 {
            bail!("initial_balance must be positive");
        }

        Ok(())
    }
}
