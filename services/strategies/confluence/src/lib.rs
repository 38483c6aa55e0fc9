//! # Confluence Strategy - Multi-Indicator Signal Generation
//!
//! ## Purpose
//!
//! Real-time signal engine for crypto perpetual futures. Five independent
//! market gauges — EMA trend, RSI momentum, MACD confirmation, open-interest
//! buildup, and funding-rate sentiment — each cast a directional vote on
//! every confirmed candle. Votes are fused into a 0-100 confluence score;
//! only evaluations clearing the score, alignment, cooldown, and position
//! gates produce a risk-bounded trade signal with ATR-derived stop/target
//! levels and exchange-constrained sizing.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Bybit V5 public WebSocket (kline + derivatives
//!   ticker streams) via the `confluence-bybit-adapter` crate
//! - **Output Destinations**: `ExecutionClient` seam for order placement,
//!   Telegram Bot API for operator alerts
//! - **Execution Feedback**: open/close/reject callbacks drive the
//!   per-symbol position lifecycle so engine state mirrors confirmed fills
//! - **Configuration**: TOML file with env-var overrides, validated once at
//!   startup
//!
//! ## Architecture Role
//!
//! ```text
//! Bybit WebSocket → [Indicator Update] → [Vote Scoring] → [Gating Ladder]
//!        ↓                  ↓                   ↓                 ↓
//! Candles + Tickers   EMA/RSI/MACD/ATR   Confluence Score   TradeSignal
//! Delta Merging       OI + Funding       Aligned Count      Stop/Target/Qty
//!                     Warm-up Tracking   Dominant Side      Paper Execution
//! ```
//!
//! The engine is the only stateful stage: one state cell per symbol, all
//! updates candle-atomic, evaluation strictly on confirmed bars.
//!
//! ## Performance Profile
//!
//! - **Evaluation**: O(1) per candle per symbol — every indicator is an
//!   incremental recurrence, no look-back buffers beyond the derivatives
//!   windows
//! - **Memory**: a few hundred bytes per tracked symbol
//! - **Concurrency**: per-symbol sharded state via `DashMap`; candles for
//!   different symbols evaluate in parallel without contention

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod indicators;
pub mod market_data;
pub mod notifier;
pub mod positions;
pub mod risk;
pub mod scoring;
pub mod signals;
pub mod strategy;

pub use config::EngineConfig;
pub use engine::{ConfluenceEngine, IndicatorReadout};
pub use error::{EngineError, Result};
pub use executor::{ExecutionClient, PaperExecutor, TradeResult};
pub use notifier::TelegramNotifier;
pub use signals::{ConfluenceResult, Evaluation, SignalStats, SkipReason, TradeSignal, Vote, VoteSet};
pub use strategy::ConfluenceStrategy;
