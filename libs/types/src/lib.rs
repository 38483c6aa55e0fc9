//! # Market-Data Domain Types
//!
//! Shared type definitions for the confluence engine services: candles and
//! derivatives ticker updates as emitted by exchange adapters, plus the
//! directional vocabulary used across strategy, risk, and execution layers.
//!
//! ## Design Philosophy
//!
//! - **One vocabulary**: adapters, strategies, and execution all speak the
//!   same `Candle` / `TickerUpdate` / `Direction` types — conversion happens
//!   once, at the adapter boundary.
//! - **Confirmed-candle discipline**: every candle carries its `confirmed`
//!   flag so downstream indicator state can refuse unconfirmed (still
//!   repainting) bars.
//! - **Plain numerics**: prices and sizes are `f64` as parsed off the wire;
//!   exact decimal money math lives behind the strategy/risk boundary, not
//!   here.

pub mod market;

pub use market::{Candle, Direction, MarketEvent, TickerUpdate};
