//! Incremental technical indicators.
//!
//! Every indicator is an explicit recurrence struct holding only the minimal
//! state needed for its next update — no price history is retained, so
//! per-candle cost is O(1) and memory is bounded regardless of stream length.
//! All of them seed their smoothed values from a simple average over the
//! first `period` inputs, vote `Neutral` until warm-up completes, and are a
//! pure function of the confirmed-candle sequence they have been fed.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;

pub use atr::AtrState;
pub use ema::{EmaState, TrendState};
pub use macd::MacdState;
pub use rsi::RsiState;
