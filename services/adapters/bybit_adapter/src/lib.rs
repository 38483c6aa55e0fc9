//! # Bybit Market-Data Adapter
//!
//! Streams klines and derivatives tickers from the Bybit V5 public
//! WebSocket (linear perpetuals) and converts them to the shared
//! [`types::MarketEvent`] vocabulary consumed by strategy services.
//!
//! The adapter is deliberately thin: it owns connection lifecycle
//! (dial, subscribe, keepalive, reconnect-with-resubscribe), wire-format
//! decoding, and ticker delta merging. It performs no analysis — every
//! decoded event is forwarded to the strategy channel as-is.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod symbols;

pub use client::BybitWebSocketClient;
pub use config::BybitAdapterConfig;
pub use error::{AdapterError, Result};
pub use symbols::{discover_symbols, fetch_linear_symbols, FALLBACK_SYMBOLS};
