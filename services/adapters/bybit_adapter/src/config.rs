//! Configuration for the Bybit market-data adapter

use serde::{Deserialize, Serialize};

/// Connection settings for the Bybit V5 public WebSocket and REST API.
///
/// Struct-level `serde(default)` lets a strategy config override single
/// fields without restating the section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BybitAdapterConfig {
    /// Public linear-perpetuals stream endpoint.
    pub websocket_url: String,

    /// REST base URL, used for symbol discovery.
    pub rest_url: String,

    /// Symbols to subscribe to (e.g. "BTCUSDT").
    pub symbols: Vec<String>,

    /// Kline interval in Bybit notation ("1", "5", "15", "60", "D", ...).
    pub interval: String,

    /// WebSocket connect timeout.
    pub connection_timeout_ms: u64,

    /// Delay before re-dialing after a lost session.
    pub reconnect_delay_secs: u64,

    /// Application-level `{"op":"ping"}` cadence. Bybit drops sessions idle
    /// for more than ~30s.
    pub ping_interval_secs: u64,

    /// Topics per subscribe request; Bybit caps request size.
    pub subscribe_batch_size: usize,
}

impl Default for BybitAdapterConfig {
    fn default() -> Self {
        Self {
            websocket_url: "wss://stream.bybit.com/v5/public/linear".to_string(),
            rest_url: "https://api.bybit.com".to_string(),
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            interval: "5".to_string(),
            connection_timeout_ms: 10_000,
            reconnect_delay_secs: 5,
            ping_interval_secs: 20,
            subscribe_batch_size: 10,
        }
    }
}

impl BybitAdapterConfig {
    /// The full topic list for the configured symbols: one kline and one
    /// ticker topic per symbol.
    pub fn topics(&self) -> Vec<String> {
        let mut topics = Vec::with_capacity(self.symbols.len() * 2);
        for symbol in &self.symbols {
            topics.push(format!("kline.{}.{}", self.interval, symbol));
            topics.push(format!("tickers.{}", symbol));
        }
        topics
    }
}
