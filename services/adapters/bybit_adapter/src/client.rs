//! Bybit V5 public WebSocket client
//!
//! Maintains one streaming session against the linear-perpetuals endpoint,
//! subscribing to kline and ticker topics for every configured symbol and
//! emitting typed [`MarketEvent`]s to the strategy channel. Sessions are
//! re-dialed with a fixed delay after socket loss, resubscribing from
//! scratch; undecodable frames are dropped with a warning and never kill
//! the session.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use types::{MarketEvent, TickerUpdate};

use crate::config::BybitAdapterConfig;
use crate::error::{AdapterError, Result};
use crate::messages::{
    symbol_from_kline_topic, symbol_from_ticker_topic, KlinePayload, TickerPayload,
};

/// How one WebSocket session ended.
enum SessionEnd {
    /// Socket lost or closed by the server; dial again after the delay.
    SocketLost,
    /// The strategy dropped its receiver; the adapter is done.
    ConsumerGone,
}

/// Streaming market-data client for Bybit V5 linear perpetuals.
pub struct BybitWebSocketClient {
    config: BybitAdapterConfig,
    events: mpsc::Sender<MarketEvent>,
    /// Last full ticker per symbol; delta frames merge onto these so every
    /// emitted update is a complete record.
    tickers: HashMap<String, TickerUpdate>,
    frames_processed: u64,
    parse_errors: u64,
}

impl BybitWebSocketClient {
    pub fn new(config: BybitAdapterConfig, events: mpsc::Sender<MarketEvent>) -> Result<Self> {
        if config.symbols.is_empty() {
            return Err(AdapterError::Configuration(
                "No symbols configured".to_string(),
            ));
        }

        if !config.websocket_url.starts_with("wss://") && !config.websocket_url.starts_with("ws://")
        {
            return Err(AdapterError::Configuration(
                "Invalid WebSocket URL scheme".to_string(),
            ));
        }

        if config.interval.is_empty() {
            return Err(AdapterError::Configuration(
                "Kline interval must not be empty".to_string(),
            ));
        }

        Ok(Self {
            config,
            events,
            tickers: HashMap::new(),
            frames_processed: 0,
            parse_errors: 0,
        })
    }

    /// Frames successfully decoded and dispatched over the client lifetime.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Frames dropped because they could not be decoded.
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// Run until the event consumer hangs up, reconnecting on socket loss.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.run_session().await {
                Ok(SessionEnd::ConsumerGone) => {
                    info!("Event channel closed, stopping Bybit adapter");
                    return Ok(());
                }
                Ok(SessionEnd::SocketLost) => {}
                Err(e) => {
                    warn!("WebSocket session failed: {}", e);
                }
            }

            // Deltas only apply to the session that sent the snapshot.
            self.tickers.clear();

            info!("Reconnecting in {}s", self.config.reconnect_delay_secs);
            tokio::time::sleep(Duration::from_secs(self.config.reconnect_delay_secs)).await;
        }
    }

    /// Dial, subscribe, and pump one session until it ends.
    async fn run_session(&mut self) -> Result<SessionEnd> {
        let url = self.config.websocket_url.clone();

        let (ws_stream, _) = tokio::time::timeout(
            Duration::from_millis(self.config.connection_timeout_ms),
            connect_async(&url),
        )
        .await
        .map_err(|_| AdapterError::ConnectionTimeout {
            url: url.clone(),
            timeout_ms: self.config.connection_timeout_ms,
        })?
        .map_err(|e| AdapterError::ConnectionFailed {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let (mut ws_sink, mut ws_stream) = ws_stream.split();

        // Subscribe in batches; Bybit caps the args per request.
        let topics = self.config.topics();
        for chunk in topics.chunks(self.config.subscribe_batch_size.max(1)) {
            let subscription = json!({
                "op": "subscribe",
                "args": chunk,
            });

            ws_sink
                .send(Message::Text(subscription.to_string()))
                .await
                .map_err(|e| AdapterError::ConnectionFailed {
                    url: url.clone(),
                    reason: format!("Failed to send subscription: {}", e),
                })?;
        }

        info!(
            "✅ Connected to Bybit WebSocket, subscribed to {} topics for {} symbols",
            topics.len(),
            self.config.symbols.len()
        );

        let mut ping =
            tokio::time::interval(Duration::from_secs(self.config.ping_interval_secs.max(1)));
        // The first tick completes immediately; the connection is fresh.
        ping.tick().await;

        loop {
            tokio::select! {
                msg = ws_stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.handle_frame(&text).await {
                                match e {
                                    AdapterError::ChannelClosed => {
                                        return Ok(SessionEnd::ConsumerGone);
                                    }
                                    AdapterError::SubscriptionRejected(_) => return Err(e),
                                    other => {
                                        self.parse_errors += 1;
                                        warn!("Dropping undecodable frame: {}", other);
                                    }
                                }
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            warn!("WebSocket closed by server: {:?}", frame);
                            return Ok(SessionEnd::SocketLost);
                        }
                        Some(Ok(_)) => {} // binary/ping/pong frames carry no market data
                        Some(Err(e)) => {
                            error!("WebSocket error: {}", e);
                            return Ok(SessionEnd::SocketLost);
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return Ok(SessionEnd::SocketLost);
                        }
                    }
                }

                _ = ping.tick() => {
                    let keepalive = json!({"op": "ping"});
                    if let Err(e) = ws_sink.send(Message::Text(keepalive.to_string())).await {
                        warn!("Failed to send keepalive ping: {}", e);
                        return Ok(SessionEnd::SocketLost);
                    }
                }
            }
        }
    }

    /// Decode one text frame and emit any market events it carries.
    async fn handle_frame(&mut self, text: &str) -> Result<()> {
        let value: Value = serde_json::from_str(text).map_err(|e| AdapterError::Parse {
            what: "WebSocket frame".to_string(),
            error: e.to_string(),
        })?;

        // Operational acks carry an "op" field instead of a topic.
        if let Some(op) = value.get("op").and_then(|v| v.as_str()) {
            let success = value
                .get("success")
                .and_then(|v| v.as_bool())
                .unwrap_or(true);

            match op {
                "subscribe" => {
                    if success {
                        let conn_id = value
                            .get("conn_id")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        debug!("Subscription confirmed: conn_id={}", conn_id);
                    } else {
                        let reason = value
                            .get("ret_msg")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown reason");
                        return Err(AdapterError::SubscriptionRejected(reason.to_string()));
                    }
                }
                "ping" | "pong" => {
                    debug!("Keepalive acknowledged");
                }
                other => {
                    debug!("Ignoring operational message: {}", other);
                }
            }

            return Ok(());
        }

        let topic = match value.get("topic").and_then(|v| v.as_str()) {
            Some(t) => t.to_string(),
            None => {
                debug!("Ignoring frame without topic");
                return Ok(());
            }
        };

        let ts = value.get("ts").and_then(|v| v.as_i64()).unwrap_or(0);
        let data = value.get("data").cloned().unwrap_or(Value::Null);

        if let Some(symbol) = symbol_from_kline_topic(&topic) {
            let symbol = symbol.to_string();
            self.handle_kline(&symbol, data).await?;
        } else if let Some(symbol) = symbol_from_ticker_topic(&topic) {
            let symbol = symbol.to_string();
            self.handle_ticker(&symbol, data, ts).await?;
        } else {
            debug!("Ignoring unhandled topic: {}", topic);
            return Ok(());
        }

        self.frames_processed += 1;
        Ok(())
    }

    /// Kline frames carry an array of bars (usually one, more on catch-up).
    async fn handle_kline(&mut self, symbol: &str, data: Value) -> Result<()> {
        let klines: Vec<KlinePayload> =
            serde_json::from_value(data).map_err(|e| AdapterError::Parse {
                what: format!("kline payload for {}", symbol),
                error: e.to_string(),
            })?;

        for payload in klines {
            self.emit(MarketEvent::Candle(payload.into_candle(symbol)))
                .await?;
        }

        Ok(())
    }

    /// Ticker frames carry a single object; some API revisions wrap it in a
    /// one-element array.
    async fn handle_ticker(&mut self, symbol: &str, data: Value, ts: i64) -> Result<()> {
        let payload_value = match data {
            Value::Array(mut items) => {
                if items.is_empty() {
                    return Ok(());
                }
                items.remove(0)
            }
            other => other,
        };

        let payload: TickerPayload =
            serde_json::from_value(payload_value).map_err(|e| AdapterError::Parse {
                what: format!("ticker payload for {}", symbol),
                error: e.to_string(),
            })?;

        let update = self.merge_ticker(symbol, payload, ts);
        self.emit(MarketEvent::Ticker(update)).await
    }

    /// Merge a (possibly partial) ticker payload onto the last snapshot and
    /// return the complete record to emit.
    fn merge_ticker(&mut self, symbol: &str, payload: TickerPayload, ts: i64) -> TickerUpdate {
        let entry = self
            .tickers
            .entry(symbol.to_string())
            .or_insert_with(|| TickerUpdate {
                symbol: symbol.to_string(),
                last_price: 0.0,
                mark_price: 0.0,
                funding_rate: 0.0,
                next_funding_time: 0,
                open_interest: 0.0,
                timestamp: ts,
            });

        if let Some(last_price) = payload.last_price {
            entry.last_price = last_price;
        }
        if let Some(mark_price) = payload.mark_price {
            entry.mark_price = mark_price;
        }
        if let Some(funding_rate) = payload.funding_rate {
            entry.funding_rate = funding_rate;
        }
        if let Some(next_funding_time) = payload.next_funding_time {
            entry.next_funding_time = next_funding_time;
        }
        if let Some(open_interest) = payload.open_interest {
            entry.open_interest = open_interest;
        }
        if ts > 0 {
            entry.timestamp = ts;
        }

        entry.clone()
    }

    async fn emit(&self, event: MarketEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| AdapterError::ChannelClosed)
    }
}
