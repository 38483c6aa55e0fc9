//! Bybit V5 WebSocket payload structures
//!
//! Bybit serializes most numeric fields as decimal strings, and ticker
//! frames after the initial snapshot are deltas carrying only the fields
//! that changed. The deserializers here are lenient: a missing or empty
//! field becomes `None` so the client can merge deltas onto the last full
//! snapshot instead of zeroing values out.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use types::Candle;

/// One kline entry from a `kline.{interval}.{symbol}` frame.
///
/// `start`/`end` bound the bar window; `confirm` flips to true on the final
/// update for the window, after which Bybit starts a new bar.
#[derive(Debug, Clone, Deserialize)]
pub struct KlinePayload {
    pub start: i64,
    pub end: i64,
    pub interval: String,
    #[serde(deserialize_with = "string_f64")]
    pub open: f64,
    #[serde(deserialize_with = "string_f64")]
    pub high: f64,
    #[serde(deserialize_with = "string_f64")]
    pub low: f64,
    #[serde(deserialize_with = "string_f64")]
    pub close: f64,
    #[serde(deserialize_with = "string_f64")]
    pub volume: f64,
    #[serde(deserialize_with = "string_f64")]
    pub turnover: f64,
    pub confirm: bool,
    pub timestamp: i64,
}

impl KlinePayload {
    /// Attach the symbol (carried in the topic, not the payload) and produce
    /// the shared candle type.
    pub fn into_candle(self, symbol: &str) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            open_time: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            turnover: self.turnover,
            confirmed: self.confirm,
        }
    }
}

/// Fields of a `tickers.{symbol}` frame this service consumes.
///
/// Every field except `symbol` is optional: delta frames omit anything
/// unchanged, and some fields arrive as empty strings during instrument
/// rollovers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerPayload {
    pub symbol: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mark_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub funding_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub next_funding_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub open_interest: Option<f64>,
}

/// Symbol component of a `kline.{interval}.{symbol}` topic.
pub fn symbol_from_kline_topic(topic: &str) -> Option<&str> {
    let mut parts = topic.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("kline"), Some(_interval), Some(symbol)) if !symbol.is_empty() => Some(symbol),
        _ => None,
    }
}

/// Symbol component of a `tickers.{symbol}` topic.
pub fn symbol_from_ticker_topic(topic: &str) -> Option<&str> {
    match topic.split_once('.') {
        Some(("tickers", symbol)) if !symbol.is_empty() => Some(symbol),
        _ => None,
    }
}

/// Required decimal-string field ("16649.5" -> 16649.5). Also accepts a bare
/// JSON number.
fn string_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of f64 range")),
        other => Err(serde::de::Error::custom(format!(
            "expected numeric string, got {}",
            other
        ))),
    }
}

/// Optional decimal-string field; empty strings and unparsable values become
/// `None` rather than an error.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }))
}

/// Optional integer field that may arrive as a string ("1673280000000").
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_kline_payload() {
        let json = r#"{
            "start": 1672324800000,
            "end": 1672325099999,
            "interval": "5",
            "open": "16649.5",
            "close": "16677",
            "high": "16677",
            "low": "16608",
            "volume": "2.081",
            "turnover": "34666.4005",
            "confirm": false,
            "timestamp": 1672324988882
        }"#;

        let payload: KlinePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.start, 1672324800000);
        assert_eq!(payload.open, 16649.5);
        assert_eq!(payload.close, 16677.0);
        assert!(!payload.confirm);

        let candle = payload.into_candle("BTCUSDT");
        assert_eq!(candle.symbol, "BTCUSDT");
        assert_eq!(candle.open_time, 1672324800000);
        assert!(!candle.confirmed);
        assert!(candle.has_valid_prices());
    }

    #[test]
    fn test_parses_ticker_snapshot() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "tickDirection": "PlusTick",
            "price24hPcnt": "0.017103",
            "lastPrice": "17216.00",
            "markPrice": "17217.33",
            "indexPrice": "17227.36",
            "openInterest": "68744.761",
            "openInterestValue": "1183601235.91",
            "turnover24h": "1570383121.943499",
            "volume24h": "91705.276",
            "nextFundingTime": "1673280000000",
            "fundingRate": "-0.000212",
            "bid1Price": "17215.50",
            "ask1Price": "17216.00"
        }"#;

        let payload: TickerPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.symbol, "BTCUSDT");
        assert_eq!(payload.last_price, Some(17216.0));
        assert_eq!(payload.mark_price, Some(17217.33));
        assert_eq!(payload.funding_rate, Some(-0.000212));
        assert_eq!(payload.next_funding_time, Some(1673280000000));
        assert_eq!(payload.open_interest, Some(68744.761));
    }

    #[test]
    fn test_parses_ticker_delta_with_missing_fields() {
        // Delta frames carry only what changed.
        let json = r#"{"symbol": "BTCUSDT", "lastPrice": "17218.50"}"#;

        let payload: TickerPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.last_price, Some(17218.5));
        assert_eq!(payload.mark_price, None);
        assert_eq!(payload.funding_rate, None);
        assert_eq!(payload.open_interest, None);
    }

    #[test]
    fn test_empty_string_fields_become_none() {
        let json = r#"{"symbol": "BTCUSDT", "fundingRate": "", "openInterest": ""}"#;

        let payload: TickerPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.funding_rate, None);
        assert_eq!(payload.open_interest, None);
    }

    #[test]
    fn test_topic_symbol_extraction() {
        assert_eq!(symbol_from_kline_topic("kline.5.BTCUSDT"), Some("BTCUSDT"));
        assert_eq!(symbol_from_kline_topic("kline.D.ETHUSDT"), Some("ETHUSDT"));
        assert_eq!(symbol_from_kline_topic("kline.5"), None);
        assert_eq!(symbol_from_kline_topic("tickers.BTCUSDT"), None);

        assert_eq!(symbol_from_ticker_topic("tickers.BTCUSDT"), Some("BTCUSDT"));
        assert_eq!(symbol_from_ticker_topic("tickers."), None);
        assert_eq!(symbol_from_ticker_topic("kline.5.BTCUSDT"), None);
    }

    #[test]
    fn test_rejects_kline_with_garbage_price() {
        let json = r#"{
            "start": 1672324800000,
            "end": 1672325099999,
            "interval": "5",
            "open": "not-a-number",
            "close": "16677",
            "high": "16677",
            "low": "16608",
            "volume": "2.081",
            "turnover": "34666.4005",
            "confirm": false,
            "timestamp": 1672324988882
        }"#;

        assert!(serde_json::from_str::<KlinePayload>(json).is_err());
    }
}
