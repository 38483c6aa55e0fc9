//! Perpetual-symbol discovery via the Bybit V5 REST API

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AdapterError, Result};

const INSTRUMENTS_PATH: &str = "/v5/market/instruments-info";
const TICKERS_PATH: &str = "/v5/market/tickers";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Max page size the instruments endpoint accepts.
const PAGE_LIMIT: &str = "1000";

/// Major linear perpetuals, used when discovery fails.
pub const FALLBACK_SYMBOLS: [&str; 25] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT", "DOGEUSDT", "ADAUSDT", "AVAXUSDT", "LINKUSDT",
    "DOTUSDT", "MATICUSDT", "LTCUSDT", "UNIUSDT", "ATOMUSDT", "XLMUSDT", "ETCUSDT", "FILUSDT",
    "APTUSDT", "NEARUSDT", "ARBUSDT", "OPUSDT", "BNBUSDT", "TRXUSDT", "SHIBUSDT", "PEPEUSDT",
    "SUIUSDT",
];

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: InstrumentsResult,
}

#[derive(Debug, Default, Deserialize)]
struct InstrumentsResult {
    #[serde(default)]
    list: Vec<Instrument>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Instrument {
    symbol: String,
    #[serde(default)]
    status: String,
    #[serde(rename = "quoteCoin", default)]
    quote_coin: String,
}

#[derive(Debug, Deserialize)]
struct TickersResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(default)]
    result: TickersResult,
}

#[derive(Debug, Default, Deserialize)]
struct TickersResult {
    #[serde(default)]
    list: Vec<TickerStat>,
}

#[derive(Debug, Deserialize)]
struct TickerStat {
    symbol: String,
    #[serde(rename = "turnover24h", default)]
    turnover_24h: String,
}

/// Fetch every tradeable USDT linear-perpetual symbol, following pagination.
pub async fn fetch_linear_symbols(rest_url: &str) -> Result<Vec<String>> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let url = format!("{}{}", rest_url.trim_end_matches('/'), INSTRUMENTS_PATH);
    let mut symbols = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut request = client
            .get(&url)
            .query(&[("category", "linear"), ("limit", PAGE_LIMIT)]);
        if let Some(cursor) = &cursor {
            request = request.query(&[("cursor", cursor.as_str())]);
        }

        let response: InstrumentsResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.ret_code != 0 {
            return Err(AdapterError::Api {
                code: response.ret_code,
                message: response.ret_msg,
            });
        }

        for instrument in response.result.list {
            if instrument.status == "Trading" && instrument.quote_coin == "USDT" {
                symbols.push(instrument.symbol);
            }
        }

        match response.result.next_page_cursor {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    Ok(symbols)
}

/// 24h quote turnover per linear symbol, for liquidity ranking.
async fn fetch_turnover(rest_url: &str) -> Result<HashMap<String, f64>> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    let url = format!("{}{}", rest_url.trim_end_matches('/'), TICKERS_PATH);
    let response: TickersResponse = client
        .get(&url)
        .query(&[("category", "linear")])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if response.ret_code != 0 {
        return Err(AdapterError::Api {
            code: response.ret_code,
            message: "tickers request rejected".to_string(),
        });
    }

    Ok(response
        .result
        .list
        .into_iter()
        .filter_map(|stat| {
            let turnover = stat.turnover_24h.parse().ok()?;
            Some((stat.symbol, turnover))
        })
        .collect())
}

/// Most-liquid-first ordering: sort by 24h turnover, descending. Symbols the
/// tickers endpoint does not report sink to the end.
fn rank_by_turnover(symbols: &mut [String], turnover: &HashMap<String, f64>) {
    symbols.sort_by(|a, b| {
        let ta = turnover.get(a).copied().unwrap_or(0.0);
        let tb = turnover.get(b).copied().unwrap_or(0.0);
        tb.partial_cmp(&ta).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Discover tradeable USDT perpetuals ordered most-liquid-first, falling back
/// to the built-in major list when the API is unreachable or returns nothing.
pub async fn discover_symbols(rest_url: &str) -> Vec<String> {
    let mut symbols = match fetch_linear_symbols(rest_url).await {
        Ok(symbols) if !symbols.is_empty() => symbols,
        Ok(_) => {
            warn!(
                "Symbol discovery returned no symbols, using fallback list of {}",
                FALLBACK_SYMBOLS.len()
            );
            return fallback_symbols();
        }
        Err(e) => {
            warn!(
                "Symbol discovery failed ({}), using fallback list of {}",
                e,
                FALLBACK_SYMBOLS.len()
            );
            return fallback_symbols();
        }
    };

    match fetch_turnover(rest_url).await {
        Ok(turnover) => rank_by_turnover(&mut symbols, &turnover),
        Err(e) => {
            // Exchange listing order is still usable, just not liquidity-ranked.
            warn!("Turnover ranking unavailable ({}), keeping listing order", e);
        }
    }

    info!(
        "Discovered {} USDT linear perpetuals from Bybit",
        symbols.len()
    );
    symbols
}

fn fallback_symbols() -> Vec<String> {
    FALLBACK_SYMBOLS.iter().map(|s| s.to_string()).collect()
}
