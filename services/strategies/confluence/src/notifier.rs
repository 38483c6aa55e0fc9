//! Telegram alerting.
//!
//! Alerts are best-effort: a failed delivery is logged and forgotten, it
//! never blocks or fails the trading path. When no token or chat id is
//! configured every call is a cheap no-op.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::config::TelegramSettings;
use crate::executor::TradeResult;
use crate::signals::TradeSignal;
use types::Direction;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TelegramNotifier {
    settings: TelegramSettings,
    client: Option<reqwest::Client>,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> Self {
        let client = if settings.is_configured() {
            match reqwest::Client::builder().timeout(SEND_TIMEOUT).build() {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("telegram client unavailable, alerts disabled: {e}");
                    None
                }
            }
        } else {
            None
        };
        Self { settings, client }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn send(&self, text: String) {
        let Some(client) = &self.client else {
            debug!("telegram not configured, skipping alert");
            return;
        };
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.settings.bot_token
        );
        let payload = json!({
            "chat_id": self.settings.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        match client.post(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("telegram alert sent");
            }
            Ok(response) => {
                warn!("telegram API error: {}", response.status());
            }
            Err(e) => {
                warn!("failed to send telegram alert: {e}");
            }
        }
    }

    pub async fn notify_startup(&self, mode: &str, symbols: &[String], balance: f64) {
        let text = format!(
            "🚀 <b>Confluence Engine Started</b>\n\n\
             🔧 <b>Mode:</b> {mode}\n\
             📊 <b>Symbols:</b> {}\n\
             💵 <b>Balance:</b> ${balance:.2}",
            symbols.join(", ")
        );
        self.send(text).await;
    }

    pub async fn notify_signal(&self, signal: &TradeSignal) {
        let emoji = side_emoji(signal.direction);
        let text = format!(
            "{emoji} <b>SIGNAL: {} {}</b>\n\n\
             📊 <b>Confluence:</b> {}% ({}/5 aligned)\n\
             💰 <b>Entry:</b> ${}\n\
             🛑 <b>Stop-Loss:</b> ${}\n\
             🎯 <b>Take-Profit:</b> ${}\n\n\
             📝 {}",
            signal.direction,
            signal.symbol,
            signal.score,
            signal.aligned_count,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            signal.reason
        );
        self.send(text).await;
    }

    pub async fn notify_executed(&self, signal: &TradeSignal, result: &TradeResult) {
        let text = format!(
            "✅ <b>TRADE EXECUTED</b>\n\n\
             {} <b>{} {}</b>\n\
             📦 <b>Quantity:</b> {}\n\
             ⚡ <b>Leverage:</b> {}x\n\
             📊 <b>Position:</b> ${}\n\n\
             💰 <b>Entry:</b> ${}\n\
             🛑 <b>SL:</b> ${}\n\
             🎯 <b>TP:</b> ${}\n\n\
             🆔 <code>{}</code>",
            side_emoji(signal.direction),
            signal.direction,
            signal.symbol,
            result.quantity,
            signal.leverage,
            signal.position_value,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            result.order_id.as_deref().unwrap_or("-")
        );
        self.send(text).await;
    }

    pub async fn notify_failed(&self, signal: &TradeSignal, error: &str) {
        let text = format!(
            "❌ <b>TRADE FAILED</b>\n\n\
             📉 <b>{} {}</b>\n\
             ⚠️ <b>Error:</b> {error}",
            signal.direction, signal.symbol
        );
        self.send(text).await;
    }

    pub async fn notify_shutdown(&self) {
        self.send("⏹️ <b>Confluence Engine Stopped</b>".to_string())
            .await;
    }
}

fn side_emoji(direction: Direction) -> &'static str {
    match direction {
        Direction::Long => "🟢",
        Direction::Short => "🔴",
    }
}
