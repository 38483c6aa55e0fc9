//! Execution seam: order placement behind a trait.
//!
//! The engine emits signals; an [`ExecutionClient`] turns them into orders
//! and reports what actually happened. The paper implementation fills
//! instantly against a local balance so the whole pipeline runs without
//! exchange credentials.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use types::Direction;

use crate::error::Result;
use crate::signals::TradeSignal;

/// What the execution side did with a signal.
#[derive(Debug, Clone)]
pub struct TradeResult {
    pub accepted: bool,
    pub order_id: Option<String>,
    pub symbol: String,
    pub direction: Direction,
    pub quantity: Decimal,
    pub error: Option<String>,
}

impl TradeResult {
    pub fn accepted(signal: &TradeSignal, order_id: String) -> Self {
        Self {
            accepted: true,
            order_id: Some(order_id),
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            quantity: signal.requested_quantity,
            error: None,
        }
    }

    pub fn rejected(signal: &TradeSignal, error: String) -> Self {
        Self {
            accepted: false,
            order_id: None,
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            quantity: signal.requested_quantity,
            error: Some(error),
        }
    }
}

#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Current account balance in quote currency.
    async fn balance(&self) -> Result<Decimal>;

    /// Place the order described by the signal.
    async fn execute(&self, signal: &TradeSignal) -> Result<TradeResult>;
}

/// Simulated execution against a local paper account.
pub struct PaperExecutor {
    balance: RwLock<Decimal>,
    fills: AtomicU64,
}

impl PaperExecutor {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: RwLock::new(initial_balance),
            fills: AtomicU64::new(0),
        }
    }

    pub fn set_balance(&self, balance: Decimal) {
        *self.balance.write() = balance;
    }

    pub fn fills(&self) -> u64 {
        self.fills.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ExecutionClient for PaperExecutor {
    async fn balance(&self) -> Result<Decimal> {
        Ok(*self.balance.read())
    }

    async fn execute(&self, signal: &TradeSignal) -> Result<TradeResult> {
        let fill = self.fills.fetch_add(1, Ordering::Relaxed) + 1;
        let order_id = format!("PAPER-{}-{}", signal.symbol, fill);
        info!(
            "📝 [PAPER] {} {} {} @ {} | SL {} | TP {} | id {}",
            signal.direction,
            signal.requested_quantity,
            signal.symbol,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            order_id
        );
        Ok(TradeResult::accepted(signal, order_id))
    }
}
