//! Risk arithmetic: protective prices and position sizing.
//!
//! All money math runs on `Decimal` so stop, target and quantity values
//! survive serialization and comparison without binary-float drift. Sizing
//! shortfalls are skips, not errors — the caller logs them and moves on.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use types::Direction;

use crate::config::RiskSettings;
use crate::error::{EngineError, Result};
use crate::signals::SkipReason;

/// Risk knobs converted to `Decimal` once at engine construction.
#[derive(Debug, Clone)]
pub struct RiskParams {
    pub stop_atr_multiplier: Decimal,
    pub takeprofit_ratio: Decimal,
    pub capital_pct: Decimal,
    pub leverage: u32,
    pub qty_step: Decimal,
    pub min_qty: Decimal,
    pub min_order_value: Decimal,
}

impl RiskParams {
    pub fn from_settings(settings: &RiskSettings) -> Result<Self> {
        Ok(Self {
            stop_atr_multiplier: decimal_field(
                settings.stoploss_atr_multiplier,
                "stoploss_atr_multiplier",
            )?,
            takeprofit_ratio: decimal_field(settings.takeprofit_ratio, "takeprofit_ratio")?,
            capital_pct: decimal_field(
                settings.max_capital_per_trade_pct,
                "max_capital_per_trade_pct",
            )?,
            leverage: settings.leverage,
            qty_step: decimal_field(settings.qty_step, "qty_step")?,
            min_qty: decimal_field(settings.min_qty, "min_qty")?,
            min_order_value: decimal_field(settings.min_order_value, "min_order_value")?,
        })
    }
}

fn decimal_field(value: f64, field: &str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| EngineError::Configuration {
        message: format!("{field} {value} is not representable as a decimal"),
    })
}

/// A fully sized order intent, ready to become a trade signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPlan {
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub quantity: Decimal,
    pub position_value: Decimal,
}

/// Stop and target around an entry: the stop sits `atr * multiplier` against
/// the trade, the target sits `risk_distance * ratio` with it.
pub fn protective_prices(
    direction: Direction,
    entry: Decimal,
    atr: Decimal,
    params: &RiskParams,
) -> (Decimal, Decimal) {
    let offset = atr * params.stop_atr_multiplier;
    let stop_loss = match direction {
        Direction::Long => entry - offset,
        Direction::Short => entry + offset,
    };
    let risk_distance = (entry - stop_loss).abs();
    let take_profit = match direction {
        Direction::Long => entry + risk_distance * params.takeprofit_ratio,
        Direction::Short => entry - risk_distance * params.takeprofit_ratio,
    };
    (stop_loss, take_profit)
}

/// Largest multiple of `step` not exceeding `quantity`.
pub fn floor_to_step(quantity: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return quantity;
    }
    (quantity / step).floor() * step
}

/// Size a trade from the account balance and produce the full order plan.
///
/// `position_value = balance * capital_pct / 100 * leverage`, quantity is
/// `position_value / entry` floored to the exchange step. Quantities below
/// the exchange minimum, or order values below the exchange minimum value,
/// come back as [`SkipReason::SizingRejected`].
pub fn plan_order(
    direction: Direction,
    entry: Decimal,
    atr: Decimal,
    balance: Decimal,
    params: &RiskParams,
) -> std::result::Result<OrderPlan, SkipReason> {
    if entry <= Decimal::ZERO {
        return Err(SkipReason::SizingRejected {
            detail: format!("non-positive entry price {entry}"),
        });
    }

    let (stop_loss, take_profit) = protective_prices(direction, entry, atr, params);

    let position_value =
        balance * params.capital_pct / dec!(100) * Decimal::from(params.leverage);
    let quantity = floor_to_step(position_value / entry, params.qty_step);

    if quantity < params.min_qty {
        return Err(SkipReason::SizingRejected {
            detail: format!(
                "quantity {} below exchange minimum {}",
                quantity.normalize(),
                params.min_qty.normalize()
            ),
        });
    }

    let order_value = quantity * entry;
    if order_value < params.min_order_value {
        return Err(SkipReason::SizingRejected {
            detail: format!(
                "order value {} below exchange minimum {}",
                order_value.round_dp(2).normalize(),
                params.min_order_value.normalize()
            ),
        });
    }

    Ok(OrderPlan {
        entry_price: entry,
        stop_loss,
        take_profit,
        quantity,
        position_value,
    })
}
