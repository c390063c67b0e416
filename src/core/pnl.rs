use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::models::{Trade, TradeDirection};

/// Largest gap tolerated between a stored `pnl` and the recomputed one.
/// Stored values are usually rounded to cents.
const STORED_PNL_TOLERANCE: f64 = 0.01;

/// Capital base used for `pnl_percentage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentBase {
    /// `avg_buy_price * size` for both directions.
    #[default]
    BuyPrice,
    /// Capital actually posted: `avg_buy_price * size / leverage`.
    Margin,
}

impl PercentBase {
    pub fn from_str_loose(s: &str) -> Option<PercentBase> {
        match s.trim().to_lowercase().as_str() {
            "buy_price" | "buy" => Some(PercentBase::BuyPrice),
            "margin" => Some(PercentBase::Margin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlInput {
    pub direction: TradeDirection,
    pub avg_buy_price: f64,
    pub avg_sell_price: f64,
    pub position_size: f64,
    /// Only read by `PercentBase::Margin`.
    pub leverage: f64,
}

impl PnlInput {
    pub fn new(
        direction: TradeDirection,
        avg_buy_price: f64,
        avg_sell_price: f64,
        position_size: f64,
    ) -> Self {
        Self {
            direction,
            avg_buy_price,
            avg_sell_price,
            position_size,
            leverage: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResult {
    pub pnl: f64,
    pub pnl_percentage: f64,
}

/// Realized P&L of one closed trade, using the buy-price percentage base.
pub fn compute_trade_pnl(input: &PnlInput) -> Result<PnlResult> {
    compute_pnl_with(input, PercentBase::BuyPrice)
}

/// The single P&L formula. Every other P&L figure in the crate comes from here.
pub fn compute_pnl_with(input: &PnlInput, base: PercentBase) -> Result<PnlResult> {
    let buy = positive("avgBuyPrice", input.avg_buy_price)?;
    let sell = positive("avgSellPrice", input.avg_sell_price)?;
    let size = positive("positionSize", input.position_size)?;

    let pnl = match input.direction {
        TradeDirection::BuyLong => (sell - buy) * size,
        TradeDirection::SellShort => (buy - sell) * size,
    };

    let capital = match base {
        PercentBase::BuyPrice => buy * size,
        PercentBase::Margin => buy * size / positive("leverage", input.leverage)?,
    };
    let pnl_percentage = pnl / capital * 100.0;

    Ok(PnlResult {
        pnl,
        pnl_percentage,
    })
}

/// P&L of a journaled trade. Any failure is reported against the trade's id,
/// including a stored `pnl` that disagrees with the formula.
pub fn trade_pnl(trade: &Trade, base: PercentBase) -> Result<PnlResult> {
    let input = PnlInput {
        direction: trade.trade_direction,
        avg_buy_price: trade.buy_price()?,
        avg_sell_price: trade.sell_price()?,
        position_size: trade.size()?,
        leverage: trade.leverage,
    };

    let result = compute_pnl_with(&input, base).map_err(|e| JournalError::InvalidTradeRecord {
        id: trade.id.clone(),
        reason: e.to_string(),
    })?;

    if let Some(stored) = trade.pnl {
        if !stored.is_finite() || (stored - result.pnl).abs() > STORED_PNL_TOLERANCE {
            return Err(JournalError::InvalidTradeRecord {
                id: trade.id.clone(),
                reason: format!(
                    "stored pnl {} disagrees with computed pnl {:.4}",
                    stored, result.pnl
                ),
            });
        }
    }

    Ok(result)
}

/// Reward distance over risk distance, measured from the entry price
/// (`avg_buy_price` in either direction).
///
/// Returns `None` unless the stop sits on the losing side of the entry and
/// the target on the winning side.
pub fn risk_reward_ratio(
    direction: TradeDirection,
    entry: f64,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
) -> Option<f64> {
    let (stop, target) = (stop_loss?, take_profit?);
    if !entry.is_finite() || !stop.is_finite() || !target.is_finite() {
        return None;
    }

    let (risk, reward) = match direction {
        TradeDirection::BuyLong => (entry - stop, target - entry),
        TradeDirection::SellShort => (stop - entry, entry - target),
    };

    if risk <= 0.0 || reward <= 0.0 {
        return None;
    }
    Some(reward / risk)
}

/// Risk-reward of a journaled trade, `None` when it lacks the levels.
pub fn trade_risk_reward(trade: &Trade) -> Option<f64> {
    let entry = trade.buy_price().ok()?;
    risk_reward_ratio(
        trade.trade_direction,
        entry,
        trade.stop_loss_price,
        trade.take_profit_price,
    )
}

fn positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(JournalError::InvalidInput { field, value })
    }
}
