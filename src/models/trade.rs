use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::models::{Currency, EmotionalState, TradeDirection, TradeType};

/// Optional journaling fields filled in after a trade is closed.
///
/// Every field defaults to "not recorded"; the behaviour reducer only counts
/// trades where the field is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeBehavior {
    #[serde(default)]
    pub followed_plan: Option<bool>,
    #[serde(default)]
    pub stop_loss_respected: Option<bool>,
    #[serde(default)]
    pub lessons_learned: Option<String>,
    #[serde(default)]
    pub mistakes: Vec<String>,
    #[serde(default)]
    pub reflection: Option<String>,
    /// Self-rated conviction before entry, 1-10.
    #[serde(default)]
    pub confidence_level: Option<u8>,
    /// Self-rated stress during the trade, 1-10.
    #[serde(default)]
    pub stress_level: Option<u8>,
    /// Overall session rating, 1-5.
    #[serde(default)]
    pub session_rating: Option<u8>,
}

/// A journaled trade as supplied by the trade store.
///
/// `avg_buy_price` is the entry in both directions: a short opened at 100
/// and covered at 90 is recorded as buy 100, sell 90.
///
/// Prices and size are optional so that a malformed record can still be
/// decoded and reported by id instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    pub trade_direction: TradeDirection,
    #[serde(default)]
    pub avg_buy_price: Option<f64>,
    #[serde(default)]
    pub avg_sell_price: Option<f64>,
    #[serde(default)]
    pub position_size: Option<f64>,
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    pub base_currency: Currency,
    pub emotional_state: EmotionalState,
    pub trade_type: TradeType,
    #[serde(default)]
    pub is_impulsive: bool,
    #[serde(default)]
    pub stop_loss_price: Option<f64>,
    #[serde(default)]
    pub take_profit_price: Option<f64>,
    pub trade_date: DateTime<Utc>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(flatten)]
    pub behavior: TradeBehavior,
}

fn default_leverage() -> f64 {
    1.0
}

impl Trade {
    pub fn buy_price(&self) -> Result<f64> {
        self.required(self.avg_buy_price, "avgBuyPrice")
    }

    pub fn sell_price(&self) -> Result<f64> {
        self.required(self.avg_sell_price, "avgSellPrice")
    }

    pub fn size(&self) -> Result<f64> {
        self.required(self.position_size, "positionSize")
    }

    /// Decode one raw journal record. Any decoding failure, including an
    /// unknown `tradeDirection`, is reported against the record's `id`, or
    /// against `#<index>` when the record has none.
    pub fn from_record(index: usize, record: serde_json::Value) -> Result<Trade> {
        let id = match record.get("id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => format!("#{}", index),
        };
        serde_json::from_value(record).map_err(|e| JournalError::InvalidTradeRecord {
            id,
            reason: e.to_string(),
        })
    }

    fn required(&self, value: Option<f64>, field: &str) -> Result<f64> {
        value.ok_or_else(|| JournalError::InvalidTradeRecord {
            id: self.id.clone(),
            reason: format!("missing {}", field),
        })
    }
}
