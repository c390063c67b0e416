use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Currency, EmotionalState, Trade, TradeBehavior, TradeDirection, TradeType,
};

/// Fluent builder for journal trades used across unit tests.
pub struct TradeBuilder {
    trade: Trade,
}

impl TradeBuilder {
    pub fn new(id: &str, direction: TradeDirection, buy: f64, sell: f64, size: f64) -> Self {
        Self {
            trade: Trade {
                id: id.to_string(),
                user_id: Some("u-1".to_string()),
                symbol: Some("BTC-USD".to_string()),
                trade_direction: direction,
                avg_buy_price: Some(buy),
                avg_sell_price: Some(sell),
                position_size: Some(size),
                leverage: 1.0,
                base_currency: Currency::Usd,
                emotional_state: EmotionalState::Neutral,
                trade_type: TradeType::Crypto,
                is_impulsive: false,
                stop_loss_price: None,
                take_profit_price: None,
                trade_date: ts("2024-03-04T10:00:00Z"),
                pnl: None,
                behavior: TradeBehavior::default(),
            },
        }
    }

    pub fn long(id: &str, buy: f64, sell: f64, size: f64) -> Self {
        Self::new(id, TradeDirection::BuyLong, buy, sell, size)
    }

    pub fn short(id: &str, buy: f64, sell: f64, size: f64) -> Self {
        Self::new(id, TradeDirection::SellShort, buy, sell, size)
    }

    /// A long of size 1 from 1000 whose P&L is exactly `pnl`.
    pub fn with_pnl(id: &str, pnl: f64) -> Self {
        Self::long(id, 1000.0, 1000.0 + pnl, 1.0)
    }

    pub fn on(mut self, date: &str) -> Self {
        self.trade.trade_date = ts(&format!("{}T10:00:00Z", date));
        self
    }

    pub fn at(mut self, rfc3339: &str) -> Self {
        self.trade.trade_date = ts(rfc3339);
        self
    }

    pub fn currency(mut self, c: Currency) -> Self {
        self.trade.base_currency = c;
        self
    }

    pub fn emotion(mut self, e: EmotionalState) -> Self {
        self.trade.emotional_state = e;
        self
    }

    pub fn kind(mut self, t: TradeType) -> Self {
        self.trade.trade_type = t;
        self
    }

    pub fn impulsive(mut self) -> Self {
        self.trade.is_impulsive = true;
        self
    }

    pub fn leverage(mut self, l: f64) -> Self {
        self.trade.leverage = l;
        self
    }

    pub fn stored_pnl(mut self, pnl: f64) -> Self {
        self.trade.pnl = Some(pnl);
        self
    }

    pub fn levels(mut self, stop: f64, target: f64) -> Self {
        self.trade.stop_loss_price = Some(stop);
        self.trade.take_profit_price = Some(target);
        self
    }

    pub fn without_size(mut self) -> Self {
        self.trade.position_size = None;
        self
    }

    pub fn behavior(mut self, f: impl FnOnce(&mut TradeBehavior)) -> Self {
        f(&mut self.trade.behavior);
        self
    }

    pub fn build(self) -> Trade {
        self.trade
    }
}

pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
