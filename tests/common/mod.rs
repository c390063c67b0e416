use chrono::{DateTime, Utc};
use trade_journal::models::{
    Currency, EmotionalState, Trade, TradeBehavior, TradeDirection, TradeType,
};

pub fn ts(date: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&format!("{}T14:30:00Z", date))
        .unwrap()
        .with_timezone(&Utc)
}

/// A closed USD crypto trade on `date`.
pub fn make_trade(
    id: &str,
    direction: TradeDirection,
    buy: f64,
    sell: f64,
    size: f64,
    date: &str,
) -> Trade {
    Trade {
        id: id.to_string(),
        user_id: Some("trader-1".to_string()),
        symbol: Some("ETH-USD".to_string()),
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
        trade_date: ts(date),
        pnl: None,
        behavior: TradeBehavior::default(),
    }
}

/// A long of size 1 from 1000 whose P&L is exactly `pnl`.
pub fn make_pnl_trade(id: &str, pnl: f64, date: &str) -> Trade {
    make_trade(id, TradeDirection::BuyLong, 1000.0, 1000.0 + pnl, 1.0, date)
}
