use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;

/// Side of a closed trade. Parsing any other value yields
/// `JournalError::UnsupportedDirection`, both through `FromStr` and serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TradeDirection {
    BuyLong,
    SellShort,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::BuyLong => "BUY_LONG",
            TradeDirection::SellShort => "SELL_SHORT",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TradeDirection {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY_LONG" => Ok(TradeDirection::BuyLong),
            "SELL_SHORT" => Ok(TradeDirection::SellShort),
            other => Err(JournalError::UnsupportedDirection(other.to_string())),
        }
    }
}

impl TryFrom<String> for TradeDirection {
    type Error = JournalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TradeDirection> for String {
    fn from(d: TradeDirection) -> Self {
        d.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }

    /// Lenient parse used for configuration values.
    pub fn parse(s: &str) -> Option<Currency> {
        match s.trim().to_uppercase().as_str() {
            "INR" => Some(Currency::Inr),
            "USD" => Some(Currency::Usd),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionalState {
    Confident,
    Fearful,
    Greedy,
    Anxious,
    Neutral,
    Excited,
    Frustrated,
}

impl EmotionalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Confident => "CONFIDENT",
            EmotionalState::Fearful => "FEARFUL",
            EmotionalState::Greedy => "GREEDY",
            EmotionalState::Anxious => "ANXIOUS",
            EmotionalState::Neutral => "NEUTRAL",
            EmotionalState::Excited => "EXCITED",
            EmotionalState::Frustrated => "FRUSTRATED",
        }
    }

    /// Calm states count toward emotional control; the rest are reactive.
    pub fn is_calm(self) -> bool {
        matches!(self, EmotionalState::Confident | EmotionalState::Neutral)
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    Crypto,
    Stock,
    Futures,
    Options,
    FundedAccount,
}

impl TradeType {
    pub const ALL: [TradeType; 5] = [
        TradeType::Crypto,
        TradeType::Stock,
        TradeType::Futures,
        TradeType::Options,
        TradeType::FundedAccount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Crypto => "CRYPTO",
            TradeType::Stock => "STOCK",
            TradeType::Futures => "FUTURES",
            TradeType::Options => "OPTIONS",
            TradeType::FundedAccount => "FUNDED_ACCOUNT",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_wire_names() {
        assert_eq!("BUY_LONG".parse::<TradeDirection>(), Ok(TradeDirection::BuyLong));
        assert_eq!(
            "SELL_SHORT".parse::<TradeDirection>(),
            Ok(TradeDirection::SellShort)
        );
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let err = "HOLD".parse::<TradeDirection>().unwrap_err();
        assert_eq!(err, JournalError::UnsupportedDirection("HOLD".to_string()));

        let json = serde_json::from_str::<TradeDirection>("\"SIDEWAYS\"");
        let msg = json.unwrap_err().to_string();
        assert!(msg.contains("unsupported trade direction"), "{}", msg);
    }

    #[test]
    fn enums_serialize_in_screaming_case() {
        assert_eq!(
            serde_json::to_string(&TradeDirection::SellShort).unwrap(),
            "\"SELL_SHORT\""
        );
        assert_eq!(
            serde_json::to_string(&TradeType::FundedAccount).unwrap(),
            "\"FUNDED_ACCOUNT\""
        );
        assert_eq!(serde_json::to_string(&Currency::Inr).unwrap(), "\"INR\"");
        assert_eq!(
            serde_json::from_str::<EmotionalState>("\"FRUSTRATED\"").unwrap(),
            EmotionalState::Frustrated
        );
    }

    #[test]
    fn currency_parse_is_lenient() {
        assert_eq!(Currency::parse(" usd "), Some(Currency::Usd));
        assert_eq!(Currency::parse("eur"), None);
    }
}
