use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::path::PathBuf;
use tracing::info;

use crate::models::{Currency, Trade};

/// Which trades a caller wants: one user, one currency, an inclusive
/// date range. Unset fields do not filter.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeQuery {
    pub user_id: Option<String>,
    pub currency: Option<Currency>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Calendar used for `from`/`to`; keep it equal to the stats timezone.
    pub timezone: Tz,
}

impl Default for TradeQuery {
    fn default() -> Self {
        Self {
            user_id: None,
            currency: None,
            from: None,
            to: None,
            timezone: Tz::UTC,
        }
    }
}

impl TradeQuery {
    pub fn matches(&self, t: &Trade) -> bool {
        if let Some(user) = &self.user_id {
            if t.user_id.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(c) = self.currency {
            if t.base_currency != c {
                return false;
            }
        }
        let day = t.trade_date.with_timezone(&self.timezone).date_naive();
        if self.from.map_or(false, |from| day < from) {
            return false;
        }
        if self.to.map_or(false, |to| day > to) {
            return false;
        }
        true
    }
}

/// Source of journaled trades.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn load_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>>;
}

/// Trades held in memory, oldest first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    trades: Vec<Trade>,
}

impl InMemoryStore {
    pub fn new(mut trades: Vec<Trade>) -> Self {
        trades.sort_by_key(|t| t.trade_date);
        Self { trades }
    }

    pub fn insert(&mut self, trade: Trade) {
        let at = self.trades.partition_point(|t| t.trade_date <= trade.trade_date);
        self.trades.insert(at, trade);
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[async_trait]
impl TradeStore for InMemoryStore {
    async fn load_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        Ok(self
            .trades
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }
}

/// Reads a JSON array of trades from disk on every load.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TradeStore for JsonFileStore {
    async fn load_trades(&self, query: &TradeQuery) -> Result<Vec<Trade>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read trades from {}", self.path.display()))?;
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse trades in {}", self.path.display()))?;
        let trades = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| Trade::from_record(i, record))
            .collect::<crate::error::Result<Vec<Trade>>>()
            .with_context(|| format!("Invalid trade in {}", self.path.display()))?;

        let total = trades.len();
        let selected: Vec<Trade> = trades.into_iter().filter(|t| query.matches(t)).collect();
        info!(
            "Loaded {} trades from {} ({} match query)",
            total,
            self.path.display(),
            selected.len()
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JournalError;
    use crate::test_helpers::{date, TradeBuilder};
    use std::io::Write;

    fn store() -> InMemoryStore {
        InMemoryStore::new(vec![
            TradeBuilder::with_pnl("b", 1.0).on("2024-03-05").build(),
            TradeBuilder::with_pnl("a", 1.0).on("2024-03-01").build(),
            TradeBuilder::with_pnl("c", 1.0)
                .on("2024-03-09")
                .currency(Currency::Inr)
                .build(),
        ])
    }

    #[tokio::test]
    async fn in_memory_filters_by_range_and_currency() {
        let s = store();
        let all = s.load_trades(&TradeQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let q = TradeQuery {
            from: Some(date("2024-03-05")),
            to: Some(date("2024-03-09")),
            currency: Some(Currency::Usd),
            ..Default::default()
        };
        let hits = s.load_trades(&q).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn user_filter() {
        let mut s = store();
        let mut other = TradeBuilder::with_pnl("z", 1.0).on("2024-03-02").build();
        other.user_id = Some("u-2".to_string());
        s.insert(other);
        assert_eq!(s.len(), 4);

        let q = TradeQuery {
            user_id: Some("u-2".to_string()),
            ..Default::default()
        };
        let hits = s.load_trades(&q).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "z");
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let s = JsonFileStore::new("/definitely/not/here/trades.json");
        let err = s.load_trades(&TradeQuery::default()).await.unwrap_err();
        assert!(format!("{}", err).contains("/definitely/not/here/trades.json"));
    }

    #[tokio::test]
    async fn date_range_follows_query_timezone() {
        // 20:00 UTC on the 4th is already the 5th in India
        let s = InMemoryStore::new(vec![TradeBuilder::with_pnl("late", 1.0)
            .at("2024-03-04T20:00:00Z")
            .build()]);
        let utc = TradeQuery {
            to: Some(date("2024-03-04")),
            ..Default::default()
        };
        assert_eq!(s.load_trades(&utc).await.unwrap().len(), 1);

        let ist = TradeQuery {
            to: Some(date("2024-03-04")),
            timezone: chrono_tz::Asia::Kolkata,
            ..Default::default()
        };
        assert!(s.load_trades(&ist).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_field_in_file_names_the_record() {
        let raw = r#"[
            {"id": "trade-1", "tradeDirection": "BUY_LONG", "avgBuyPrice": 1.0,
             "avgSellPrice": 2.0, "positionSize": 1.0, "baseCurrency": "USD",
             "emotionalState": "NEUTRAL", "tradeType": "STOCK",
             "tradeDate": "2024-05-01T10:00:00Z"},
            {"id": "trade-99", "tradeDirection": "BUY_LONG", "avgBuyPrice": 1.0,
             "avgSellPrice": 2.0, "positionSize": "abc", "baseCurrency": "USD",
             "emotionalState": "NEUTRAL", "tradeType": "STOCK",
             "tradeDate": "2024-05-01T10:00:00Z"}
        ]"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(raw.as_bytes()).unwrap();

        let err = JsonFileStore::new(file.path())
            .load_trades(&TradeQuery::default())
            .await
            .unwrap_err();
        let journal_err = err.downcast_ref::<JournalError>().unwrap();
        assert_eq!(journal_err.record_id(), Some("trade-99"));
        assert!(journal_err.is_client_error());
    }
}
