use std::collections::BTreeSet;

use crate::error::{JournalError, Result};
use crate::models::{Currency, Trade};

pub mod behavior;
pub mod breakdown;
pub mod levels;
pub mod pnl;
pub mod score;
pub mod stats;

pub use behavior::BehaviorMetrics;
pub use breakdown::{BucketStats, Dimension, TradeBreakdown};
pub use levels::{LevelBand, LevelTable, NextLevel};
pub use pnl::{compute_trade_pnl, risk_reward_ratio, PercentBase, PnlInput, PnlResult};
pub use score::{compute_trader_score, ScoringConfig, TraderScoreBreakdown, TraderScoreCalculator};
pub use stats::{compute_aggregate_stats, AggregateStats, AggregateStatsCalculator, StatsOptions};

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub(crate) fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

/// Fail when `trades` hold more than one base currency. Money is never
/// summed across currencies.
pub(crate) fn ensure_single_currency<'a>(
    trades: impl IntoIterator<Item = &'a Trade>,
) -> Result<()> {
    let found: BTreeSet<Currency> = trades.into_iter().map(|t| t.base_currency).collect();
    if found.len() > 1 {
        let names: Vec<&str> = found.iter().map(|c| c.as_str()).collect();
        return Err(JournalError::MixedCurrencies(names.join(", ")));
    }
    Ok(())
}
