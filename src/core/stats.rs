use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::pnl::{trade_pnl, trade_risk_reward, PercentBase};
use crate::core::{ensure_single_currency, round4};
use crate::error::Result;
use crate::models::{Currency, EmotionalState, TimeBucket, Trade, TradeType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlPoint {
    pub date: NaiveDate,
    pub pnl: f64,
}

/// Summary statistics over one user's trades in one currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_profit_per_trade: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub gross_profit: f64,
    /// Sum of losing P&L, never positive.
    pub gross_loss: f64,
    /// `None` when there are no losing trades.
    pub profit_factor: Option<f64>,
    pub avg_risk_reward: Option<f64>,
    pub trades_by_type: BTreeMap<TradeType, usize>,
    pub emotional_state_distribution: BTreeMap<EmotionalState, usize>,
    pub pnl_over_time: Vec<PnlPoint>,
}

#[derive(Debug, Clone)]
pub struct StatsOptions {
    /// Only trades in this currency participate. With `None` the batch must
    /// already be single-currency.
    pub currency: Option<Currency>,
    /// Timezone used to truncate `trade_date` to a calendar day.
    pub timezone: Tz,
    pub bucket: TimeBucket,
    pub percent_base: PercentBase,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            currency: None,
            timezone: Tz::UTC,
            bucket: TimeBucket::Day,
            percent_base: PercentBase::BuyPrice,
        }
    }
}

pub struct AggregateStatsCalculator {
    pub options: StatsOptions,
}

impl AggregateStatsCalculator {
    pub fn new(options: StatsOptions) -> Self {
        Self { options }
    }

    /// Trades that pass the currency filter.
    pub fn select<'a>(&self, trades: &'a [Trade]) -> Vec<&'a Trade> {
        trades
            .iter()
            .filter(|t| self.options.currency.map_or(true, |c| t.base_currency == c))
            .collect()
    }

    /// Reduce `trades` to summary statistics.
    ///
    /// Fails on the first malformed record with its id; nothing is returned
    /// for the rest of the batch.
    pub fn compute(&self, trades: &[Trade]) -> Result<AggregateStats> {
        let selected = self.select(trades);
        ensure_single_currency(selected.iter().copied())?;

        let mut pnls = Vec::with_capacity(selected.len());
        for t in &selected {
            pnls.push(trade_pnl(t, self.options.percent_base)?.pnl);
        }

        let total_trades = selected.len();
        let winning_trades = pnls.iter().filter(|&&p| p > 0.0).count();
        let losing_trades = pnls.iter().filter(|&&p| p < 0.0).count();

        let total_pnl: f64 = pnls.iter().sum();
        let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
        let gross_loss: f64 = pnls.iter().filter(|&&p| p < 0.0).sum();

        let (win_rate, avg_profit_per_trade) = if total_trades > 0 {
            (
                winning_trades as f64 / total_trades as f64 * 100.0,
                total_pnl / total_trades as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let profit_factor = if gross_loss < 0.0 {
            Some(round4(gross_profit / gross_loss.abs()))
        } else {
            None
        };

        let ratios: Vec<f64> = selected.iter().filter_map(|t| trade_risk_reward(t)).collect();
        let avg_risk_reward = if ratios.is_empty() {
            None
        } else {
            Some(round4(ratios.iter().sum::<f64>() / ratios.len() as f64))
        };

        let mut trades_by_type = BTreeMap::new();
        let mut emotional_state_distribution = BTreeMap::new();
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (t, pnl) in selected.iter().zip(&pnls) {
            *trades_by_type.entry(t.trade_type).or_insert(0) += 1;
            *emotional_state_distribution
                .entry(t.emotional_state)
                .or_insert(0) += 1;

            let day = t.trade_date.with_timezone(&self.options.timezone).date_naive();
            *buckets
                .entry(self.options.bucket.bucket_start(day))
                .or_insert(0.0) += pnl;
        }

        let pnl_over_time = buckets
            .into_iter()
            .map(|(date, pnl)| PnlPoint {
                date,
                pnl: round4(pnl),
            })
            .collect();

        debug!(
            "Aggregated {} of {} trades: {} wins, {} losses, pnl {:.2}",
            total_trades,
            trades.len(),
            winning_trades,
            losing_trades,
            total_pnl
        );

        Ok(AggregateStats {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: round4(win_rate),
            total_pnl: round4(total_pnl),
            avg_profit_per_trade: round4(avg_profit_per_trade),
            largest_win: round4(pnls.iter().copied().fold(0.0, f64::max)),
            largest_loss: round4(pnls.iter().copied().fold(0.0, f64::min)),
            gross_profit: round4(gross_profit),
            gross_loss: round4(gross_loss),
            profit_factor,
            avg_risk_reward,
            trades_by_type,
            emotional_state_distribution,
            pnl_over_time,
        })
    }
}

/// Statistics with default options: no currency filter, UTC days.
pub fn compute_aggregate_stats(trades: &[Trade]) -> Result<AggregateStats> {
    AggregateStatsCalculator::new(StatsOptions::default()).compute(trades)
}
