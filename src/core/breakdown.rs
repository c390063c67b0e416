use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::pnl::{trade_pnl, PercentBase};
use crate::core::{ensure_single_currency, round4};
use crate::error::Result;
use crate::models::Trade;

/// Trade attribute a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    TradeType,
    EmotionalState,
    Direction,
    Currency,
    Impulsive,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::TradeType,
        Dimension::EmotionalState,
        Dimension::Direction,
        Dimension::Currency,
        Dimension::Impulsive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::TradeType => "tradeType",
            Dimension::EmotionalState => "emotionalState",
            Dimension::Direction => "direction",
            Dimension::Currency => "currency",
            Dimension::Impulsive => "impulsive",
        }
    }

    fn key(&self, t: &Trade) -> String {
        match self {
            Dimension::TradeType => t.trade_type.to_string(),
            Dimension::EmotionalState => t.emotional_state.to_string(),
            Dimension::Direction => t.trade_direction.to_string(),
            Dimension::Currency => t.base_currency.to_string(),
            Dimension::Impulsive => {
                if t.is_impulsive {
                    "impulsive".to_string()
                } else {
                    "planned".to_string()
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub dimension: Dimension,
    pub value: String,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    /// Fraction, 0-1.
    pub win_rate: f64,
    pub avg_pnl: f64,
    pub total_pnl: f64,
    pub payoff_ratio: f64,
    /// Expected P&L per trade: `win_rate * avg_win - loss_rate * avg_loss`.
    pub edge: f64,
    pub sample_sufficient: bool,
}

pub type Breakdown = BTreeMap<Dimension, BTreeMap<String, BucketStats>>;

/// Per-dimension performance buckets, e.g. how trades taken while FEARFUL
/// compare with trades taken while CONFIDENT.
pub struct TradeBreakdown {
    pub min_sample: usize,
}

impl TradeBreakdown {
    pub fn new(min_sample: usize) -> Self {
        Self { min_sample }
    }

    pub fn analyze(&self, trades: &[Trade]) -> Result<Breakdown> {
        ensure_single_currency(trades)?;
        let mut pnls = Vec::with_capacity(trades.len());
        for t in trades {
            pnls.push(trade_pnl(t, PercentBase::BuyPrice)?.pnl);
        }

        let mut results = BTreeMap::new();
        for dim in Dimension::ALL {
            let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
            for (t, &pnl) in trades.iter().zip(&pnls) {
                buckets.entry(dim.key(t)).or_default().push(pnl);
            }

            let stats = buckets
                .into_iter()
                .map(|(value, bucket)| {
                    let s = self.compute_stats(dim, &value, &bucket);
                    (value, s)
                })
                .collect();
            results.insert(dim, stats);
        }
        Ok(results)
    }

    /// Buckets with enough trades and a negative edge, worst first.
    pub fn negative_edge_buckets(&self, analysis: &Breakdown) -> Vec<BucketStats> {
        let mut out: Vec<BucketStats> = analysis
            .values()
            .flat_map(|dim_stats| dim_stats.values())
            .filter(|b| b.sample_sufficient && b.edge < 0.0)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.edge.total_cmp(&b.edge));
        out
    }

    /// Buckets with enough trades and a positive edge, best first.
    pub fn strongest_buckets(&self, analysis: &Breakdown) -> Vec<BucketStats> {
        let mut out: Vec<BucketStats> = analysis
            .values()
            .flat_map(|dim_stats| dim_stats.values())
            .filter(|b| b.sample_sufficient && b.edge > 0.0)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.edge.total_cmp(&a.edge));
        out
    }

    fn compute_stats(&self, dimension: Dimension, value: &str, pnls: &[f64]) -> BucketStats {
        let total = pnls.len();
        let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p < 0.0).collect();

        let (win_rate, loss_rate) = if total > 0 {
            (
                wins.len() as f64 / total as f64,
                losses.len() as f64 / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let total_pnl: f64 = pnls.iter().sum();
        let avg_pnl = if total > 0 {
            total_pnl / total as f64
        } else {
            0.0
        };

        let avg_win = if !wins.is_empty() {
            wins.iter().sum::<f64>() / wins.len() as f64
        } else {
            0.0
        };
        let avg_loss = if !losses.is_empty() {
            (losses.iter().sum::<f64>() / losses.len() as f64).abs()
        } else {
            0.0
        };

        let payoff_ratio = if avg_loss > 0.0 {
            avg_win / avg_loss
        } else {
            0.0
        };

        BucketStats {
            dimension,
            value: value.to_string(),
            total,
            wins: wins.len(),
            losses: losses.len(),
            win_rate: round4(win_rate),
            avg_pnl: round4(avg_pnl),
            total_pnl: round4(total_pnl),
            payoff_ratio: round4(payoff_ratio),
            edge: round4(win_rate * avg_win - loss_rate * avg_loss),
            sample_sufficient: total >= self.min_sample,
        }
    }
}
