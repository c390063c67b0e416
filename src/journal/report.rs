use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::core::behavior::BehaviorMetrics;
use crate::core::breakdown::{Breakdown, TradeBreakdown};
use crate::core::score::{ScoreCategory, TraderScoreBreakdown, TraderScoreCalculator};
use crate::core::stats::{AggregateStats, AggregateStatsCalculator};
use crate::error::Result;
use crate::models::{Currency, Trade};

/// Everything the dashboard shows for one journal, computed in one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalReport {
    pub generated_at: DateTime<Utc>,
    pub currency: Option<Currency>,
    pub stats: AggregateStats,
    pub breakdown: Breakdown,
    pub behavior: BehaviorMetrics,
    /// `None` until the journal holds `min_trades_for_insights` trades.
    pub score: Option<TraderScoreBreakdown>,
    pub trades_until_score: usize,
}

impl JournalReport {
    pub fn build(trades: &[Trade], cfg: &Config) -> Result<Self> {
        let stats_calc = AggregateStatsCalculator::new(cfg.stats_options());
        let stats = stats_calc.compute(trades)?;

        let selected: Vec<Trade> = stats_calc.select(trades).into_iter().cloned().collect();
        let breakdown = TradeBreakdown::new(cfg.min_sample_per_bucket).analyze(&selected)?;
        let behavior = BehaviorMetrics::from_trades(&selected)?;

        let trades_until_score = cfg
            .min_trades_for_insights
            .saturating_sub(stats.total_trades);
        let score = if trades_until_score == 0 && stats.total_trades > 0 {
            let calc = TraderScoreCalculator::new(cfg.scoring.clone())?;
            Some(calc.compute(&stats, &behavior)?)
        } else {
            info!(
                "Trader score needs {} more trade(s) ({} of {})",
                trades_until_score, stats.total_trades, cfg.min_trades_for_insights
            );
            None
        };

        Ok(JournalReport {
            generated_at: Utc::now(),
            currency: cfg.currency,
            stats,
            breakdown,
            behavior,
            score,
            trades_until_score,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn print_summary(&self) {
        let s = &self.stats;
        let ccy = self.currency.map(|c| c.as_str()).unwrap_or("");

        println!("\n{}", "=".repeat(70));
        println!("  TRADING JOURNAL REPORT");
        println!("{}", "=".repeat(70));
        println!(
            "  Generated:   {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        println!();
        println!("  PERFORMANCE {}", ccy);
        println!("  ───────────────────────────────────");
        println!("  Trades:      {}", s.total_trades);
        println!("  Win/Loss:    {} / {}", s.winning_trades, s.losing_trades);
        println!("  Win Rate:    {:.1}%", s.win_rate);
        println!("  Total PnL:   {:+.2}", s.total_pnl);
        println!("  Avg Trade:   {:+.2}", s.avg_profit_per_trade);
        println!("  Best:        {:+.2}", s.largest_win);
        println!("  Worst:       {:+.2}", s.largest_loss);
        match s.profit_factor {
            Some(pf) => println!("  Profit Factor: {:.2}", pf),
            None => println!("  Profit Factor: n/a"),
        }
        if let Some(rr) = s.avg_risk_reward {
            println!("  Avg R:R:     {:.2}", rr);
        }

        if !s.trades_by_type.is_empty() {
            println!();
            println!("  BY TYPE");
            println!("  ───────────────────────────────────");
            for (kind, count) in &s.trades_by_type {
                println!("  {:>14}: {}", kind.as_str(), count);
            }
        }

        if !s.emotional_state_distribution.is_empty() {
            println!();
            println!("  BY EMOTION");
            println!("  ───────────────────────────────────");
            for (emotion, count) in &s.emotional_state_distribution {
                println!("  {:>14}: {}", emotion.as_str(), count);
            }
        }

        if !s.pnl_over_time.is_empty() {
            println!();
            println!("  PNL OVER TIME");
            println!("  ───────────────────────────────────");
            for point in &s.pnl_over_time {
                println!("  {}: {:+.2}", point.date, point.pnl);
            }
        }

        println!();
        println!("  TRADER SCORE");
        println!("  ───────────────────────────────────");
        match &self.score {
            Some(score) => {
                println!("  Overall:     {} ({})", score.overall, score.level.name);
                println!("  {}", score.level.description);
                for c in ScoreCategory::ALL {
                    let cat = score.category(c);
                    println!(
                        "  {:>22}: {:>6.2} (weight {}%)",
                        c.as_str(),
                        cat.score,
                        cat.weight
                    );
                }
                if let Some(next) = &score.next_level {
                    println!("  Next:        {} in {} point(s)", next.name, next.points_needed);
                }
            }
            None => println!(
                "  Locked: journal {} more trade(s) to unlock",
                self.trades_until_score
            ),
        }

        println!("{}", "=".repeat(70));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TradeBuilder;

    #[test]
    fn score_is_gated_by_trade_count() {
        let trades: Vec<Trade> = (0..3)
            .map(|i| TradeBuilder::with_pnl(&format!("t{}", i), 10.0).build())
            .collect();
        let cfg = Config::default();
        let report = JournalReport::build(&trades, &cfg).unwrap();
        assert!(report.score.is_none());
        assert_eq!(report.trades_until_score, 7);

        let cfg = Config {
            min_trades_for_insights: 3,
            ..Default::default()
        };
        let report = JournalReport::build(&trades, &cfg).unwrap();
        let score = report.score.unwrap();
        assert!(score.level.contains(score.overall));
    }

    #[test]
    fn empty_journal_has_no_score() {
        let cfg = Config {
            min_trades_for_insights: 0,
            ..Default::default()
        };
        let report = JournalReport::build(&[], &cfg).unwrap();
        assert!(report.score.is_none());
        assert_eq!(report.stats.total_trades, 0);
    }

    #[test]
    fn currency_filter_applies_to_every_section() {
        let trades = vec![
            TradeBuilder::with_pnl("usd", 10.0).build(),
            TradeBuilder::with_pnl("inr", -10.0)
                .currency(Currency::Inr)
                .impulsive()
                .build(),
        ];
        let cfg = Config {
            currency: Some(Currency::Usd),
            ..Default::default()
        };
        let report = JournalReport::build(&trades, &cfg).unwrap();
        assert_eq!(report.stats.total_trades, 1);
        assert_eq!(report.behavior.impulse_control, 100.0);
        assert!(!report.breakdown[&crate::core::breakdown::Dimension::Currency]
            .contains_key("INR"));
    }

    #[test]
    fn json_round_trips_key_fields() {
        let trades = vec![TradeBuilder::with_pnl("a", 5.0).build()];
        let report = JournalReport::build(&trades, &Config::default()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(v["stats"]["totalPnl"], 5.0);
        assert!(v["score"].is_null());
        assert_eq!(v["tradesUntilScore"], 9);
    }
}
