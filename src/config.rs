use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::pnl::PercentBase;
use crate::core::score::{CategoryWeights, ScoringConfig};
use crate::core::stats::StatsOptions;
use crate::error::Result;
use crate::models::{Currency, TimeBucket};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Trade source
    pub trades_file: String,

    // Aggregation
    pub currency: Option<Currency>,
    pub timezone: Tz,
    pub pnl_bucket: TimeBucket,
    pub pnl_percent_base: PercentBase,

    // Scoring
    pub scoring: ScoringConfig,
    /// Trades required before the report shows a trader score. Presentation
    /// policy only; the calculators accept any input.
    pub min_trades_for_insights: usize,
    pub min_sample_per_bucket: usize,

    // Logging
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trades_file: "data/trades.json".to_string(),
            currency: None,
            timezone: Tz::UTC,
            pnl_bucket: TimeBucket::Day,
            pnl_percent_base: PercentBase::BuyPrice,
            scoring: ScoringConfig::default(),
            min_trades_for_insights: 10,
            min_sample_per_bucket: 5,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Build from the environment (and `.env`). Values that fail to parse
    /// fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str| -> Option<String> {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        };

        let defaults = Config::default();

        let currency = env("JOURNAL_CURRENCY").and_then(|v| {
            let parsed = Currency::parse(&v);
            if parsed.is_none() {
                warn!("Ignoring unknown JOURNAL_CURRENCY {:?}", v);
            }
            parsed
        });

        let timezone = env("JOURNAL_TIMEZONE")
            .and_then(|v| match v.parse::<Tz>() {
                Ok(tz) => Some(tz),
                Err(_) => {
                    warn!("Ignoring unknown JOURNAL_TIMEZONE {:?}", v);
                    None
                }
            })
            .unwrap_or(defaults.timezone);

        let pnl_bucket = env("PNL_BUCKET")
            .and_then(|v| TimeBucket::from_str_loose(&v))
            .unwrap_or(defaults.pnl_bucket);

        let pnl_percent_base = env("PNL_PERCENT_BASE")
            .and_then(|v| PercentBase::from_str_loose(&v))
            .unwrap_or(defaults.pnl_percent_base);

        let weights = env("SCORE_WEIGHTS")
            .and_then(|v| CategoryWeights::from_list(&v))
            .unwrap_or_default();

        Config {
            trades_file: env("TRADES_FILE").unwrap_or(defaults.trades_file),
            currency,
            timezone,
            pnl_bucket,
            pnl_percent_base,
            scoring: ScoringConfig {
                weights,
                levels: defaults.scoring.levels,
            },
            min_trades_for_insights: env("MIN_TRADES_FOR_INSIGHTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_trades_for_insights),
            min_sample_per_bucket: env("MIN_SAMPLE_PER_BUCKET")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_sample_per_bucket),
            log_level: env("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Startup integrity check of the scoring tables.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()
    }

    pub fn stats_options(&self) -> StatsOptions {
        StatsOptions {
            currency: self.currency,
            timezone: self.timezone,
            bucket: self.pnl_bucket,
            percent_base: self.pnl_percent_base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.min_trades_for_insights, 10);
        assert_eq!(cfg.stats_options().bucket, TimeBucket::Day);
    }

    #[test]
    fn stats_options_carry_filters() {
        let cfg = Config {
            currency: Some(Currency::Inr),
            timezone: chrono_tz::Asia::Kolkata,
            pnl_bucket: TimeBucket::Month,
            ..Default::default()
        };
        let opts = cfg.stats_options();
        assert_eq!(opts.currency, Some(Currency::Inr));
        assert_eq!(opts.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(opts.bucket, TimeBucket::Month);
    }
}
