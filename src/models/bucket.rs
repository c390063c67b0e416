use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity of the P&L-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    #[default]
    Day,
    Week,
    Month,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
            TimeBucket::Month => "month",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<TimeBucket> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "1d" => Some(TimeBucket::Day),
            "week" | "weekly" | "1w" => Some(TimeBucket::Week),
            "month" | "monthly" | "1mo" => Some(TimeBucket::Month),
            _ => None,
        }
    }

    /// Key date of the bucket containing `date`: the day itself, the Monday
    /// of its ISO week, or the first of its month.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Week => {
                let offset = date.weekday().num_days_from_monday() as i64;
                date - chrono::Duration::days(offset)
            }
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
