use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::pnl::{trade_pnl, PercentBase};
use crate::core::{ensure_single_currency, round2};
use crate::error::Result;
use crate::models::{Trade, TradeType};

/// Score given to a metric when there is nothing to measure it on.
pub const NEUTRAL: f64 = 50.0;

/// Leverage at or below this counts as conservative.
const MAX_CONSERVATIVE_LEVERAGE: f64 = 3.0;

/// Trades needed before the first/second half comparison means anything.
const MIN_TREND_SAMPLE: usize = 4;

fn neutral() -> f64 {
    NEUTRAL
}

/// Behavioural rates feeding the trader score, each normalized to 0-100.
///
/// Any field missing from a serialized payload defaults to `NEUTRAL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetrics {
    #[serde(default = "neutral")]
    pub plan_adherence: f64,
    #[serde(default = "neutral")]
    pub impulse_control: f64,
    #[serde(default = "neutral")]
    pub stop_loss_respect: f64,
    #[serde(default = "neutral")]
    pub emotional_control: f64,
    #[serde(default = "neutral")]
    pub lessons_documented: f64,
    #[serde(default = "neutral")]
    pub mistake_avoidance: f64,
    #[serde(default = "neutral")]
    pub improvement_trend: f64,
    #[serde(default = "neutral")]
    pub reflection_completeness: f64,
    #[serde(default = "neutral")]
    pub position_sizing_consistency: f64,
    #[serde(default = "neutral")]
    pub leverage_control: f64,
    #[serde(default = "neutral")]
    pub drawdown_control: f64,
    #[serde(default = "neutral")]
    pub diversification: f64,
    #[serde(default = "neutral")]
    pub stress_management: f64,
    #[serde(default = "neutral")]
    pub loss_recovery: f64,
    #[serde(default = "neutral")]
    pub confidence_calibration: f64,
    #[serde(default = "neutral")]
    pub session_quality: f64,
}

impl Default for BehaviorMetrics {
    fn default() -> Self {
        Self::uniform(NEUTRAL)
    }
}

impl BehaviorMetrics {
    /// Every metric set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            plan_adherence: value,
            impulse_control: value,
            stop_loss_respect: value,
            emotional_control: value,
            lessons_documented: value,
            mistake_avoidance: value,
            improvement_trend: value,
            reflection_completeness: value,
            position_sizing_consistency: value,
            leverage_control: value,
            drawdown_control: value,
            diversification: value,
            stress_management: value,
            loss_recovery: value,
            confidence_calibration: value,
            session_quality: value,
        }
    }

    /// Reduce the journaling fields of `trades` to behavioural rates.
    ///
    /// Trades may arrive in any order; sequence-sensitive metrics sort them by
    /// `trade_date` first. Fails like the aggregate calculator on a malformed
    /// record.
    pub fn from_trades(trades: &[Trade]) -> Result<Self> {
        if trades.is_empty() {
            return Ok(Self::default());
        }
        ensure_single_currency(trades)?;

        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by_key(|t| t.trade_date);

        let mut pnls = Vec::with_capacity(ordered.len());
        for t in &ordered {
            pnls.push(trade_pnl(t, PercentBase::BuyPrice)?.pnl);
        }

        let n = ordered.len() as f64;

        let impulsive = ordered.iter().filter(|t| t.is_impulsive).count() as f64;
        let calm = ordered.iter().filter(|t| t.emotional_state.is_calm()).count() as f64;
        let lessons = ordered
            .iter()
            .filter(|t| has_text(&t.behavior.lessons_learned))
            .count() as f64;
        let reflections = ordered
            .iter()
            .filter(|t| has_text(&t.behavior.reflection))
            .count() as f64;
        let conservative = ordered
            .iter()
            .filter(|t| t.leverage <= MAX_CONSERVATIVE_LEVERAGE)
            .count() as f64;
        let types: HashSet<TradeType> = ordered.iter().map(|t| t.trade_type).collect();

        let metrics = Self {
            plan_adherence: flag_rate(ordered.iter().map(|t| t.behavior.followed_plan)),
            impulse_control: 100.0 - impulsive / n * 100.0,
            stop_loss_respect: flag_rate(ordered.iter().map(|t| t.behavior.stop_loss_respected)),
            emotional_control: calm / n * 100.0,
            lessons_documented: lessons / n * 100.0,
            mistake_avoidance: mistake_avoidance(&ordered),
            improvement_trend: improvement_trend(&pnls),
            reflection_completeness: reflections / n * 100.0,
            position_sizing_consistency: sizing_consistency(&ordered),
            leverage_control: conservative / n * 100.0,
            drawdown_control: drawdown_control(&pnls),
            diversification: types.len() as f64 / TradeType::ALL.len() as f64 * 100.0,
            stress_management: stress_management(&ordered),
            loss_recovery: loss_recovery(&ordered, &pnls),
            confidence_calibration: confidence_calibration(&ordered, &pnls),
            session_quality: session_quality(&ordered),
        };

        Ok(metrics.normalized())
    }

    /// Clamp every metric into 0-100 and round to two decimals. NaN becomes
    /// `NEUTRAL`.
    pub fn normalized(mut self) -> Self {
        for v in self.values_mut() {
            *v = if v.is_finite() {
                round2(v.clamp(0.0, 100.0))
            } else {
                NEUTRAL
            };
        }
        self
    }

    fn values_mut(&mut self) -> [&mut f64; 16] {
        [
            &mut self.plan_adherence,
            &mut self.impulse_control,
            &mut self.stop_loss_respect,
            &mut self.emotional_control,
            &mut self.lessons_documented,
            &mut self.mistake_avoidance,
            &mut self.improvement_trend,
            &mut self.reflection_completeness,
            &mut self.position_sizing_consistency,
            &mut self.leverage_control,
            &mut self.drawdown_control,
            &mut self.diversification,
            &mut self.stress_management,
            &mut self.loss_recovery,
            &mut self.confidence_calibration,
            &mut self.session_quality,
        ]
    }
}

fn has_text(s: &Option<String>) -> bool {
    s.as_deref().map_or(false, |s| !s.trim().is_empty())
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        NEUTRAL
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

fn flag_rate(flags: impl Iterator<Item = Option<bool>>) -> f64 {
    let recorded: Vec<bool> = flags.flatten().collect();
    ratio(recorded.iter().filter(|&&b| b).count(), recorded.len())
}

/// Share of mistake tags that were not seen on an earlier trade.
fn mistake_avoidance(ordered: &[&Trade]) -> f64 {
    let mut seen = HashSet::new();
    let mut total = 0;
    let mut repeats = 0;
    for t in ordered {
        for m in &t.behavior.mistakes {
            let key = m.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            total += 1;
            if !seen.insert(key) {
                repeats += 1;
            }
        }
    }
    ratio(total - repeats, total)
}

/// 50 plus half the win-rate change (in points) from the first half of the
/// journal to the second.
fn improvement_trend(pnls: &[f64]) -> f64 {
    if pnls.len() < MIN_TREND_SAMPLE {
        return NEUTRAL;
    }
    let (early, late) = pnls.split_at(pnls.len() / 2);
    let win_rate = |xs: &[f64]| ratio(xs.iter().filter(|&&p| p > 0.0).count(), xs.len());
    NEUTRAL + (win_rate(late) - win_rate(early)) / 2.0
}

/// 100 minus the coefficient of variation of position notional, in percent.
fn sizing_consistency(ordered: &[&Trade]) -> f64 {
    let notionals: Vec<f64> = ordered
        .iter()
        .filter_map(|t| Some(t.buy_price().ok()? * t.size().ok()?))
        .collect();
    if notionals.len() < 2 {
        return NEUTRAL;
    }
    let n = notionals.len() as f64;
    let mean = notionals.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return NEUTRAL;
    }
    let variance = notionals.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    100.0 * (1.0 - variance.sqrt() / mean)
}

/// Deepest peak-to-trough fall of cumulative P&L, relative to gross profit.
fn drawdown_control(pnls: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for p in pnls {
        equity += p;
        peak = peak.max(equity);
        max_dd = max_dd.max(peak - equity);
    }
    if max_dd <= 0.0 {
        return 100.0;
    }
    let gross_profit: f64 = pnls.iter().filter(|&&p| p > 0.0).sum();
    if gross_profit <= 0.0 {
        return 0.0;
    }
    100.0 * (1.0 - (max_dd / gross_profit).min(1.0))
}

fn stress_management(ordered: &[&Trade]) -> f64 {
    let levels: Vec<f64> = ordered
        .iter()
        .filter_map(|t| t.behavior.stress_level)
        .map(|s| s.clamp(1, 10) as f64)
        .collect();
    if levels.is_empty() {
        return NEUTRAL;
    }
    let avg = levels.iter().sum::<f64>() / levels.len() as f64;
    (10.0 - avg) / 9.0 * 100.0
}

/// Trades taken right after a loss that were neither impulsive nor off-plan.
fn loss_recovery(ordered: &[&Trade], pnls: &[f64]) -> f64 {
    let mut after_loss = 0;
    let mut recovered = 0;
    for i in 1..ordered.len() {
        if pnls[i - 1] >= 0.0 {
            continue;
        }
        after_loss += 1;
        let t = ordered[i];
        if !t.is_impulsive && t.behavior.followed_plan != Some(false) {
            recovered += 1;
        }
    }
    ratio(recovered, after_loss)
}

/// High conviction (6+) should win, low conviction should not.
fn confidence_calibration(ordered: &[&Trade], pnls: &[f64]) -> f64 {
    let mut rated = 0;
    let mut calibrated = 0;
    for (t, &pnl) in ordered.iter().zip(pnls) {
        let Some(conf) = t.behavior.confidence_level else {
            continue;
        };
        if pnl == 0.0 {
            continue;
        }
        rated += 1;
        if (conf >= 6) == (pnl > 0.0) {
            calibrated += 1;
        }
    }
    ratio(calibrated, rated)
}

fn session_quality(ordered: &[&Trade]) -> f64 {
    let ratings: Vec<f64> = ordered
        .iter()
        .filter_map(|t| t.behavior.session_rating)
        .map(|r| r.clamp(1, 5) as f64)
        .collect();
    if ratings.is_empty() {
        return NEUTRAL;
    }
    let avg = ratings.iter().sum::<f64>() / ratings.len() as f64;
    (avg - 1.0) / 4.0 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionalState;
    use crate::test_helpers::TradeBuilder;

    #[test]
    fn empty_journal_is_neutral() {
        assert_eq!(BehaviorMetrics::from_trades(&[]).unwrap(), BehaviorMetrics::default());
    }

    #[test]
    fn missing_fields_deserialize_to_neutral() {
        let m: BehaviorMetrics = serde_json::from_str(r#"{"planAdherence": 90}"#).unwrap();
        assert_eq!(m.plan_adherence, 90.0);
        assert_eq!(m.session_quality, NEUTRAL);
    }

    #[test]
    fn discipline_rates() {
        let trades = vec![
            TradeBuilder::with_pnl("a", 10.0)
                .behavior(|b| {
                    b.followed_plan = Some(true);
                    b.stop_loss_respected = Some(true);
                })
                .build(),
            TradeBuilder::with_pnl("b", -5.0)
                .impulsive()
                .emotion(EmotionalState::Greedy)
                .behavior(|b| {
                    b.followed_plan = Some(false);
                })
                .build(),
            TradeBuilder::with_pnl("c", 3.0)
                .emotion(EmotionalState::Confident)
                .build(),
            TradeBuilder::with_pnl("d", 3.0)
                .emotion(EmotionalState::Anxious)
                .build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        assert_eq!(m.plan_adherence, 50.0);
        assert_eq!(m.stop_loss_respect, 100.0);
        assert_eq!(m.impulse_control, 75.0);
        assert_eq!(m.emotional_control, 50.0);
    }

    #[test]
    fn repeated_mistakes_lower_avoidance() {
        let trades = vec![
            TradeBuilder::with_pnl("a", -1.0)
                .on("2024-03-01")
                .behavior(|b| b.mistakes = vec!["Moved stop".to_string()])
                .build(),
            TradeBuilder::with_pnl("b", -1.0)
                .on("2024-03-02")
                .behavior(|b| {
                    b.mistakes = vec!["moved stop ".to_string(), "oversized".to_string()]
                })
                .build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        // three tags, one repeat
        assert_eq!(m.mistake_avoidance, 66.67);
    }

    #[test]
    fn improvement_compares_halves_chronologically() {
        // given out of order: early losses, late wins
        let trades = vec![
            TradeBuilder::with_pnl("late1", 5.0).on("2024-03-10").build(),
            TradeBuilder::with_pnl("early1", -5.0).on("2024-03-01").build(),
            TradeBuilder::with_pnl("late2", 5.0).on("2024-03-11").build(),
            TradeBuilder::with_pnl("early2", -5.0).on("2024-03-02").build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        assert_eq!(m.improvement_trend, 100.0);
    }

    #[test]
    fn drawdown_relative_to_gross_profit() {
        let trades = vec![
            TradeBuilder::with_pnl("a", 100.0).on("2024-03-01").build(),
            TradeBuilder::with_pnl("b", -25.0).on("2024-03-02").build(),
            TradeBuilder::with_pnl("c", 50.0).on("2024-03-03").build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        // dd 25 of gross profit 150
        assert_eq!(m.drawdown_control, 83.33);
    }

    #[test]
    fn sizing_leverage_and_diversification() {
        let trades = vec![
            TradeBuilder::long("a", 100.0, 101.0, 10.0).kind(TradeType::Stock).build(),
            TradeBuilder::long("b", 100.0, 101.0, 10.0)
                .kind(TradeType::Futures)
                .leverage(10.0)
                .build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        assert_eq!(m.position_sizing_consistency, 100.0);
        assert_eq!(m.leverage_control, 50.0);
        assert_eq!(m.diversification, 40.0);
    }

    #[test]
    fn self_ratings() {
        let trades = vec![
            TradeBuilder::with_pnl("a", 10.0)
                .on("2024-03-01")
                .behavior(|b| {
                    b.confidence_level = Some(8);
                    b.stress_level = Some(1);
                    b.session_rating = Some(5);
                })
                .build(),
            TradeBuilder::with_pnl("b", -10.0)
                .on("2024-03-02")
                .behavior(|b| {
                    b.confidence_level = Some(9);
                    b.stress_level = Some(10);
                    b.session_rating = Some(1);
                })
                .build(),
            TradeBuilder::with_pnl("c", 4.0)
                .on("2024-03-03")
                .impulsive()
                .build(),
        ];
        let m = BehaviorMetrics::from_trades(&trades).unwrap();
        assert_eq!(m.confidence_calibration, 50.0);
        assert_eq!(m.stress_management, 50.0);
        assert_eq!(m.session_quality, 50.0);
        // the only trade after a loss was impulsive
        assert_eq!(m.loss_recovery, 0.0);
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let mut m = BehaviorMetrics::uniform(120.0);
        m.loss_recovery = -3.0;
        m.session_quality = f64::NAN;
        let m = m.normalized();
        assert_eq!(m.plan_adherence, 100.0);
        assert_eq!(m.loss_recovery, 0.0);
        assert_eq!(m.session_quality, NEUTRAL);
    }
}
