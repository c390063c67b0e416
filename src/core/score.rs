use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::core::behavior::{BehaviorMetrics, NEUTRAL};
use crate::core::levels::{LevelBand, LevelTable, NextLevel, MAX_SCORE};
use crate::core::round2;
use crate::core::stats::AggregateStats;
use crate::error::{JournalError, Result};

/// Profit factor that earns a full profitability score.
const TARGET_PROFIT_FACTOR: f64 = 2.0;
/// Average risk-reward that earns a full risk-reward score.
const TARGET_RISK_REWARD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreCategory {
    Discipline,
    Performance,
    Learning,
    RiskManagement,
    EmotionalIntelligence,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 5] = [
        ScoreCategory::Discipline,
        ScoreCategory::Performance,
        ScoreCategory::Learning,
        ScoreCategory::RiskManagement,
        ScoreCategory::EmotionalIntelligence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::Discipline => "discipline",
            ScoreCategory::Performance => "performance",
            ScoreCategory::Learning => "learning",
            ScoreCategory::RiskManagement => "riskManagement",
            ScoreCategory::EmotionalIntelligence => "emotionalIntelligence",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category weights in percent. Must add up to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWeights {
    pub discipline: u32,
    pub performance: u32,
    pub learning: u32,
    pub risk_management: u32,
    pub emotional_intelligence: u32,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            discipline: 25,
            performance: 25,
            learning: 15,
            risk_management: 20,
            emotional_intelligence: 15,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: ScoreCategory) -> u32 {
        match category {
            ScoreCategory::Discipline => self.discipline,
            ScoreCategory::Performance => self.performance,
            ScoreCategory::Learning => self.learning,
            ScoreCategory::RiskManagement => self.risk_management,
            ScoreCategory::EmotionalIntelligence => self.emotional_intelligence,
        }
    }

    pub fn total(&self) -> u32 {
        ScoreCategory::ALL.iter().map(|&c| self.get(c)).sum()
    }

    /// Parse five comma-separated weights in category order, e.g. `25,25,15,20,15`.
    pub fn from_list(s: &str) -> Option<CategoryWeights> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse().ok())
            .collect::<Option<Vec<u32>>>()?;
        match parts.as_slice() {
            &[discipline, performance, learning, risk_management, emotional_intelligence] => {
                Some(CategoryWeights {
                    discipline,
                    performance,
                    learning,
                    risk_management,
                    emotional_intelligence,
                })
            }
            _ => None,
        }
    }
}

/// Weight and level tables for the trader score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: CategoryWeights,
    pub levels: LevelTable,
}

impl ScoringConfig {
    /// Integrity check meant to run once at startup.
    pub fn validate(&self) -> Result<()> {
        let total = self.weights.total();
        if total != 100 {
            return Err(JournalError::InvalidConfig(format!(
                "category weights add up to {}, expected 100",
                total
            )));
        }
        self.levels.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: u32,
    pub metrics: BTreeMap<String, f64>,
}

impl CategoryScore {
    /// Simple mean of the (clamped) metrics.
    pub fn from_metrics(weight: u32, metrics: &[(&str, f64)]) -> Self {
        let clamped: BTreeMap<String, f64> = metrics
            .iter()
            .map(|&(name, v)| (name.to_string(), clamp_score(v)))
            .collect();
        let score = if clamped.is_empty() {
            0.0
        } else {
            clamped.values().sum::<f64>() / clamped.len() as f64
        };
        Self {
            score: clamp_score(score),
            weight,
            metrics: clamped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderScoreBreakdown {
    pub overall: u32,
    pub discipline: CategoryScore,
    pub performance: CategoryScore,
    pub learning: CategoryScore,
    pub risk_management: CategoryScore,
    pub emotional_intelligence: CategoryScore,
    pub level: LevelBand,
    pub next_level: Option<NextLevel>,
}

impl TraderScoreBreakdown {
    pub fn category(&self, category: ScoreCategory) -> &CategoryScore {
        match category {
            ScoreCategory::Discipline => &self.discipline,
            ScoreCategory::Performance => &self.performance,
            ScoreCategory::Learning => &self.learning,
            ScoreCategory::RiskManagement => &self.risk_management,
            ScoreCategory::EmotionalIntelligence => &self.emotional_intelligence,
        }
    }
}

/// Weighted composite score over aggregate stats and behaviour metrics.
///
/// Accepts any input, including an empty journal. Gating insights behind a
/// minimum number of trades is left to the caller.
#[derive(Debug, Clone, Default)]
pub struct TraderScoreCalculator {
    config: ScoringConfig,
}

impl TraderScoreCalculator {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn compute(
        &self,
        stats: &AggregateStats,
        behavior: &BehaviorMetrics,
    ) -> Result<TraderScoreBreakdown> {
        let w = &self.config.weights;

        let discipline = CategoryScore::from_metrics(
            w.discipline,
            &[
                ("planAdherence", behavior.plan_adherence),
                ("impulseControl", behavior.impulse_control),
                ("stopLossRespect", behavior.stop_loss_respect),
                ("emotionalControl", behavior.emotional_control),
            ],
        );
        let performance = CategoryScore::from_metrics(
            w.performance,
            &[
                ("winRate", stats.win_rate),
                ("profitability", profitability(stats)),
                ("riskReward", risk_reward(stats)),
                ("consistency", consistency(stats)),
            ],
        );
        let learning = CategoryScore::from_metrics(
            w.learning,
            &[
                ("lessonsDocumented", behavior.lessons_documented),
                ("mistakeAvoidance", behavior.mistake_avoidance),
                ("improvementTrend", behavior.improvement_trend),
                ("reflectionCompleteness", behavior.reflection_completeness),
            ],
        );
        let risk_management = CategoryScore::from_metrics(
            w.risk_management,
            &[
                ("positionSizingConsistency", behavior.position_sizing_consistency),
                ("leverageControl", behavior.leverage_control),
                ("drawdownControl", behavior.drawdown_control),
                ("diversification", behavior.diversification),
            ],
        );
        let emotional_intelligence = CategoryScore::from_metrics(
            w.emotional_intelligence,
            &[
                ("stressManagement", behavior.stress_management),
                ("lossRecovery", behavior.loss_recovery),
                ("confidenceCalibration", behavior.confidence_calibration),
                ("sessionQuality", behavior.session_quality),
            ],
        );

        self.assemble([
            discipline,
            performance,
            learning,
            risk_management,
            emotional_intelligence,
        ])
    }

    /// Combine category scores, given in `ScoreCategory::ALL` order, into the
    /// overall score and level.
    pub fn assemble(&self, categories: [CategoryScore; 5]) -> Result<TraderScoreBreakdown> {
        let weighted: f64 = categories
            .iter()
            .map(|c| c.score * c.weight as f64 / 100.0)
            .sum();
        let overall = weighted.round().clamp(0.0, MAX_SCORE as f64) as u32;

        let level = self.config.levels.lookup(overall)?.clone();
        let next_level = self.config.levels.next_level(overall)?;

        debug!("Trader score {} ({})", overall, level.name);

        let [discipline, performance, learning, risk_management, emotional_intelligence] =
            categories;
        Ok(TraderScoreBreakdown {
            overall,
            discipline,
            performance,
            learning,
            risk_management,
            emotional_intelligence,
            level,
            next_level,
        })
    }
}

/// Score with the default weight and level tables.
pub fn compute_trader_score(
    stats: &AggregateStats,
    behavior: &BehaviorMetrics,
) -> Result<TraderScoreBreakdown> {
    TraderScoreCalculator::default().compute(stats, behavior)
}

fn clamp_score(v: f64) -> f64 {
    if v.is_finite() {
        round2(v.clamp(0.0, 100.0))
    } else {
        0.0
    }
}

fn profitability(stats: &AggregateStats) -> f64 {
    match stats.profit_factor {
        Some(pf) => (pf / TARGET_PROFIT_FACTOR).min(1.0) * 100.0,
        None if stats.gross_profit > 0.0 => 100.0,
        None => 0.0,
    }
}

fn risk_reward(stats: &AggregateStats) -> f64 {
    stats
        .avg_risk_reward
        .map_or(NEUTRAL, |rr| (rr / TARGET_RISK_REWARD).min(1.0) * 100.0)
}

/// Share of profitable periods in the P&L series.
fn consistency(stats: &AggregateStats) -> f64 {
    if stats.pnl_over_time.is_empty() {
        return NEUTRAL;
    }
    let green = stats.pnl_over_time.iter().filter(|p| p.pnl > 0.0).count();
    green as f64 / stats.pnl_over_time.len() as f64 * 100.0
}
