use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBand {
    pub name: String,
    pub min_score: u32,
    pub max_score: u32,
    pub description: String,
}

impl LevelBand {
    fn new(name: &str, min_score: u32, max_score: u32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            min_score,
            max_score,
            description: description.to_string(),
        }
    }

    pub fn contains(&self, score: u32) -> bool {
        self.min_score <= score && score <= self.max_score
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextLevel {
    pub name: String,
    pub min_score: u32,
    pub points_needed: u32,
}

/// Ordered score bands. Scores are whole numbers, so consecutive bands
/// meet at `max_score + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    pub bands: Vec<LevelBand>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            bands: vec![
                LevelBand::new(
                    "Novice",
                    0,
                    20,
                    "Just getting started; focus on journaling every trade",
                ),
                LevelBand::new(
                    "Apprentice",
                    21,
                    40,
                    "Building habits; stick to the plan and respect stops",
                ),
                LevelBand::new(
                    "Developing",
                    41,
                    60,
                    "Consistent process with room to tighten risk and emotions",
                ),
                LevelBand::new(
                    "Proficient",
                    61,
                    75,
                    "Disciplined and profitable more often than not",
                ),
                LevelBand::new(
                    "Advanced",
                    76,
                    90,
                    "Strong edge with controlled risk",
                ),
                LevelBand::new(
                    "Master",
                    91,
                    MAX_SCORE,
                    "Elite consistency across every dimension",
                ),
            ],
        }
    }
}

impl LevelTable {
    /// Check the table covers 0..=100 with no gaps or overlaps.
    pub fn validate(&self) -> Result<()> {
        let first = self
            .bands
            .first()
            .ok_or_else(|| JournalError::InvalidConfig("level table is empty".to_string()))?;
        if first.min_score != 0 {
            return Err(JournalError::InvalidConfig(format!(
                "first level {} starts at {}, expected 0",
                first.name, first.min_score
            )));
        }

        for band in &self.bands {
            if band.name.trim().is_empty() {
                return Err(JournalError::InvalidConfig(
                    "level with empty name".to_string(),
                ));
            }
            if band.min_score > band.max_score {
                return Err(JournalError::InvalidConfig(format!(
                    "level {} has min {} above max {}",
                    band.name, band.min_score, band.max_score
                )));
            }
        }

        for pair in self.bands.windows(2) {
            let expected = pair[0].max_score.checked_add(1).ok_or_else(|| {
                JournalError::InvalidConfig(format!(
                    "level {} ends at {} with bands after it",
                    pair[0].name, pair[0].max_score
                ))
            })?;
            if pair[1].min_score != expected {
                return Err(JournalError::InvalidConfig(format!(
                    "levels {} and {} are not contiguous ({} then {})",
                    pair[0].name, pair[1].name, pair[0].max_score, pair[1].min_score
                )));
            }
        }

        let last = &self.bands[self.bands.len() - 1];
        if last.max_score != MAX_SCORE {
            return Err(JournalError::InvalidConfig(format!(
                "last level {} ends at {}, expected {}",
                last.name, last.max_score, MAX_SCORE
            )));
        }
        Ok(())
    }

    pub fn position(&self, score: u32) -> Result<usize> {
        self.bands
            .iter()
            .position(|b| b.contains(score))
            .ok_or(JournalError::NoMatchingLevel(score))
    }

    pub fn lookup(&self, score: u32) -> Result<&LevelBand> {
        Ok(&self.bands[self.position(score)?])
    }

    /// The band right above the one holding `score`, `None` at the top.
    pub fn next_level(&self, score: u32) -> Result<Option<NextLevel>> {
        let idx = self.position(score)?;
        Ok(self.bands.get(idx + 1).map(|next| NextLevel {
            name: next.name.clone(),
            min_score: next.min_score,
            points_needed: next.min_score.saturating_sub(score),
        }))
    }
}
