//! Level balance and progression-reward configuration tables.
use serde::{Deserialize, Serialize};

use crate::ending::EndingTable;

const DEFAULT_BALANCE_DATA: &str = include_str!("../assets/balance.json");

/// Per-level balance row.
///
/// `unlock_requirement` is informational (menu display); the engine never
/// gates on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBalance {
    pub level: u8,
    #[serde(default = "default_sequence_length")]
    pub sequence_length: u8,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u16,
    #[serde(default = "default_multiplier")]
    pub score_multiplier: f64,
    #[serde(default)]
    pub unlock_requirement: i64,
}

/// Informational unlock text shown when a level is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressionReward {
    pub level: u8,
    #[serde(default)]
    pub description: String,
}

/// Container for all balance configuration consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BalanceData {
    #[serde(default)]
    pub levels: Vec<LevelBalance>,
    #[serde(default)]
    pub endings: EndingTable,
    #[serde(default)]
    pub rewards: Vec<ProgressionReward>,
}

impl BalanceData {
    /// Create empty balance data (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load balance data from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid balance data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load the embedded default balance tables.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_BALANCE_DATA).unwrap_or_default()
    }

    /// Look up the balance row for a level by exact match.
    ///
    /// `None` past the configured maximum is the natural end-of-run signal,
    /// not an error.
    #[must_use]
    pub fn balance_for(&self, level: u8) -> Option<&LevelBalance> {
        self.levels.iter().find(|row| row.level == level)
    }

    /// Informational reward text for a level, if configured.
    #[must_use]
    pub fn reward_for(&self, level: u8) -> Option<&str> {
        self.rewards
            .iter()
            .find(|reward| reward.level == level)
            .map(|reward| reward.description.as_str())
    }

    /// Highest configured level, 0 when no rows are present.
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.levels.iter().map(|row| row.level).max().unwrap_or(0)
    }
}

fn default_sequence_length() -> u8 {
    5
}

fn default_time_limit() -> u16 {
    15
}

fn default_multiplier() -> f64 {
    1.0
}
