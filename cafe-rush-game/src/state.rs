//! Session state owned by the game session.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Finite-state machine phases for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    #[default]
    Menu,
    Playing,
    Paused,
    Ended,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu" => Ok(Self::Menu),
            "playing" => Ok(Self::Playing),
            "paused" => Ok(Self::Paused),
            "ended" => Ok(Self::Ended),
            _ => Err(()),
        }
    }
}

/// Cafe products stocked as levels are cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductCounts {
    #[serde(default)]
    pub coffee: u32,
    #[serde(default)]
    pub croissant: u32,
    #[serde(default)]
    pub cake: u32,
    #[serde(default)]
    pub drink: u32,
}

impl ProductCounts {
    /// Add the same amount to every category.
    pub fn add_to_all(&mut self, amount: u32) {
        self.coffee = self.coffee.saturating_add(amount);
        self.croissant = self.croissant.saturating_add(amount);
        self.cake = self.cake.saturating_add(amount);
        self.drink = self.drink.saturating_add(amount);
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.coffee + self.croissant + self.cake + self.drink
    }
}

/// Per-run state, exclusively owned by the game session.
///
/// Collaborator modules receive borrows of this value per call; none of them
/// retains a copy across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    pub level: u8,
    pub score: i64,
    pub currency: i64,
    pub combo: u32,
    pub max_combo: u32,
    pub total_taps: u32,
    pub correct_taps: u32,
    pub character_level: u8,
    #[serde(default)]
    pub products: ProductCounts,
    #[serde(default)]
    pub started_at_epoch_ms: i64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Menu,
            level: 1,
            score: 0,
            currency: 0,
            combo: 0,
            max_combo: 0,
            total_taps: 0,
            correct_taps: 0,
            character_level: 1,
            products: ProductCounts::default(),
            started_at_epoch_ms: 0,
        }
    }
}

impl SessionState {
    /// Accuracy over the whole run, in percent.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        if self.correct_taps > 0 {
            f64::from(self.correct_taps) / f64::from(self.total_taps) * 100.0
        } else {
            0.0
        }
    }
}
