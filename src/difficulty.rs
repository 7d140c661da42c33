//! Session difficulty and the factor it feeds into placement

use serde::{Deserialize, Serialize};

/// Supplies the difficulty factor for one session.
///
/// Ground platforms are scaled by `1 / factor`, so a higher factor means
/// smaller footprints.
pub trait DifficultyProvider {
    fn difficulty_factor(&self) -> f32;
}

/// Difficulty levels offered by the menu
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// Factor per difficulty level
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyFactors {
    pub easy: f32,
    pub medium: f32,
    pub hard: f32,
}

impl Default for DifficultyFactors {
    fn default() -> Self {
        Self {
            easy: 0.5,
            medium: 1.0,
            hard: 1.5,
        }
    }
}

impl DifficultyFactors {
    pub fn factor(&self, level: Difficulty) -> f32 {
        match level {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

impl DifficultyProvider for Difficulty {
    fn difficulty_factor(&self) -> f32 {
        DifficultyFactors::default().factor(*self)
    }
}

/// A difficulty level resolved against configured factors.
#[derive(Clone, Copy, Debug)]
pub struct SessionDifficulty {
    pub level: Difficulty,
    pub factors: DifficultyFactors,
}

impl DifficultyProvider for SessionDifficulty {
    fn difficulty_factor(&self) -> f32 {
        self.factors.factor(self.level)
    }
}

/// A raw factor, mostly useful in tests and tools.
#[derive(Clone, Copy, Debug)]
pub struct FixedDifficulty(pub f32);

impl DifficultyProvider for FixedDifficulty {
    fn difficulty_factor(&self) -> f32 {
        self.0
    }
}
