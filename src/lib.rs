//! Procedural arena generation library
//!
//! Height-field terrain from fractal noise, texture blend weights, hill peak
//! detection and layered platform placement. Re-exports modules for use by
//! binaries and tools.

pub mod arena;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod export;
pub mod heightmap;
pub mod peaks;
pub mod platforms;
pub mod progress;
pub mod seeds;
pub mod terrain;
pub mod tilemap;

pub use arena::{generate, ArenaGenerationResult, ArenaGenerator, ArenaStage, StepReport};
pub use config::ArenaConfig;
pub use difficulty::{Difficulty, DifficultyFactors, DifficultyProvider, SessionDifficulty};
pub use error::{ArenaError, Result};
pub use progress::{LogProgress, ProgressSink};
pub use seeds::ArenaSeeds;
pub use terrain::{ArenaBounds, TerrainGrid};
