//! Arena configuration
//!
//! Every section has defaults, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "peaks": { "height_tolerance": 0.7 }, "sky": { "layer_interval": 30.0 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyFactors;
use crate::error::{ArenaError, Result};
use crate::peaks::PeakScanParams;
use crate::platforms::{CandidateCatalog, SkyLayerParams};
use crate::terrain::TerrainParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub terrain: TerrainParams,
    pub peaks: PeakScanParams,
    pub sky: SkyLayerParams,
    pub ground_catalog: CandidateCatalog,
    pub sky_catalog: CandidateCatalog,
    pub difficulty_factors: DifficultyFactors,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            peaks: PeakScanParams::default(),
            sky: SkyLayerParams::default(),
            ground_catalog: CandidateCatalog::default_ground(),
            sky_catalog: CandidateCatalog::default_sky(),
            difficulty_factors: DifficultyFactors::default(),
        }
    }
}

impl ArenaConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded arena config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.terrain.validate()?;
        self.peaks.validate()?;
        self.sky.validate()?;
        self.ground_catalog.validate("ground")?;
        self.sky_catalog.validate("sky")?;

        let f = &self.difficulty_factors;
        for (name, value) in [("easy", f.easy), ("medium", f.medium), ("hard", f.hard)] {
            if !(value > 0.0) {
                return Err(ArenaError::invalid(format!(
                    "{} difficulty factor must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
