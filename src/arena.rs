//! Arena generation pipeline
//!
//! `ArenaGenerator` is an explicit stage machine. The host calls `step()` once
//! per tick (or `run()` to drive it to completion); each call runs one stage to
//! the end:
//!
//! ```text
//! Terrain(Building..Painted) -> Peaks -> GroundLayer -> SkyLayer(0..n) -> Done
//! ```
//!
//! All configuration is validated in `new`, so a generator that was built
//! successfully only fails on internal sequencing errors.

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::ArenaConfig;
use crate::difficulty::DifficultyProvider;
use crate::error::{ArenaError, Result};
use crate::peaks::{Peak, PeakScanner};
use crate::platforms::{
    ArenaMarkers, LayerDescriptor, PlacedPlatform, PlacementEngine, PlacementOutcome, SkyLayerReport,
};
use crate::progress::{LogProgress, MonotonicProgress, ProgressSink};
use crate::seeds::ArenaSeeds;
use crate::terrain::{ArenaBounds, FinishedTerrain, TerrainBuilder, TerrainStage};

/// Fraction reached once the ground layer starts; sky layers share the rest.
const PLACEMENT_START: f32 = 0.7;

/// Pipeline stages. Each variant names the stage the next `step` runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArenaStage {
    Terrain(TerrainStage),
    Peaks,
    GroundLayer,
    SkyLayer(usize),
    Done,
}

impl std::fmt::Display for ArenaStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Terrain(stage) => write!(f, "terrain ({})", stage),
            Self::Peaks => write!(f, "peaks"),
            Self::GroundLayer => write!(f, "ground layer"),
            Self::SkyLayer(i) => write!(f, "sky layer {}", i + 1),
            Self::Done => write!(f, "done"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Stage the next call will run
    pub stage: ArenaStage,
    pub progress: f32,
}

/// A finished arena.
#[derive(Clone, Debug)]
pub struct ArenaGenerationResult {
    pub seeds: ArenaSeeds,
    pub bounds: ArenaBounds,
    pub terrain: FinishedTerrain,
    pub peaks: Vec<Peak>,
    pub platforms: Vec<PlacedPlatform>,
    pub sky_layers: Vec<SkyLayerReport>,
    pub markers: ArenaMarkers,
}

impl ArenaGenerationResult {
    pub fn ground_platforms(&self) -> impl Iterator<Item = &PlacedPlatform> {
        self.platforms.iter().filter(|p| p.layer.is_ground())
    }

    pub fn sky_platforms(&self) -> impl Iterator<Item = &PlacedPlatform> {
        self.platforms.iter().filter(|p| !p.layer.is_ground())
    }

    pub fn start_platform(&self) -> Option<&PlacedPlatform> {
        self.markers.start().and_then(|i| self.platforms.get(i))
    }

    pub fn exit_platform(&self) -> Option<&PlacedPlatform> {
        self.markers.exit().and_then(|i| self.platforms.get(i))
    }

    /// World position of the terrain's minimum corner
    pub fn terrain_origin(&self) -> Vec3 {
        self.bounds.origin
    }
}

pub struct ArenaGenerator<P: ProgressSink> {
    config: ArenaConfig,
    bounds: ArenaBounds,
    seeds: ArenaSeeds,
    terrain: TerrainBuilder,
    scanner: PeakScanner,
    engine: PlacementEngine,
    progress: MonotonicProgress<P>,
    rng: ChaCha8Rng,
    stage: ArenaStage,
    peaks: Vec<Peak>,
    layers: Vec<LayerDescriptor>,
    outcome: PlacementOutcome,
}

impl<P: ProgressSink> ArenaGenerator<P> {
    /// Validate the configuration and prepare the pipeline. The difficulty
    /// factor is read once, here.
    pub fn new(
        config: ArenaConfig,
        bounds: ArenaBounds,
        seeds: ArenaSeeds,
        difficulty: &dyn DifficultyProvider,
        progress: P,
    ) -> Result<Self> {
        config.validate()?;
        let ground = config.ground_catalog.validate("ground")?;
        let sky = config.sky_catalog.validate("sky")?;
        let engine = PlacementEngine::new(
            ground,
            sky,
            config.sky.clone(),
            difficulty.difficulty_factor(),
        )?;
        let scanner = PeakScanner::new(config.peaks.clone())?;
        let terrain = TerrainBuilder::new(bounds.clone(), config.terrain.clone(), seeds.heightmap)?;

        log::info!("Generating arena {:?} at {:?} ({})", bounds.size, bounds.origin, seeds);

        Ok(Self {
            config,
            bounds,
            seeds,
            terrain,
            scanner,
            engine,
            progress: MonotonicProgress::new(progress),
            rng: ChaCha8Rng::seed_from_u64(seeds.placement),
            stage: ArenaStage::Terrain(TerrainStage::Building),
            peaks: Vec::new(),
            layers: Vec::new(),
            outcome: PlacementOutcome::default(),
        })
    }

    pub fn stage(&self) -> ArenaStage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == ArenaStage::Done
    }

    pub fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Terrain, once the terrain stages have completed.
    pub fn terrain(&self) -> Result<&FinishedTerrain> {
        self.terrain.terrain()
    }

    /// Run the next stage.
    pub fn step(&mut self) -> Result<StepReport> {
        let next = match self.stage {
            ArenaStage::Terrain(_) => {
                let report = self.terrain.step(&mut self.progress)?;
                match report.state {
                    TerrainStage::Ready => ArenaStage::Peaks,
                    state => ArenaStage::Terrain(state),
                }
            }
            ArenaStage::Peaks => {
                self.progress.report("Calculating Hill Peaks", 0.6);
                let terrain = self.terrain.terrain()?;
                self.peaks = self.scanner.scan(&terrain.grid);
                self.layers = self
                    .config
                    .sky
                    .layers(self.bounds.size.y, terrain.grid.max_height_world());
                log::info!(
                    "Found {} hill peaks; planning {} sky layers",
                    self.peaks.len(),
                    self.layers.len()
                );
                ArenaStage::GroundLayer
            }
            ArenaStage::GroundLayer => {
                self.progress.report("Spawning Platform Layers [Ground]", PLACEMENT_START);
                let terrain = self.terrain.terrain()?;
                self.engine.place_ground_layer(
                    &terrain.grid,
                    self.bounds.origin,
                    &self.peaks,
                    &mut self.rng,
                    &mut self.outcome,
                );
                if self.layers.is_empty() {
                    self.complete()
                } else {
                    ArenaStage::SkyLayer(0)
                }
            }
            ArenaStage::SkyLayer(i) => {
                let count = self.layers.len();
                let layer = *self
                    .layers
                    .get(i)
                    .ok_or_else(|| ArenaError::NotReady(format!("sky layer {} was never planned", i + 1)))?;
                let fraction = PLACEMENT_START + i as f32 / count as f32 * (1.0 - PLACEMENT_START);
                self.progress
                    .report(&format!("Spawning Platform Layers [Sky {}]", i + 1), fraction);

                let terrain = self.terrain.terrain()?;
                let is_final = i + 1 == count;
                self.engine.place_sky_layer(
                    &terrain.grid,
                    self.bounds.origin,
                    &layer,
                    is_final,
                    &mut self.rng,
                    &mut self.outcome,
                );
                if is_final {
                    self.complete()
                } else {
                    ArenaStage::SkyLayer(i + 1)
                }
            }
            ArenaStage::Done => ArenaStage::Done,
        };

        self.stage = next;
        Ok(StepReport {
            stage: next,
            progress: self.progress.fraction(),
        })
    }

    /// Step until done.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_done() {
            self.step()?;
        }
        Ok(())
    }

    /// Hand over the finished arena; `NotReady` before the last stage.
    pub fn finish(self) -> Result<ArenaGenerationResult> {
        if !self.is_done() {
            return Err(ArenaError::NotReady(self.stage.to_string()));
        }
        let terrain = self.terrain.into_terrain()?;
        Ok(ArenaGenerationResult {
            seeds: self.seeds,
            bounds: self.bounds,
            terrain,
            peaks: self.peaks,
            platforms: self.outcome.platforms,
            sky_layers: self.outcome.sky_layers,
            markers: self.outcome.markers,
        })
    }

    fn complete(&mut self) -> ArenaStage {
        self.progress.report("Done", 1.0);
        log::info!(
            "{} ground platforms | {} sky platforms",
            self.outcome.ground_count(),
            self.outcome.sky_count()
        );
        ArenaStage::Done
    }
}

/// Generate an arena in one call, reporting progress through the log.
pub fn generate(
    config: ArenaConfig,
    bounds: ArenaBounds,
    seeds: ArenaSeeds,
    difficulty: &dyn DifficultyProvider,
) -> Result<ArenaGenerationResult> {
    let mut generator = ArenaGenerator::new(config, bounds, seeds, difficulty, LogProgress)?;
    generator.run()?;
    generator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{Difficulty, FixedDifficulty};
    use crate::heightmap::{HeightFieldParams, HeightFieldSynthesizer};
    use crate::peaks::{PeakScanParams, SCAN_MARGIN};
    use crate::platforms::{CandidateCatalog, CatalogSlot, SkyLayerParams};
    use crate::progress::ProgressLog;
    use crate::terrain::{TerrainGrid, TerrainParams, DEFAULT_ARENA_SIZE};

    fn fast_config() -> ArenaConfig {
        ArenaConfig {
            terrain: TerrainParams {
                octaves: 6,
                border_thickness: 8,
                ..TerrainParams::default()
            },
            peaks: PeakScanParams {
                height_tolerance: 0.8,
                slope_tolerance: 0.5,
                outer_extent: 20,
                inner_extent: 10,
            },
            ..ArenaConfig::default()
        }
    }

    fn bounds() -> ArenaBounds {
        // 510 / 2 + 1 = 256 samples per side, terrain height 50.
        ArenaBounds::new(Vec3::new(-255.0, 0.0, -255.0), Vec3::new(510.0, 100.0, 510.0))
    }

    fn generate_with_log(seeds: ArenaSeeds) -> (ArenaGenerationResult, ProgressLog) {
        let mut log = ProgressLog::default();
        let result = {
            let mut generator = ArenaGenerator::new(
                fast_config(),
                bounds(),
                seeds,
                &Difficulty::Medium,
                |label: &str, fraction: f32| log.report(label, fraction),
            )
            .unwrap();
            generator.run().unwrap();
            generator.finish().unwrap()
        };
        (result, log)
    }

    #[test]
    fn test_end_to_end_peak_bound_and_ground_count() {
        let synth = HeightFieldSynthesizer::new(HeightFieldParams {
            width: 256,
            height: 256,
            octaves: 10,
            ceiling: 1.0,
            ..HeightFieldParams::default()
        })
        .unwrap();
        let grid = TerrainGrid::new(synth.synthesize(42), Vec3::new(200.0, 50.0, 200.0), 0.1);
        let scanner = PeakScanner::new(PeakScanParams {
            height_tolerance: 0.2,
            slope_tolerance: 0.5,
            outer_extent: 20,
            inner_extent: 10,
        })
        .unwrap();
        let peaks = scanner.scan(&grid);
        let bound = ((256 - 2 * SCAN_MARGIN) / 20).pow(2);
        assert!(peaks.len() <= bound, "{} peaks, bound {}", peaks.len(), bound);

        let config = ArenaConfig::default();
        let engine = PlacementEngine::new(
            config.ground_catalog.validate("ground").unwrap(),
            config.sky_catalog.validate("sky").unwrap(),
            SkyLayerParams::default(),
            1.0,
        )
        .unwrap();
        let mut outcome = PlacementOutcome::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        engine.place_ground_layer(&grid, Vec3::ZERO, &peaks, &mut rng, &mut outcome);
        assert_eq!(outcome.ground_count(), peaks.len());
    }

    #[test]
    fn test_full_pipeline() {
        let (result, log) = generate_with_log(ArenaSeeds::from_master(2024));

        assert_eq!(result.terrain.grid.heightmap_width(), 256);
        assert_eq!(result.ground_platforms().count(), result.peaks.len());
        assert!(!result.sky_layers.is_empty());
        assert_eq!(
            result.sky_platforms().count(),
            result.sky_layers.iter().map(|l| l.placed.len()).sum::<usize>()
        );

        if !result.peaks.is_empty() {
            assert_eq!(result.markers.start(), Some(0));
            assert!(result.start_platform().unwrap().layer.is_ground());
        }
        if let Some(exit) = result.markers.exit() {
            let last = result.sky_layers.last().unwrap();
            assert!(last.placed.contains(&exit));
        }

        // Everything sits inside the arena footprint.
        let min = result.bounds.origin;
        let max = min + result.bounds.size;
        for platform in &result.platforms {
            assert!(platform.position.x >= min.x && platform.position.x <= max.x);
            assert!(platform.position.z >= min.z && platform.position.z <= max.z);
        }

        let labels: Vec<&str> = log.entries.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels.first(), Some(&"Building Terrain Data"));
        assert_eq!(labels.last(), Some(&"Done"));
        assert!(labels.contains(&"Calculating Hill Peaks"));
        assert!(labels.contains(&"Spawning Platform Layers [Sky 1]"));
        assert!(log.entries.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(log.last().map(|(_, f)| *f), Some(1.0));
    }

    #[test]
    fn test_default_config_places_ground_and_start() {
        for master in 0..4u64 {
            let result = generate(
                ArenaConfig::default(),
                ArenaBounds::new(Vec3::ZERO, DEFAULT_ARENA_SIZE),
                ArenaSeeds::from_master(master).placement(master + 100),
                &Difficulty::Medium,
            )
            .unwrap();
            assert!(!result.peaks.is_empty(), "master {} found no peaks", master);
            assert_eq!(result.ground_platforms().count(), result.peaks.len());
            assert!(result.start_platform().is_some());
            assert!(result.sky_platforms().count() > 0);
        }
    }

    #[test]
    fn test_placement_seed_does_not_change_terrain() {
        let (a, _) = generate_with_log(ArenaSeeds::from_master(77).placement(1));
        let (b, _) = generate_with_log(ArenaSeeds::from_master(77).placement(2));

        assert_eq!(a.terrain.grid.heights(), b.terrain.grid.heights());
        assert_eq!(a.peaks, b.peaks);
        assert_eq!(a.ground_platforms().count(), b.ground_platforms().count());
        assert_ne!(a.platforms, b.platforms);
    }

    #[test]
    fn test_same_seeds_reproduce_layout() {
        let seeds = ArenaSeeds::from_master(5).placement(6);
        let (a, _) = generate_with_log(seeds);
        let (b, _) = generate_with_log(seeds);
        assert_eq!(a.platforms, b.platforms);
        assert_eq!(a.markers, b.markers);
    }

    #[test]
    fn test_invalid_config_fails_before_any_stage() {
        let mut config = fast_config();
        config.peaks.inner_extent = 30;
        let mut progress = ProgressLog::default();
        {
            let result = ArenaGenerator::new(
                config,
                bounds(),
                ArenaSeeds::from_master(1),
                &Difficulty::Easy,
                |label: &str, fraction: f32| progress.report(label, fraction),
            );
            assert!(matches!(result, Err(ArenaError::InvalidConfiguration(_))));
        }
        assert!(progress.entries.is_empty());
    }

    #[test]
    fn test_unassigned_catalog_slot_is_fatal() {
        let mut config = fast_config();
        config.sky_catalog = CandidateCatalog::new(vec![CatalogSlot {
            id: None,
            weight: 1.0,
        }]);
        let result = ArenaGenerator::new(config, bounds(), ArenaSeeds::from_master(1), &Difficulty::Easy, LogProgress);
        assert!(matches!(result, Err(ArenaError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_zero_difficulty_is_fatal() {
        let result = ArenaGenerator::new(
            fast_config(),
            bounds(),
            ArenaSeeds::from_master(1),
            &FixedDifficulty(0.0),
            LogProgress,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_finish_before_done_is_not_ready() {
        let mut generator = ArenaGenerator::new(
            fast_config(),
            bounds(),
            ArenaSeeds::from_master(3),
            &Difficulty::Hard,
            ProgressLog::default(),
        )
        .unwrap();
        assert!(matches!(generator.terrain(), Err(ArenaError::NotReady(_))));
        let report = generator.step().unwrap();
        assert_eq!(report.stage, ArenaStage::Terrain(TerrainStage::HeightsApplied));
        assert!(matches!(generator.finish(), Err(ArenaError::NotReady(_))));
    }

    #[test]
    fn test_ground_scale_follows_difficulty() {
        let mut generator = ArenaGenerator::new(
            fast_config(),
            bounds(),
            ArenaSeeds::from_master(11),
            &FixedDifficulty(2.0),
            ProgressLog::default(),
        )
        .unwrap();
        generator.run().unwrap();
        let result = generator.finish().unwrap();
        for platform in result.ground_platforms() {
            assert_eq!(platform.scale, 0.5);
        }
        for platform in result.sky_platforms() {
            assert_eq!(platform.scale, 1.0);
            assert_eq!(platform.yaw, 0.0);
        }
    }
}
