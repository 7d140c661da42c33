//! Ground and sky layer placement

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::{weighted_pick, SpawnCandidate};
use super::types::{ArenaMarkers, LayerDescriptor, PlacedPlatform, PlatformLayer, SkyLayerReport, SpawnTrial};
use crate::error::{ArenaError, Result};
use crate::peaks::Peak;
use crate::terrain::TerrainGrid;

/// Height above a platform the ground ray starts from.
const GROUND_RAY_OFFSET: f32 = 1.0;

/// Sky layer tuning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyLayerParams {
    /// Gap between the terrain's highest point and the first layer
    pub base_height_offset: f32,
    /// Vertical distance between layers
    pub layer_interval: f32,
    /// Acceptance probability at the start of each layer and after each spawn
    pub spawn_chance: f32,
    /// Added to the acceptance probability after each rejected cell
    pub spawn_entropy: f32,
    /// Platforms are jittered vertically by up to this much
    pub height_variance: f32,
    /// Maximum excursion of moving platforms; kept clear at the arena edges
    pub boundary_margin: f32,
    /// Sky scan cell size in world units
    pub cell_extent: f32,
    /// Spacing kept between a platform and its cell walls is `inset_extent * 2 + 1`
    pub inset_extent: f32,
}

impl Default for SkyLayerParams {
    fn default() -> Self {
        Self {
            base_height_offset: 15.0,
            layer_interval: 40.0,
            spawn_chance: 0.2,
            spawn_entropy: 0.08,
            height_variance: 4.0,
            boundary_margin: 50.0,
            cell_extent: 40.0,
            inset_extent: 5.0,
        }
    }
}

impl SkyLayerParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.layer_interval > 0.0) {
            return Err(ArenaError::invalid(format!(
                "sky layer interval must be positive, got {}",
                self.layer_interval
            )));
        }
        if !(self.spawn_chance > 0.0) || self.spawn_entropy < 0.0 {
            return Err(ArenaError::invalid(format!(
                "sky spawn chance must be positive and entropy non-negative, got {} / {}",
                self.spawn_chance, self.spawn_entropy
            )));
        }
        if self.height_variance < 0.0 || self.boundary_margin < 0.0 || self.inset_extent < 0.0 {
            return Err(ArenaError::invalid(
                "sky height variance, boundary margin and inset must be non-negative",
            ));
        }
        if !(self.cell_extent > 0.0) {
            return Err(ArenaError::invalid(format!(
                "sky cell extent must be positive, got {}",
                self.cell_extent
            )));
        }
        Ok(())
    }

    /// Number of layers that fit between the terrain top and the arena top.
    pub fn layer_count(&self, arena_height: f32, terrain_max_height: f32) -> usize {
        let span = arena_height - terrain_max_height - self.base_height_offset;
        if span <= 0.0 {
            return 0;
        }
        (span / self.layer_interval).ceil() as usize
    }

    pub fn layers(&self, arena_height: f32, terrain_max_height: f32) -> Vec<LayerDescriptor> {
        (0..self.layer_count(arena_height, terrain_max_height))
            .map(|index| LayerDescriptor {
                index,
                base_height: terrain_max_height + self.base_height_offset + index as f32 * self.layer_interval,
                height_variance: self.height_variance,
                spawn_chance: self.spawn_chance,
                spawn_entropy: self.spawn_entropy,
            })
            .collect()
    }
}

/// Platforms and markers accumulated across layers.
#[derive(Clone, Debug, Default)]
pub struct PlacementOutcome {
    pub platforms: Vec<PlacedPlatform>,
    pub sky_layers: Vec<SkyLayerReport>,
    pub markers: ArenaMarkers,
}

impl PlacementOutcome {
    pub fn ground_count(&self) -> usize {
        self.platforms.iter().filter(|p| p.layer.is_ground()).count()
    }

    pub fn sky_count(&self) -> usize {
        self.platforms.len() - self.ground_count()
    }
}

/// Places platforms on a finished terrain.
pub struct PlacementEngine {
    ground: Vec<SpawnCandidate>,
    sky: Vec<SpawnCandidate>,
    sky_params: SkyLayerParams,
    ground_scale: f32,
}

impl PlacementEngine {
    pub fn new(
        ground: Vec<SpawnCandidate>,
        sky: Vec<SpawnCandidate>,
        sky_params: SkyLayerParams,
        difficulty_factor: f32,
    ) -> Result<Self> {
        if ground.is_empty() || sky.is_empty() {
            return Err(ArenaError::invalid("placement needs non-empty ground and sky catalogs"));
        }
        if !(difficulty_factor > 0.0) {
            return Err(ArenaError::invalid(format!(
                "difficulty factor must be positive, got {}",
                difficulty_factor
            )));
        }
        sky_params.validate()?;

        Ok(Self {
            ground,
            sky,
            sky_params,
            ground_scale: 1.0 / difficulty_factor,
        })
    }

    pub fn sky_params(&self) -> &SkyLayerParams {
        &self.sky_params
    }

    /// Scale applied to every ground platform
    pub fn ground_scale(&self) -> f32 {
        self.ground_scale
    }

    /// One platform per peak, in peak order.
    pub fn place_ground_layer<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainGrid,
        origin: Vec3,
        peaks: &[Peak],
        rng: &mut R,
        outcome: &mut PlacementOutcome,
    ) {
        for peak in peaks {
            let Some(candidate) = weighted_pick(&self.ground, rng) else {
                continue;
            };
            let local = peak.world_position(terrain);
            let yaw = rng.gen_range(0.0..360.0);
            let ray_origin = local + Vec3::Y * GROUND_RAY_OFFSET;
            let ground_normal = terrain.raycast_down(ray_origin).map(|hit| hit.normal);
            if ground_normal.is_none() {
                log::debug!("Ground ray missed at peak ({}, {})", peak.grid_x, peak.grid_z);
            }

            let index = outcome.platforms.len();
            outcome.platforms.push(PlacedPlatform {
                candidate_id: candidate.id.clone(),
                position: origin + local,
                yaw,
                ground_normal,
                scale: self.ground_scale,
                layer: PlatformLayer::Ground,
            });
            outcome.markers.assign_start(index);
        }
        log::info!("Placed {} ground platforms on {} peaks", outcome.ground_count(), peaks.len());
        if outcome.markers.start().is_none() {
            log::warn!("Ground layer placed no platforms; no start assigned");
        }
    }

    /// Scan one sky layer. `is_final` picks the exit platform from this layer.
    pub fn place_sky_layer<R: Rng + ?Sized>(
        &self,
        terrain: &TerrainGrid,
        origin: Vec3,
        layer: &LayerDescriptor,
        is_final: bool,
        rng: &mut R,
        outcome: &mut PlacementOutcome,
    ) {
        let size = terrain.world_size();
        let margin = self.sky_params.boundary_margin;
        let outer = self.sky_params.cell_extent;
        let inset = self.sky_params.inset_extent * 2.0 + 1.0;
        let (min_x, max_x) = (margin, size.x - margin);
        let (min_z, max_z) = (margin, size.z - margin);

        let mut report = SkyLayerReport {
            layer: *layer,
            trials: Vec::new(),
            placed: Vec::new(),
        };
        let mut chance = layer.spawn_chance;

        let mut cell_z = min_z;
        while cell_z + outer <= max_z {
            let mut cell_x = min_x;
            while cell_x + outer <= max_x {
                let accepted = rng.gen::<f32>() < chance;
                report.trials.push(SpawnTrial { chance, accepted });

                if accepted {
                    let x = sample_span(rng, cell_x + inset, cell_x + outer - inset);
                    let z = sample_span(rng, cell_z + inset, cell_z + outer - inset);
                    let jitter = if layer.height_variance > 0.0 {
                        rng.gen_range(-layer.height_variance..=layer.height_variance)
                    } else {
                        0.0
                    };
                    if let Some(candidate) = weighted_pick(&self.sky, rng) {
                        report.placed.push(outcome.platforms.len());
                        outcome.platforms.push(PlacedPlatform {
                            candidate_id: candidate.id.clone(),
                            position: origin + Vec3::new(x, layer.base_height + jitter, z),
                            yaw: 0.0,
                            ground_normal: None,
                            scale: 1.0,
                            layer: PlatformLayer::Sky(layer.index),
                        });
                    }
                    chance = layer.spawn_chance;
                } else {
                    chance += layer.spawn_entropy;
                }
                cell_x += outer;
            }
            cell_z += outer;
        }

        log::debug!(
            "Sky layer {} at {:.1}: {} cells, {} platforms",
            layer.index + 1,
            layer.base_height,
            report.trials.len(),
            report.placed.len()
        );

        if is_final {
            if report.placed.is_empty() {
                log::warn!("Final sky layer {} placed no platforms; no exit assigned", layer.index + 1);
            } else {
                let exit = report.placed[rng.gen_range(0..report.placed.len())];
                outcome.markers.assign_exit(exit);
            }
        }

        outcome.sky_layers.push(report);
    }
}

/// Uniform point in `[lo, hi)`, or the midpoint when the span is empty.
fn sample_span<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        (lo + hi) * 0.5
    }
}
