//! Arena terrain: layout, staged building and the read-only query surface
//!
//! `TerrainBuilder` runs four ordered stages, one per `step()` call, and only
//! publishes the finished `TerrainGrid` and `BlendWeights` once the last stage
//! has completed.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{self, ArenaError, Result};
use crate::heightmap::{HeightFieldParams, HeightFieldSynthesizer};
use crate::progress::ProgressSink;
use crate::tilemap::Tilemap;

/// Number of ground texture channels.
pub const BLEND_CHANNELS: usize = 5;

/// Name of the anchor whose height tracks the border band.
pub const DEATH_ZONE_ANCHOR: &str = "death_zone";

/// Arena extent used when the caller does not supply one.
pub const DEFAULT_ARENA_SIZE: Vec3 = Vec3::new(500.0, 200.0, 500.0);

/// Steepness (fraction of 90 degrees) above which rock takes over from dirt.
const ROCK_STEEPNESS: f32 = 0.65;

// =============================================================================
// ARENA LAYOUT
// =============================================================================

/// A named reference point inside the arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaAnchor {
    pub name: String,
    pub position: Vec3,
}

/// Bounding geometry of one arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    /// World position of the arena's minimum corner
    pub origin: Vec3,
    /// Extent of the arena volume
    pub size: Vec3,
    pub anchors: Vec<ArenaAnchor>,
}

impl ArenaBounds {
    /// Bounds at `origin` with a death zone anchored at the arena floor centre.
    pub fn new(origin: Vec3, size: Vec3) -> Self {
        Self {
            origin,
            size,
            anchors: vec![ArenaAnchor {
                name: DEATH_ZONE_ANCHOR.to_string(),
                position: origin + Vec3::new(size.x * 0.5, 0.0, size.z * 0.5),
            }],
        }
    }

    pub fn anchor(&self, name: &str) -> Result<&ArenaAnchor> {
        self.anchors.iter().find(|a| a.name == name).ok_or_else(|| {
            let available: Vec<String> = self.anchors.iter().map(|a| a.name.clone()).collect();
            error::missing_anchor(name, &available)
        })
    }
}

/// Death zone volume derived from the border band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeathZone {
    pub position: Vec3,
    /// Vertical extent (half the border height, minus one unit of clearance)
    pub height: f32,
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// Terrain tuning, usually loaded as part of `ArenaConfig`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Fraction of the arena height the terrain volume occupies
    pub height_scale: f32,
    /// Normalized height below which cells count as border/lowland
    pub border_height: f32,
    /// Border band width in cells
    pub border_thickness: usize,
    /// World units per heightmap cell
    pub resolution_divisor: usize,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub noise_extent: f64,
    /// Normalized ceiling applied after synthesis
    pub height_ceiling: f32,
    pub lowland_pits: bool,
    /// Texture names for channels 0..5 (grass, dirt, rock, metal, lava)
    pub splat_textures: Vec<String>,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height_scale: 0.5,
            border_height: 0.1,
            border_thickness: 16,
            resolution_divisor: 2,
            octaves: 20,
            persistence: 0.45,
            lacunarity: 2.0,
            noise_extent: 1.5,
            height_ceiling: 0.5,
            lowland_pits: true,
            splat_textures: SplatChannel::ALL.iter().map(|c| c.default_texture().to_string()).collect(),
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.height_scale > 0.0) {
            return Err(ArenaError::invalid(format!(
                "height scale must be positive, got {}",
                self.height_scale
            )));
        }
        if self.resolution_divisor == 0 {
            return Err(ArenaError::invalid("resolution divisor must be at least 1"));
        }
        if self.splat_textures.len() != BLEND_CHANNELS {
            return Err(ArenaError::invalid(format!(
                "expected {} splat textures, got {}",
                BLEND_CHANNELS,
                self.splat_textures.len()
            )));
        }
        if let Some(idx) = self.splat_textures.iter().position(|t| t.trim().is_empty()) {
            return Err(ArenaError::invalid(format!("splat texture slot {} is empty", idx)));
        }
        Ok(())
    }
}

// =============================================================================
// TEXTURE CHANNELS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplatChannel {
    Grass,
    Dirt,
    Rock,
    Metal,
    Lava,
}

impl SplatChannel {
    pub const ALL: [SplatChannel; BLEND_CHANNELS] = [
        SplatChannel::Grass,
        SplatChannel::Dirt,
        SplatChannel::Rock,
        SplatChannel::Metal,
        SplatChannel::Lava,
    ];

    pub fn default_texture(&self) -> &'static str {
        match self {
            SplatChannel::Grass => "grass",
            SplatChannel::Dirt => "dirt",
            SplatChannel::Rock => "rock",
            SplatChannel::Metal => "metal",
            SplatChannel::Lava => "lava",
        }
    }

    /// Preview colour used by the splat export
    pub fn color(&self) -> [f32; 3] {
        match self {
            SplatChannel::Grass => [0.33, 0.62, 0.25],
            SplatChannel::Dirt => [0.55, 0.40, 0.24],
            SplatChannel::Rock => [0.55, 0.55, 0.58],
            SplatChannel::Metal => [0.30, 0.33, 0.40],
            SplatChannel::Lava => [0.95, 0.35, 0.05],
        }
    }
}

/// One texture layer bound to a blend channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplatPrototype {
    pub channel: SplatChannel,
    pub texture: String,
}

// =============================================================================
// TERRAIN GRID
// =============================================================================

/// Where a downward ray met the terrain surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainHit {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Finished, read-only terrain.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    heights: Tilemap<f32>,
    steepness: Tilemap<f32>,
    size: Vec3,
    border_height: f32,
    max_height: f32,
}

impl TerrainGrid {
    /// Wrap a normalized height grid covering `size` world units.
    pub fn new(heights: Tilemap<f32>, size: Vec3, border_height: f32) -> Self {
        let steepness = compute_steepness(&heights, size);
        let (_, max_height) = heights.min_max();
        Self {
            heights,
            steepness,
            size,
            border_height,
            max_height: max_height.max(0.0),
        }
    }

    pub fn heightmap_width(&self) -> usize {
        self.heights.width
    }

    pub fn heightmap_height(&self) -> usize {
        self.heights.height
    }

    pub fn world_size(&self) -> Vec3 {
        self.size
    }

    pub fn heights(&self) -> &Tilemap<f32> {
        &self.heights
    }

    /// Normalized border threshold
    pub fn border_height(&self) -> f32 {
        self.border_height
    }

    pub fn border_height_world(&self) -> f32 {
        self.border_height * self.size.y
    }

    /// Highest normalized sample
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn max_height_world(&self) -> f32 {
        self.max_height * self.size.y
    }

    pub fn normalized_height(&self, x: usize, z: usize) -> f32 {
        *self.heights.get(x, z)
    }

    /// Height in world units at a grid cell.
    pub fn height(&self, x: usize, z: usize) -> f32 {
        self.normalized_height(x, z) * self.size.y
    }

    /// Slope angle in degrees at a grid cell.
    pub fn steepness_at(&self, x: usize, z: usize) -> f32 {
        *self.steepness.get(x, z)
    }

    /// Slope angle in degrees at normalized coordinates `u, v` in [0, 1].
    pub fn steepness(&self, u: f32, v: f32) -> f32 {
        let (x, z) = self.nearest_cell(u, v);
        self.steepness_at(x, z)
    }

    /// World height at normalized coordinates, bilinearly interpolated.
    pub fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        let fx = u * (self.heights.width - 1) as f32;
        let fz = v * (self.heights.height - 1) as f32;
        self.heights.sample_bilinear(fx, fz) * self.size.y
    }

    /// Surface normal at normalized coordinates.
    pub fn normal(&self, u: f32, v: f32) -> Vec3 {
        let (x, z) = self.nearest_cell(u, v);
        let (dx, dz) = gradient(&self.heights, self.size, x, z);
        Vec3::new(-dx, 1.0, -dz).normalize()
    }

    /// Cast straight down from `origin` (terrain-local coordinates).
    ///
    /// Misses when the origin is outside the terrain footprint or already
    /// below the surface.
    pub fn raycast_down(&self, origin: Vec3) -> Option<TerrainHit> {
        if origin.x < 0.0 || origin.z < 0.0 || origin.x > self.size.x || origin.z > self.size.z {
            return None;
        }
        let u = origin.x / self.size.x;
        let v = origin.z / self.size.z;
        let surface = self.interpolated_height(u, v);
        if origin.y < surface {
            return None;
        }
        Some(TerrainHit {
            point: Vec3::new(origin.x, surface, origin.z),
            normal: self.normal(u, v),
        })
    }

    fn nearest_cell(&self, u: f32, v: f32) -> (usize, usize) {
        let x = (u.clamp(0.0, 1.0) * (self.heights.width - 1) as f32).round() as usize;
        let z = (v.clamp(0.0, 1.0) * (self.heights.height - 1) as f32).round() as usize;
        (x, z)
    }
}

/// World-space height gradient (dy/dx, dy/dz) by central differences.
fn gradient(heights: &Tilemap<f32>, size: Vec3, x: usize, z: usize) -> (f32, f32) {
    let cell_x = size.x / (heights.width.max(2) - 1) as f32;
    let cell_z = size.z / (heights.height.max(2) - 1) as f32;
    let (xi, zi) = (x as i64, z as i64);

    let x0 = (xi - 1).max(0);
    let x1 = (xi + 1).min(heights.width as i64 - 1);
    let z0 = (zi - 1).max(0);
    let z1 = (zi + 1).min(heights.height as i64 - 1);

    let dx = if x1 > x0 {
        (heights.get_clamped(x1, zi) - heights.get_clamped(x0, zi)) * size.y / ((x1 - x0) as f32 * cell_x)
    } else {
        0.0
    };
    let dz = if z1 > z0 {
        (heights.get_clamped(xi, z1) - heights.get_clamped(xi, z0)) * size.y / ((z1 - z0) as f32 * cell_z)
    } else {
        0.0
    };
    (dx, dz)
}

fn compute_steepness(heights: &Tilemap<f32>, size: Vec3) -> Tilemap<f32> {
    heights.par_map(|x, z, _| {
        let (dx, dz) = gradient(heights, size, x, z);
        (dx * dx + dz * dz).sqrt().atan().to_degrees()
    })
}

// =============================================================================
// BLEND WEIGHTS
// =============================================================================

/// Per-cell texture weights; every cell sums to 1.
#[derive(Clone, Debug)]
pub struct BlendWeights {
    weights: Tilemap<[f32; BLEND_CHANNELS]>,
}

impl BlendWeights {
    pub fn compute(terrain: &TerrainGrid) -> Self {
        let border_world = terrain.border_height_world();
        let weights = terrain.heights.par_map(|x, z, _| {
            cell_weights(terrain.height(x, z), terrain.steepness_at(x, z), border_world)
        });
        Self { weights }
    }

    pub fn get(&self, x: usize, z: usize) -> [f32; BLEND_CHANNELS] {
        *self.weights.get(x, z)
    }

    pub fn width(&self) -> usize {
        self.weights.width
    }

    pub fn height(&self) -> usize {
        self.weights.height
    }

    /// Channel with the largest weight at a cell.
    pub fn dominant(&self, x: usize, z: usize) -> SplatChannel {
        let w = self.get(x, z);
        let idx = (0..BLEND_CHANNELS)
            .max_by(|&a, &b| w[a].total_cmp(&w[b]))
            .unwrap_or(0);
        SplatChannel::ALL[idx]
    }
}

/// Blend weights for one cell from its world height and slope (degrees).
pub fn cell_weights(height: f32, slope_degrees: f32, border_height_world: f32) -> [f32; BLEND_CHANNELS] {
    let steepness = slope_degrees / 90.0;
    let flatness = 1.0 - steepness * 1.25;
    let mut w = [0.0f32; BLEND_CHANNELS];

    if height <= border_height_world {
        w[3] = steepness + height / 10.0;
        w[4] = flatness;
    } else {
        w[0] = flatness;
        if steepness >= ROCK_STEEPNESS {
            w[1] = flatness * flatness;
            w[2] = steepness;
        } else {
            w[1] = steepness;
        }
    }

    normalize_weights(w, height <= border_height_world)
}

fn normalize_weights(mut w: [f32; BLEND_CHANNELS], lowland: bool) -> [f32; BLEND_CHANNELS] {
    for v in w.iter_mut() {
        *v = v.max(0.0);
    }
    let sum: f32 = w.iter().sum();
    if sum > f32::EPSILON {
        for v in w.iter_mut() {
            *v /= sum;
        }
    } else {
        // Only reachable on degenerate slopes; fall back to the base texture.
        let fallback = if lowland { 4 } else { 0 };
        w = [0.0; BLEND_CHANNELS];
        w[fallback] = 1.0;
    }
    w
}

// =============================================================================
// BUILDER
// =============================================================================

/// Terrain build stages. Each variant names the stage the next `step` runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainStage {
    /// Compute grid resolution and world size
    Building,
    /// Synthesize heights
    HeightsApplied,
    /// Build the texture prototype list
    TexturesBuilt,
    /// Paint blend weights
    Painted,
    /// Finished; terrain is published
    Ready,
}

impl std::fmt::Display for TerrainStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::HeightsApplied => "heights",
            Self::TexturesBuilt => "textures",
            Self::Painted => "painting",
            Self::Ready => "ready",
        };
        write!(f, "{}", name)
    }
}

/// State after a builder step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageReport {
    pub state: TerrainStage,
    pub progress: f32,
}

/// Grid dimensions and world size derived from the arena bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayout {
    pub resolution_x: usize,
    pub resolution_z: usize,
    pub size: Vec3,
    pub border_height_world: f32,
    pub death_zone: DeathZone,
}

impl TerrainLayout {
    pub fn from_bounds(bounds: &ArenaBounds, params: &TerrainParams) -> Result<Self> {
        let death_anchor = bounds.anchor(DEATH_ZONE_ANCHOR)?;

        let res_x = bounds.size.x.round().max(0.0) as usize;
        let res_y = (bounds.size.y * params.height_scale).round().max(0.0);
        let res_z = bounds.size.z.round().max(0.0) as usize;
        if res_x == 0 || res_z == 0 || res_y <= 0.0 {
            return Err(ArenaError::invalid(format!(
                "arena bounds {:?} produce an empty terrain",
                bounds.size
            )));
        }

        let size = Vec3::new(res_x as f32, res_y, res_z as f32);
        let border_height_world = params.border_height * size.y;

        Ok(Self {
            resolution_x: res_x / params.resolution_divisor + 1,
            resolution_z: res_z / params.resolution_divisor + 1,
            size,
            border_height_world,
            death_zone: DeathZone {
                position: death_anchor.position,
                height: border_height_world / 2.0 - 1.0,
            },
        })
    }
}

/// Everything the builder publishes on completion.
#[derive(Clone, Debug)]
pub struct FinishedTerrain {
    pub grid: TerrainGrid,
    pub blend_weights: BlendWeights,
    pub splats: Vec<SplatPrototype>,
    pub layout: TerrainLayout,
}

/// Staged terrain builder for one arena.
pub struct TerrainBuilder {
    bounds: ArenaBounds,
    params: TerrainParams,
    seed: u64,
    state: TerrainStage,
    layout: Option<TerrainLayout>,
    heights: Option<Tilemap<f32>>,
    splats: Vec<SplatPrototype>,
    finished: Option<FinishedTerrain>,
}

impl TerrainBuilder {
    /// Validates everything up front so no stage can fail on configuration.
    pub fn new(bounds: ArenaBounds, params: TerrainParams, seed: u64) -> Result<Self> {
        params.validate()?;
        let layout = TerrainLayout::from_bounds(&bounds, &params)?;
        HeightFieldSynthesizer::new(Self::height_field_params(&params, &layout))?;

        Ok(Self {
            bounds,
            params,
            seed,
            state: TerrainStage::Building,
            layout: None,
            heights: None,
            splats: Vec::new(),
            finished: None,
        })
    }

    pub fn state(&self) -> TerrainStage {
        self.state
    }

    pub fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    /// Run the next stage.
    pub fn step(&mut self, progress: &mut dyn ProgressSink) -> Result<StageReport> {
        let (next, fraction) = match self.state {
            TerrainStage::Building => {
                progress.report("Building Terrain Data", 0.05);
                let layout = TerrainLayout::from_bounds(&self.bounds, &self.params)?;
                log::debug!(
                    "Terrain layout: {}x{} samples, size {:?}, death zone height {:.1}",
                    layout.resolution_x,
                    layout.resolution_z,
                    layout.size,
                    layout.death_zone.height
                );
                self.layout = Some(layout);
                (TerrainStage::HeightsApplied, 0.05)
            }
            TerrainStage::HeightsApplied => {
                progress.report("Applying Heightmap", 0.35);
                let layout = self.layout()?;
                let synth = HeightFieldSynthesizer::new(Self::height_field_params(&self.params, &layout))?;
                let heights = synth.synthesize(self.seed);
                let (min_h, max_h) = heights.min_max();
                log::debug!("Heightmap range: {:.3} to {:.3} (normalized)", min_h, max_h);
                self.heights = Some(heights);
                (TerrainStage::TexturesBuilt, 0.35)
            }
            TerrainStage::TexturesBuilt => {
                progress.report("Building Texture Data", 0.40);
                self.splats = SplatChannel::ALL
                    .iter()
                    .zip(&self.params.splat_textures)
                    .map(|(&channel, texture)| SplatPrototype {
                        channel,
                        texture: texture.clone(),
                    })
                    .collect();
                (TerrainStage::Painted, 0.40)
            }
            TerrainStage::Painted => {
                progress.report("Applying Textures", 0.50);
                let layout = self.layout()?;
                let heights = self
                    .heights
                    .take()
                    .ok_or_else(|| ArenaError::NotReady(self.state.to_string()))?;
                let grid = TerrainGrid::new(heights, layout.size, self.params.border_height);
                let blend_weights = BlendWeights::compute(&grid);
                log::info!(
                    "Terrain ready: {}x{} samples, max height {:.1}",
                    grid.heightmap_width(),
                    grid.heightmap_height(),
                    grid.max_height_world()
                );
                self.finished = Some(FinishedTerrain {
                    grid,
                    blend_weights,
                    splats: std::mem::take(&mut self.splats),
                    layout,
                });
                (TerrainStage::Ready, 0.50)
            }
            TerrainStage::Ready => (TerrainStage::Ready, 0.50),
        };

        self.state = next;
        Ok(StageReport {
            state: next,
            progress: fraction,
        })
    }

    /// The published terrain, or `NotReady` before the last stage completes.
    pub fn terrain(&self) -> Result<&FinishedTerrain> {
        self.finished
            .as_ref()
            .ok_or_else(|| ArenaError::NotReady(self.state.to_string()))
    }

    pub fn into_terrain(self) -> Result<FinishedTerrain> {
        let state = self.state;
        self.finished.ok_or_else(|| ArenaError::NotReady(state.to_string()))
    }

    fn layout(&self) -> Result<TerrainLayout> {
        self.layout.ok_or_else(|| ArenaError::NotReady(self.state.to_string()))
    }

    fn height_field_params(params: &TerrainParams, layout: &TerrainLayout) -> HeightFieldParams {
        HeightFieldParams {
            width: layout.resolution_x,
            height: layout.resolution_z,
            octaves: params.octaves,
            persistence: params.persistence,
            lacunarity: params.lacunarity,
            extent: params.noise_extent,
            ceiling: params.height_ceiling,
            border_height: params.border_height,
            border_thickness: params.border_thickness,
            lowland_pits: params.lowland_pits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressLog;

    fn small_bounds() -> ArenaBounds {
        ArenaBounds::new(Vec3::ZERO, Vec3::new(128.0, 100.0, 96.0))
    }

    fn fast_params() -> TerrainParams {
        TerrainParams {
            octaves: 5,
            border_thickness: 4,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn test_layout_from_bounds() {
        let layout = TerrainLayout::from_bounds(&small_bounds(), &fast_params()).unwrap();
        assert_eq!(layout.resolution_x, 65);
        assert_eq!(layout.resolution_z, 49);
        assert_eq!(layout.size, Vec3::new(128.0, 50.0, 96.0));
        assert!((layout.border_height_world - 5.0).abs() < 1e-5);
        assert!((layout.death_zone.height - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_missing_death_zone_anchor() {
        let mut bounds = small_bounds();
        bounds.anchors.clear();
        assert!(matches!(
            TerrainBuilder::new(bounds, fast_params(), 1),
            Err(ArenaError::MissingAnchor { .. })
        ));
    }

    #[test]
    fn test_wrong_texture_count_rejected() {
        let mut params = fast_params();
        params.splat_textures.pop();
        assert!(matches!(
            TerrainBuilder::new(small_bounds(), params, 1),
            Err(ArenaError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_stages_run_in_order_and_publish_last() {
        let mut builder = TerrainBuilder::new(small_bounds(), fast_params(), 99).unwrap();
        let mut progress = ProgressLog::default();
        let expected = [
            TerrainStage::HeightsApplied,
            TerrainStage::TexturesBuilt,
            TerrainStage::Painted,
            TerrainStage::Ready,
        ];

        for stage in expected {
            assert!(matches!(builder.terrain(), Err(ArenaError::NotReady(_))));
            let report = builder.step(&mut progress).unwrap();
            assert_eq!(report.state, stage);
        }

        let labels: Vec<&str> = progress.entries.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Building Terrain Data", "Applying Heightmap", "Building Texture Data", "Applying Textures"]
        );
        assert!(progress.entries.windows(2).all(|w| w[0].1 <= w[1].1));

        let terrain = builder.terrain().unwrap();
        assert_eq!(terrain.splats.len(), BLEND_CHANNELS);
        assert_eq!(terrain.grid.heightmap_width(), 65);

        // Stepping a finished builder changes nothing.
        let again = builder.step(&mut progress).unwrap();
        assert_eq!(again.state, TerrainStage::Ready);
        assert_eq!(progress.entries.len(), 4);
    }

    #[test]
    fn test_flat_grid_steepness_and_normal() {
        let grid = TerrainGrid::new(Tilemap::new_with(9, 9, 0.5), Vec3::new(16.0, 10.0, 16.0), 0.1);
        assert_eq!(grid.steepness(0.5, 0.5), 0.0);
        assert!((grid.normal(0.3, 0.7) - Vec3::Y).length() < 1e-6);
        let hit = grid.raycast_down(Vec3::new(8.0, 6.0, 8.0)).unwrap();
        assert!((hit.point.y - 5.0).abs() < 1e-5);
        assert!(grid.raycast_down(Vec3::new(8.0, 4.0, 8.0)).is_none());
        assert!(grid.raycast_down(Vec3::new(-1.0, 6.0, 8.0)).is_none());
    }

    #[test]
    fn test_ramp_steepness_is_45_degrees() {
        // 1 world unit per cell horizontally, rising 1 unit per cell.
        let heights = Tilemap::from_fn(11, 11, |x, _| x as f32 / 10.0);
        let grid = TerrainGrid::new(heights, Vec3::new(10.0, 10.0, 10.0), 0.1);
        assert!((grid.steepness_at(5, 5) - 45.0).abs() < 1e-3);
        let n = grid.normal(0.5, 0.5);
        assert!(n.x < 0.0 && n.y > 0.0);
    }

    #[test]
    fn test_cell_weights_lowland_uses_metal_and_lava() {
        let w = cell_weights(2.0, 9.0, 5.0);
        assert_eq!(&w[0..3], &[0.0, 0.0, 0.0]);
        assert!(w[3] > 0.0 && w[4] > 0.0);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cell_weights_steep_slope_uses_rock() {
        let w = cell_weights(20.0, 63.0, 5.0);
        assert!(w[2] > w[1]);
        assert_eq!(w[3], 0.0);
        assert_eq!(w[4], 0.0);

        let gentle = cell_weights(20.0, 18.0, 5.0);
        assert_eq!(gentle[2], 0.0);
        assert!(gentle[0] > gentle[1]);
    }

    #[test]
    fn test_blend_weights_sum_to_one() {
        let mut builder = TerrainBuilder::new(small_bounds(), fast_params(), 5).unwrap();
        let mut progress = ProgressLog::default();
        while builder.state() != TerrainStage::Ready {
            builder.step(&mut progress).unwrap();
        }
        let terrain = builder.terrain().unwrap();
        let weights = &terrain.blend_weights;
        for z in 0..weights.height() {
            for x in 0..weights.width() {
                let sum: f32 = weights.get(x, z).iter().sum();
                assert!((sum - 1.0).abs() < 1e-4);
            }
        }
    }
}
