//! Hill peak detection
//!
//! The interior of the grid is tiled into square cells; each cell contributes
//! at most one peak, the highest sample in its scan window that is both high
//! enough and flat enough to stand a platform on.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::terrain::TerrainGrid;

/// Cells kept clear of peaks along every grid edge.
pub const SCAN_MARGIN: usize = 32;

/// Scan thresholds and tiling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakScanParams {
    /// Fraction of the terrain height a peak may sit below the top (0.0-1.0].
    /// Heights stop at the terrain ceiling, so this must exceed 1 - ceiling.
    pub height_tolerance: f32,
    /// Maximum steepness as a fraction of 90 degrees (0.0-1.0]
    pub slope_tolerance: f32,
    /// Tile size in cells
    pub outer_extent: usize,
    /// Scan window size in cells, anchored at the tile origin
    pub inner_extent: usize,
}

impl Default for PeakScanParams {
    fn default() -> Self {
        Self {
            height_tolerance: 0.8,
            slope_tolerance: 0.4,
            outer_extent: 20,
            inner_extent: 10,
        }
    }
}

impl PeakScanParams {
    pub fn validate(&self) -> Result<()> {
        if self.inner_extent > self.outer_extent {
            return Err(ArenaError::invalid(format!(
                "inner extent {} exceeds outer extent {}",
                self.inner_extent, self.outer_extent
            )));
        }
        if self.inner_extent == 0 {
            return Err(ArenaError::invalid("scan extents must be at least 1"));
        }
        for (name, value) in [
            ("height tolerance", self.height_tolerance),
            ("slope tolerance", self.slope_tolerance),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ArenaError::invalid(format!("{} must be in (0, 1], got {}", name, value)));
            }
        }
        Ok(())
    }
}

/// A qualifying local maximum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub grid_x: usize,
    pub grid_z: usize,
    /// Height in world units
    pub world_height: f32,
}

impl Peak {
    /// Terrain-local world position.
    pub fn world_position(&self, terrain: &TerrainGrid) -> Vec3 {
        let size = terrain.world_size();
        Vec3::new(
            self.grid_x as f32 / terrain.heightmap_width() as f32 * size.x,
            self.world_height,
            self.grid_z as f32 / terrain.heightmap_height() as f32 * size.z,
        )
    }
}

pub struct PeakScanner {
    params: PeakScanParams,
}

impl PeakScanner {
    pub fn new(params: PeakScanParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PeakScanParams {
        &self.params
    }

    /// Scan the finished terrain. Peaks come back in tile order.
    pub fn scan(&self, terrain: &TerrainGrid) -> Vec<Peak> {
        let p = &self.params;
        let width = terrain.heightmap_width();
        let height = terrain.heightmap_height();
        let min_height = terrain.world_size().y * (1.0 - p.height_tolerance);

        let mut peaks = Vec::new();
        if width <= 2 * SCAN_MARGIN || height <= 2 * SCAN_MARGIN {
            log::warn!("Grid {}x{} too small to scan for peaks", width, height);
            return peaks;
        }
        let x_end = width - SCAN_MARGIN;
        let z_end = height - SCAN_MARGIN;

        let mut tiles = 0usize;
        let mut tile_z = SCAN_MARGIN;
        while tile_z + p.outer_extent <= z_end {
            let mut tile_x = SCAN_MARGIN;
            while tile_x + p.outer_extent <= x_end {
                tiles += 1;
                if let Some(peak) = self.scan_window(terrain, tile_x, tile_z, min_height) {
                    peaks.push(peak);
                }
                tile_x += p.outer_extent;
            }
            tile_z += p.outer_extent;
        }

        log::debug!("Scanned {} tiles, found {} peaks (min height {:.1})", tiles, peaks.len(), min_height);
        peaks
    }

    fn scan_window(&self, terrain: &TerrainGrid, tile_x: usize, tile_z: usize, min_height: f32) -> Option<Peak> {
        let width = terrain.heightmap_width() as f32;
        let height = terrain.heightmap_height() as f32;
        let mut best: Option<Peak> = None;

        for z in tile_z..tile_z + self.params.inner_extent {
            for x in tile_x..tile_x + self.params.inner_extent {
                let h = terrain.height(x, z);
                if h < min_height {
                    continue;
                }
                if best.is_some_and(|b| h <= b.world_height) {
                    continue;
                }
                let slope = terrain.steepness(x as f32 / width, z as f32 / height) / 90.0;
                if slope > self.params.slope_tolerance {
                    continue;
                }
                best = Some(Peak {
                    grid_x: x,
                    grid_z: z,
                    world_height: h,
                });
            }
        }

        best
    }
}
