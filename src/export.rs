//! Debug exports: heightmap and splat PNGs, JSON layout of a finished arena.

use std::fs;
use std::path::Path;

use glam::Vec3;
use image::{ImageBuffer, Rgb, RgbImage};
use serde::Serialize;

use crate::arena::ArenaGenerationResult;
use crate::error::Result;
use crate::peaks::Peak;
use crate::platforms::{ArenaMarkers, PlacedPlatform, SkyLayerReport};
use crate::seeds::ArenaSeeds;
use crate::terrain::{BlendWeights, DeathZone, SplatChannel, TerrainGrid, BLEND_CHANNELS};

const PEAK_MARKER: [u8; 3] = [255, 255, 255];

/// Render heights with the spectral colormap, stretched to the observed range.
/// Peaks, when given, are drawn as white crosses.
pub fn render_heightmap(grid: &TerrainGrid, peaks: &[Peak]) -> RgbImage {
    let heights = grid.heights();
    let (min_h, max_h) = heights.min_max();
    let range = (max_h - min_h).max(f32::EPSILON);
    let mut img: RgbImage = ImageBuffer::new(heights.width as u32, heights.height as u32);

    for (x, z, &h) in heights.iter() {
        let t = ((h - min_h) / range).clamp(0.0, 1.0);
        img.put_pixel(x as u32, z as u32, Rgb(spectral_colormap(t)));
    }

    for peak in peaks {
        draw_cross(&mut img, peak.grid_x, peak.grid_z);
    }
    img
}

/// Spectral colormap (matplotlib style): dark blue -> cyan -> green -> yellow -> orange -> red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64],
        [0.20, 0.53, 0.74],
        [0.40, 0.76, 0.65],
        [0.67, 0.87, 0.64],
        [0.90, 0.96, 0.60],
        [1.00, 1.00, 0.75],
        [1.00, 0.88, 0.55],
        [0.99, 0.68, 0.38],
        [0.96, 0.43, 0.26],
        [0.84, 0.24, 0.31],
        [0.62, 0.00, 0.26],
    ];

    let t_scaled = t.clamp(0.0, 1.0) * 10.0;
    let idx = (t_scaled as usize).min(9);
    let frac = t_scaled - idx as f32;
    mix(colors[idx], colors[idx + 1], frac)
}

fn draw_cross(img: &mut RgbImage, x: usize, z: usize) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for d in -2i64..=2 {
        for (px, pz) in [(x as i64 + d, z as i64), (x as i64, z as i64 + d)] {
            if px >= 0 && pz >= 0 && px < w && pz < h {
                img.put_pixel(px as u32, pz as u32, Rgb(PEAK_MARKER));
            }
        }
    }
}

/// Render blend weights as the weighted mix of each channel's preview colour.
pub fn render_blend_weights(weights: &BlendWeights) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(weights.width() as u32, weights.height() as u32);

    for z in 0..weights.height() {
        for x in 0..weights.width() {
            let w = weights.get(x, z);
            let mut rgb = [0.0f32; 3];
            for (channel, weight) in SplatChannel::ALL.iter().zip(w.iter()) {
                let c = channel.color();
                for i in 0..3 {
                    rgb[i] += c[i] * weight;
                }
            }
            img.put_pixel(x as u32, z as u32, Rgb(to_rgb8(rgb)));
        }
    }
    img
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [u8; 3] {
    to_rgb8([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t])
}

fn to_rgb8(c: [f32; 3]) -> [u8; 3] {
    [
        (c[0].clamp(0.0, 1.0) * 255.0) as u8,
        (c[1].clamp(0.0, 1.0) * 255.0) as u8,
        (c[2].clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

pub fn export_heightmap(grid: &TerrainGrid, peaks: &[Peak], path: impl AsRef<Path>) -> Result<()> {
    render_heightmap(grid, peaks).save(path)?;
    Ok(())
}

pub fn export_blend_weights(weights: &BlendWeights, path: impl AsRef<Path>) -> Result<()> {
    render_blend_weights(weights).save(path)?;
    Ok(())
}

/// Serializable summary of a generated arena.
#[derive(Debug, Serialize)]
pub struct ArenaLayout<'a> {
    pub seeds: ArenaSeeds,
    pub origin: Vec3,
    pub size: Vec3,
    pub terrain_size: Vec3,
    pub heightmap_resolution: [usize; 2],
    pub max_height: f32,
    pub death_zone: DeathZone,
    pub splat_textures: Vec<&'a str>,
    /// Fraction of cells dominated by each splat channel
    pub channel_coverage: [f32; BLEND_CHANNELS],
    pub peaks: &'a [Peak],
    pub platforms: &'a [PlacedPlatform],
    pub sky_layers: Vec<SkyLayerSummary>,
    pub markers: ArenaMarkers,
}

#[derive(Debug, Serialize)]
pub struct SkyLayerSummary {
    pub layer: usize,
    pub base_height: f32,
    pub cells: usize,
    pub platforms: usize,
}

impl From<&SkyLayerReport> for SkyLayerSummary {
    fn from(report: &SkyLayerReport) -> Self {
        Self {
            layer: report.layer.index + 1,
            base_height: report.layer.base_height,
            cells: report.trials.len(),
            platforms: report.placed.len(),
        }
    }
}

impl<'a> ArenaLayout<'a> {
    pub fn from_result(result: &'a ArenaGenerationResult) -> Self {
        let terrain = &result.terrain;
        let grid = &terrain.grid;
        Self {
            seeds: result.seeds,
            origin: result.bounds.origin,
            size: result.bounds.size,
            terrain_size: grid.world_size(),
            heightmap_resolution: [grid.heightmap_width(), grid.heightmap_height()],
            max_height: grid.max_height_world(),
            death_zone: terrain.layout.death_zone,
            splat_textures: terrain.splats.iter().map(|s| s.texture.as_str()).collect(),
            channel_coverage: channel_coverage(&terrain.blend_weights),
            peaks: &result.peaks,
            platforms: &result.platforms,
            sky_layers: result.sky_layers.iter().map(SkyLayerSummary::from).collect(),
            markers: result.markers,
        }
    }
}

fn channel_coverage(weights: &BlendWeights) -> [f32; BLEND_CHANNELS] {
    let mut counts = [0usize; BLEND_CHANNELS];
    for z in 0..weights.height() {
        for x in 0..weights.width() {
            let channel = weights.dominant(x, z);
            if let Some(idx) = SplatChannel::ALL.iter().position(|c| *c == channel) {
                counts[idx] += 1;
            }
        }
    }
    let total = (weights.width() * weights.height()).max(1) as f32;
    counts.map(|c| c as f32 / total)
}

pub fn layout_json(result: &ArenaGenerationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ArenaLayout::from_result(result))?)
}

pub fn export_layout(result: &ArenaGenerationResult, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, layout_json(result)?)?;
    Ok(())
}
