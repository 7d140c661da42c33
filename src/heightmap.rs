//! Height field synthesis
//!
//! Fractal Perlin noise rescaled into [0, 1], with the border band pulled down
//! into a low ring so the arena edges read as walls of a bowl.

use noise::{NoiseFn, Perlin, Seedable};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{ArenaError, Result};
use crate::tilemap::Tilemap;

// =============================================================================
// PARAMETERS
// =============================================================================

/// Parameters for height field synthesis
#[derive(Clone, Debug, PartialEq)]
pub struct HeightFieldParams {
    /// Grid width in samples
    pub width: usize,
    /// Grid height (depth) in samples
    pub height: usize,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Noise is sampled over `[-extent, extent]` on both axes
    pub extent: f64,
    /// Scale applied after normalizing (keeps terrain below the arena top)
    pub ceiling: f32,
    /// Normalized border threshold
    pub border_height: f32,
    /// Width of the border band in cells
    pub border_thickness: usize,
    /// Push interior lowlands further down into pits
    pub lowland_pits: bool,
}

impl Default for HeightFieldParams {
    fn default() -> Self {
        Self {
            width: 257,
            height: 257,
            octaves: 20,
            persistence: 0.45,
            lacunarity: 2.0,
            extent: 1.5,
            ceiling: 0.5,
            border_height: 0.1,
            border_thickness: 16,
            lowland_pits: true,
        }
    }
}

// =============================================================================
// SYNTHESIZER
// =============================================================================

/// Generates normalized height grids from a seed.
#[derive(Clone, Debug)]
pub struct HeightFieldSynthesizer {
    params: HeightFieldParams,
}

impl HeightFieldSynthesizer {
    pub fn new(params: HeightFieldParams) -> Result<Self> {
        if params.width == 0 || params.height == 0 {
            return Err(ArenaError::invalid(format!(
                "height field dimensions must be positive, got {}x{}",
                params.width, params.height
            )));
        }
        if params.octaves == 0 {
            return Err(ArenaError::invalid("height field needs at least one octave"));
        }
        if !(params.border_height > 0.0 && params.border_height <= 1.0) {
            return Err(ArenaError::invalid(format!(
                "border height must be in (0, 1], got {}",
                params.border_height
            )));
        }
        if !(params.ceiling > 0.0 && params.ceiling <= 1.0) {
            return Err(ArenaError::invalid(format!(
                "height ceiling must be in (0, 1], got {}",
                params.ceiling
            )));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &HeightFieldParams {
        &self.params
    }

    /// Synthesize a grid. The same seed always yields the same grid.
    pub fn synthesize(&self, seed: u64) -> Tilemap<f32> {
        let p = &self.params;
        let noise = Perlin::new(1).set_seed(seed as u32);
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(0xB0B1));

        let border = p.border_height;
        let half_border = border / 2.0;
        let step_x = planar_step(p.extent, p.width);
        let step_z = planar_step(p.extent, p.height);

        let mut heights = Tilemap::new_with(p.width, p.height, 0.0f32);
        for (x, z, h) in heights.iter_mut() {
            let nx = -p.extent + x as f64 * step_x;
            let nz = -p.extent + z as f64 * step_z;
            let raw = fbm(&noise, nx, nz, p.octaves, p.persistence, p.lacunarity);
            let mut value = (((raw + 1.0) * 0.5) as f32).clamp(0.0, 1.0) * p.ceiling;

            let in_band = x < p.border_thickness
                || z < p.border_thickness
                || x + p.border_thickness >= p.width
                || z + p.border_thickness >= p.height;

            if in_band {
                if value > border {
                    let low = rng.gen_range(half_border..=border);
                    value = lerp(value, low, 0.5);
                }
                value = value.clamp(half_border, border);
            } else if p.lowland_pits && value >= half_border && value <= border {
                let low = rng.gen_range(0.0..=half_border);
                value = lerp(value, low, 0.5);
            }

            *h = value;
        }

        heights
    }
}

/// Distance between neighbouring samples on the noise plane.
fn planar_step(extent: f64, samples: usize) -> f64 {
    if samples > 1 {
        2.0 * extent / (samples - 1) as f64
    } else {
        0.0
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fractal Brownian motion normalized by the total amplitude.
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}
