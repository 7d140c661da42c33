use rayon::prelude::*;

/// A 2D grid stored row-major (`z` rows of `width` cells).
///
/// Arena grids do not wrap: out-of-range reads go through the clamped
/// accessors, direct indexing past the edge panics.
#[derive(Clone, Debug, PartialEq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a map by evaluating `f(x, z)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for z in 0..height {
            for x in 0..width {
                data.push(f(x, z));
            }
        }
        Self { width, height, data }
    }

    fn index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x < self.width && z < self.height, "({x}, {z}) outside {}x{}", self.width, self.height);
        z * self.width + x
    }

    pub fn get(&self, x: usize, z: usize) -> &T {
        &self.data[self.index(x, z)]
    }

    pub fn set(&mut self, x: usize, z: usize, value: T) {
        let idx = self.index(x, z);
        self.data[idx] = value;
    }

    /// Read with signed coordinates clamped to the grid edge.
    pub fn get_clamped(&self, x: i64, z: i64) -> &T {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cz = z.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cz)
    }

    /// Whether `(x, z)` lies within `band` cells of any edge.
    pub fn is_border(&self, x: usize, z: usize, band: usize) -> bool {
        x < band || z < band || x + band >= self.width || z + band >= self.height
    }

    /// Iterate over all cells with their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| (idx % width, idx / width, val))
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data
            .iter_mut()
            .enumerate()
            .map(move |(idx, val)| (idx % width, idx / width, val))
    }
}

impl<T: Sync> Tilemap<T> {
    /// Build a new map from every cell, evaluated across the rayon pool.
    pub fn par_map<U: Send>(&self, f: impl Fn(usize, usize, &T) -> U + Sync) -> Tilemap<U> {
        let width = self.width;
        let data = self
            .data
            .par_iter()
            .enumerate()
            .map(|(idx, v)| f(idx % width, idx / width, v))
            .collect();
        Tilemap {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl Tilemap<f32> {
    /// Bilinear sample at fractional grid coordinates, clamped to the edges.
    pub fn sample_bilinear(&self, fx: f32, fz: f32) -> f32 {
        let fx = fx.clamp(0.0, (self.width - 1) as f32);
        let fz = fz.clamp(0.0, (self.height - 1) as f32);
        let x0 = fx.floor() as i64;
        let z0 = fz.floor() as i64;
        let tx = fx - x0 as f32;
        let tz = fz - z0 as f32;

        let h00 = *self.get_clamped(x0, z0);
        let h10 = *self.get_clamped(x0 + 1, z0);
        let h01 = *self.get_clamped(x0, z0 + 1);
        let h11 = *self.get_clamped(x0 + 1, z0 + 1);

        let top = h00 + (h10 - h00) * tx;
        let bottom = h01 + (h11 - h01) * tx;
        top + (bottom - top) * tz
    }

    /// Minimum and maximum values in the map.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}
