//! Volumetric hair interaction grid.
//!
//! A coarse voxel grid spanning the bounding box of the hair vertices.
//! Points are splatted into the 8 cells around them with tent
//! (trilinear) weights, accumulating density and weighted velocity; the
//! velocity of every occupied cell is then divided by its density.
//!
//! Three effects read the grid back at each vertex:
//! - velocity smoothing towards the trilinear neighbourhood velocity,
//! - collider friction towards the velocity of the collider cell,
//! - pressure along the negative density gradient.
//!
//! Cell `(i, j, k)` lives at offset `i + (j + k·res)·res`.

use glam::{BVec3, Vec3};
use serde::{Deserialize, Serialize};
use tress_types::constants::EPSILON;

use crate::config::HairVolumeParams;

/// One voxel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridCell {
    pub velocity: Vec3,
    pub density: f32,
}

/// A sample of a collision body, supplied by the collision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColliderPoint {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Exported data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridChannel {
    /// One float per cell.
    Density,
    /// Four planes of `res³` floats: vx, vy, vz, |v|.
    Velocity,
}

/// Trilinear sample of the grid at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    pub density: f32,
    pub velocity: Vec3,
    /// Negative density gradient, in density per cell.
    pub neg_gradient: Vec3,
}

/// Summary of the grids built during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub occupied_cells: u32,
    pub total_density: f32,
}

/// Axis-aligned voxel grid over a bounding box.
#[derive(Debug, Clone)]
pub struct InteractionGrid {
    resolution: usize,
    min: Vec3,
    max: Vec3,
    scale: Vec3,
    /// Axes widened because the points had no extent along them.
    flat: BVec3,
    cells: Vec<GridCell>,
}

impl InteractionGrid {
    /// Empty grid spanning `[min, max]`.
    ///
    /// An axis with no extent (a straight strand, a flat sheet) would put
    /// every point on the lower face of the first cell layer and read as a
    /// density drop across that axis. Such an axis is widened to the cell
    /// size of the widest axis (1 if every axis is flat), placed so the
    /// points sit halfway between the first two layers, and its gradient
    /// component is zeroed.
    pub fn with_bounds(resolution: usize, min: Vec3, max: Vec3) -> Self {
        debug_assert!(resolution >= 2);
        let steps = (resolution - 1) as f32;
        let extent = max - min;
        let flat = extent.cmple(Vec3::splat(EPSILON));
        let widest = extent.max_element();
        let cell = if widest > EPSILON { widest / steps } else { 1.0 };

        let mut lo = min;
        let mut hi = max;
        let mut scale = extent / steps;
        for axis in 0..3 {
            if flat.test(axis) {
                lo[axis] = min[axis] - 0.5 * cell;
                hi[axis] = lo[axis] + cell * steps;
                scale[axis] = cell;
            }
        }
        Self {
            resolution,
            min: lo,
            max: hi,
            scale,
            flat,
            cells: vec![GridCell::default(); resolution * resolution * resolution],
        }
    }

    /// Empty grid spanning the bounding box of `points`.
    pub fn around(resolution: usize, points: &[Vec3]) -> Self {
        let (min, max) = bounds(points);
        Self::with_bounds(resolution, min, max)
    }

    /// Grid of `points` with their velocities, splatted and normalized.
    pub fn build(resolution: usize, points: &[Vec3], velocities: &[Vec3]) -> Self {
        let mut grid = Self::around(resolution, points);
        for (p, v) in points.iter().zip(velocities) {
            grid.splat(*p, *v);
        }
        grid.normalize();
        grid
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Lower-corner cell indices of the 8-cell stencil around `p`.
    fn cell_coords(&self, p: Vec3) -> [usize; 3] {
        let last = (self.resolution - 2) as f32;
        let rel = (p - self.min) / self.scale;
        [0, 1, 2].map(|axis| rel[axis].floor().clamp(0.0, last) as usize)
    }

    fn offset_of(&self, [i, j, k]: [usize; 3]) -> usize {
        i + (j + k * self.resolution) * self.resolution
    }

    /// Offset of the lower-corner cell containing `p`.
    pub fn cell_offset(&self, p: Vec3) -> usize {
        self.offset_of(self.cell_coords(p))
    }

    /// Cell containing `p` (no interpolation).
    pub fn lookup(&self, p: Vec3) -> &GridCell {
        &self.cells[self.cell_offset(p)]
    }

    /// Corner offsets of the stencil and the local coordinates of `p`
    /// inside it (each in `[0, 1]` for points within the bounds).
    fn stencil(&self, p: Vec3) -> ([usize; 8], Vec3) {
        let coords = self.cell_coords(p);
        let base = self.offset_of(coords);
        let res = self.resolution;
        let local = (p - self.min) / self.scale
            - Vec3::new(coords[0] as f32, coords[1] as f32, coords[2] as f32);
        let mut offsets = [0; 8];
        for (corner, offset) in offsets.iter_mut().enumerate() {
            let (di, dj, dk) = (corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
            *offset = base + di + (dj + dk * res) * res;
        }
        (offsets, local)
    }

    /// Adds one point with tent weights. Points outside the bounds are
    /// skipped. Returns the total weight deposited (1 or 0).
    pub fn splat(&mut self, p: Vec3, velocity: Vec3) -> f32 {
        if !self.contains(p) {
            return 0.0;
        }
        let (offsets, uvw) = self.stencil(p);
        let mut deposited = 0.0;
        for (corner, &offset) in offsets.iter().enumerate() {
            let w = tent_weight(uvw, corner);
            let cell = &mut self.cells[offset];
            cell.density += w;
            cell.velocity += velocity * w;
            deposited += w;
        }
        deposited
    }

    /// Turns accumulated momentum into velocity in every occupied cell.
    pub fn normalize(&mut self) {
        for cell in &mut self.cells {
            if cell.density > 0.0 {
                cell.velocity /= cell.density;
            }
        }
    }

    /// Trilinear sample of density, velocity and negative density gradient.
    pub fn sample(&self, p: Vec3) -> GridSample {
        let (offsets, uvw) = self.stencil(p);
        let d: [GridCell; 8] = offsets.map(|o| self.cells[o]);
        let m = Vec3::ONE - uvw;

        let mut density = 0.0;
        let mut velocity = Vec3::ZERO;
        for (corner, cell) in d.iter().enumerate() {
            let w = tent_weight(uvw, corner);
            density += cell.density * w;
            velocity += cell.velocity * w;
        }

        // Differences across each axis, weighted bilinearly over the other two.
        let rho = |c: usize| d[c].density;
        let neg_gradient = Vec3::new(
            m.y * m.z * (rho(0) - rho(1))
                + uvw.y * m.z * (rho(2) - rho(3))
                + m.y * uvw.z * (rho(4) - rho(5))
                + uvw.y * uvw.z * (rho(6) - rho(7)),
            m.x * m.z * (rho(0) - rho(2))
                + uvw.x * m.z * (rho(1) - rho(3))
                + m.x * uvw.z * (rho(4) - rho(6))
                + uvw.x * uvw.z * (rho(5) - rho(7)),
            m.x * m.y * (rho(0) - rho(4))
                + uvw.x * m.y * (rho(1) - rho(5))
                + m.x * uvw.y * (rho(2) - rho(6))
                + uvw.x * uvw.y * (rho(3) - rho(7)),
        );

        GridSample {
            density,
            velocity,
            neg_gradient: Vec3::select(self.flat, Vec3::ZERO, neg_gradient),
        }
    }

    pub fn total_density(&self) -> f32 {
        self.cells.iter().map(|c| c.density).sum()
    }

    pub fn occupied_cells(&self) -> u32 {
        self.cells.iter().filter(|c| c.density > 0.0).count() as u32
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            occupied_cells: self.occupied_cells(),
            total_density: self.total_density(),
        }
    }

    /// Flattened channel data; velocity plane `c` starts at `c · res³`.
    pub fn export(&self, channel: GridChannel) -> Vec<f32> {
        match channel {
            GridChannel::Density => self.cells.iter().map(|c| c.density).collect(),
            GridChannel::Velocity => {
                let n = self.cells.len();
                let mut out = vec![0.0; 4 * n];
                for (i, cell) in self.cells.iter().enumerate() {
                    out[i] = cell.velocity.x;
                    out[i + n] = cell.velocity.y;
                    out[i + 2 * n] = cell.velocity.z;
                    out[i + 3 * n] = cell.velocity.length();
                }
                out
            }
        }
    }
}

/// Tent weight of stencil corner `corner` (bit 0 = +x, 1 = +y, 2 = +z).
fn tent_weight(uvw: Vec3, corner: usize) -> f32 {
    let pick = |bit: usize, t: f32| if corner & bit != 0 { t } else { 1.0 - t };
    pick(1, uvw.x) * pick(2, uvw.y) * pick(4, uvw.z)
}

/// Axis-aligned bounding box of `points`; the origin for an empty set.
pub fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    let Some(first) = points.first() else {
        return (Vec3::ZERO, Vec3::ZERO);
    };
    points
        .iter()
        .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)))
}

/// Adds the volumetric hair forces to `forces`.
///
/// The hair grid is built only when smoothing or pressure is on, the
/// collider grid only when friction is on and there are colliders.
/// Returns the hair grid statistics if it was built.
pub fn add_volume_forces(
    forces: &mut [Vec3],
    positions: &[Vec3],
    velocities: &[Vec3],
    colliders: &[ColliderPoint],
    params: &HairVolumeParams,
    resolution: usize,
) -> Option<GridStats> {
    if !params.is_active() || positions.is_empty() {
        return None;
    }

    let smooth = 2.0 * params.velocity_smooth;
    let friction = 2.0 * params.collider_friction;
    let mut stats = None;

    if smooth > 0.0 || params.pressure > 0.0 {
        let grid = InteractionGrid::build(resolution, positions, velocities);
        for ((f, x), v) in forces.iter_mut().zip(positions).zip(velocities) {
            let sample = grid.sample(*x);
            if smooth > 0.0 {
                *f += (sample.velocity - *v) * smooth;
            }
            if params.pressure > 0.0 {
                let excess = sample.neg_gradient.length() - params.pressure_threshold;
                if excess >= 0.0 {
                    *f += sample.neg_gradient.normalize_or_zero() * (excess * params.pressure);
                }
            }
        }
        stats = Some(grid.stats());
    }

    if friction > 0.0 && !colliders.is_empty() {
        let mut grid = InteractionGrid::around(resolution, positions);
        for c in colliders {
            grid.splat(c.position, c.velocity);
        }
        grid.normalize();
        for ((f, x), v) in forces.iter_mut().zip(positions).zip(velocities) {
            let cell = grid.lookup(*x);
            if cell.density > 0.0 {
                *f += (cell.velocity - *v) * friction;
            }
        }
    }

    stats
}
