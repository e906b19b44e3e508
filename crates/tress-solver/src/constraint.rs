//! Per-vertex kinematic constraints.
//!
//! A constraint is a projector `S` (symmetric, idempotent) onto the
//! directions the vertex is free to move in, plus a target velocity
//! change `z` along the constrained directions. The solver keeps its
//! iterate inside the filtered subspace once seeded with `z`.
//!
//! All vectors passed here are already in the vertex's root frame.

use glam::{Mat3, Vec3};
use tress_math::block::outer;

/// Filter matrices and targets for every vertex.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    filters: Vec<Mat3>,
    targets: Vec<Vec3>,
}

impl ConstraintSet {
    /// All vertices free (`S = I`, `z = 0`).
    pub fn new(vertex_count: usize) -> Self {
        Self {
            filters: vec![Mat3::IDENTITY; vertex_count],
            targets: vec![Vec3::ZERO; vertex_count],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.filters.len()
    }

    /// Resets every vertex to unconstrained.
    pub fn clear(&mut self) {
        self.filters.fill(Mat3::IDENTITY);
        self.targets.fill(Vec3::ZERO);
    }

    /// Zero degrees of freedom: `S = 0`, `z = dv`.
    pub fn pin(&mut self, i: usize, dv: Vec3) {
        debug_assert!(i < self.filters.len());
        self.filters[i] = Mat3::ZERO;
        self.targets[i] = dv;
    }

    /// One degree of freedom: motion only along the axis orthogonal to
    /// `p` and `q` (which must be orthonormal).
    pub fn slide_line(&mut self, i: usize, p: Vec3, q: Vec3, dv: Vec3) {
        debug_assert!(i < self.filters.len());
        self.filters[i] = Mat3::IDENTITY - outer(p, p) - outer(q, q);
        self.targets[i] += dv;
    }

    /// Two degrees of freedom: motion within the plane orthogonal to unit `p`.
    pub fn slide_plane(&mut self, i: usize, p: Vec3, dv: Vec3) {
        debug_assert!(i < self.filters.len());
        self.filters[i] = Mat3::IDENTITY - outer(p, p);
        self.targets[i] += dv;
    }

    pub fn filter_of(&self, i: usize) -> &Mat3 {
        &self.filters[i]
    }

    pub fn target_of(&self, i: usize) -> Vec3 {
        self.targets[i]
    }

    pub fn filters(&self) -> &[Mat3] {
        &self.filters
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    /// True if vertex `i` is unconstrained.
    pub fn is_free(&self, i: usize) -> bool {
        self.filters[i] == Mat3::IDENTITY
    }

    /// `v[i] ← S[i] · v[i]` for every vertex.
    pub fn filter(&self, v: &mut [Vec3]) {
        debug_assert_eq!(v.len(), self.filters.len());
        for (x, s) in v.iter_mut().zip(&self.filters) {
            *x = *s * *x;
        }
    }
}
