//! 3×3 block helpers on top of `glam::Mat3`.
//!
//! glam stores matrices column-major; every helper here is written in
//! terms of columns so that `m * v` is the usual matrix–vector product.

use glam::{Mat3, Vec3};

/// Outer product `a · bᵀ`.
#[inline]
pub fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Cross-product matrix `[v]×`, so that `skew(v) * w == v.cross(w)`.
#[inline]
pub fn skew(v: Vec3) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(0.0, v.z, -v.y),
        Vec3::new(-v.z, 0.0, v.x),
        Vec3::new(v.y, -v.x, 0.0),
    )
}

/// `s · I`.
#[inline]
pub fn scaled_identity(s: f32) -> Mat3 {
    Mat3::from_diagonal(Vec3::splat(s))
}

/// Element at row `r`, column `c`.
#[inline]
pub fn entry(m: &Mat3, r: usize, c: usize) -> f32 {
    m.col(c)[r]
}

/// Returns true when `m` is symmetric and idempotent within `tol`
/// (an orthogonal projector, as required of constraint filters).
pub fn is_projector(m: &Mat3, tol: f32) -> bool {
    m.abs_diff_eq(m.transpose(), tol) && (*m * *m).abs_diff_eq(*m, tol)
}
