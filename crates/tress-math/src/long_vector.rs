//! Long vectors: one `Vec3` per vertex, indexed by vertex id.
//!
//! All reductions walk the vertices in index order so results are
//! reproducible from run to run.

use glam::Vec3;

/// A long vector.
pub type LongVector = Vec<Vec3>;

/// A zero-filled long vector for `n` vertices.
pub fn zeros(n: usize) -> LongVector {
    vec![Vec3::ZERO; n]
}

/// Sum of per-vertex dot products.
pub fn dot(a: &[Vec3], b: &[Vec3]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).fold(0.0, |acc, (x, y)| acc + x.dot(*y))
}

/// Squared Euclidean norm of the whole vector.
pub fn norm_squared(a: &[Vec3]) -> f32 {
    dot(a, a)
}

/// `y += alpha · x`
pub fn axpy(y: &mut [Vec3], alpha: f32, x: &[Vec3]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += *xi * alpha;
    }
}

/// `y = x + beta · y`
pub fn xpby(y: &mut [Vec3], x: &[Vec3], beta: f32) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi = *xi + *yi * beta;
    }
}

/// `to = a · a_scale + b · b_scale`
pub fn combine(to: &mut [Vec3], a: &[Vec3], a_scale: f32, b: &[Vec3], b_scale: f32) {
    debug_assert_eq!(to.len(), a.len());
    debug_assert_eq!(to.len(), b.len());
    for ((t, ai), bi) in to.iter_mut().zip(a).zip(b) {
        *t = *ai * a_scale + *bi * b_scale;
    }
}

/// `to = a - b`
pub fn sub(to: &mut [Vec3], a: &[Vec3], b: &[Vec3]) {
    debug_assert_eq!(to.len(), a.len());
    for ((t, ai), bi) in to.iter_mut().zip(a).zip(b) {
        *t = *ai - *bi;
    }
}
