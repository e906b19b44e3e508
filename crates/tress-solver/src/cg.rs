//! Filtered conjugate gradient.
//!
//! Solves `A · dv = b` inside the subspace allowed by the constraint
//! filter. The iterate is seeded with the constraint targets `z`, and the
//! residual, search direction and matrix product are re-projected every
//! iteration so constrained components never drift from `z`.

use glam::Vec3;
use tress_math::long_vector::{self, axpy, dot, norm_squared, xpby};
use tress_math::BlockSparseMatrix;

use crate::constraint::ConstraintSet;

/// Iteration cap and relative tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgSettings {
    pub max_iterations: u32,
    /// The solve stops once `r·r ≤ tolerance² · ‖filter(b)‖²`.
    pub tolerance: f32,
}

/// Result of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CgOutcome {
    pub iterations: u32,
    /// Final `r·r`.
    pub residual: f32,
    /// False if the cap was hit or the curvature `c·A·c` went non-positive.
    pub converged: bool,
}

/// Runs filtered CG, writing the solution into `dv`.
///
/// `on_iteration(iteration, residual)` is called after every iteration.
pub fn solve_filtered(
    a: &BlockSparseMatrix,
    b: &[Vec3],
    constraints: &ConstraintSet,
    settings: &CgSettings,
    dv: &mut [Vec3],
    mut on_iteration: impl FnMut(u32, f32),
) -> CgOutcome {
    let n = b.len();
    dv.copy_from_slice(constraints.targets());

    let mut filtered_b = b.to_vec();
    constraints.filter(&mut filtered_b);
    let target = settings.tolerance * settings.tolerance * norm_squared(&filtered_b);

    // r = filter(b − A·dv)
    let mut q = long_vector::zeros(n);
    a.mul_vector(dv, &mut q);
    let mut r = long_vector::zeros(n);
    long_vector::sub(&mut r, b, &q);
    constraints.filter(&mut r);

    let mut c = r.clone();
    constraints.filter(&mut c);

    let mut delta = dot(&r, &c);
    let mut iterations = 0;

    while delta > target && iterations < settings.max_iterations {
        a.mul_vector(&c, &mut q);
        constraints.filter(&mut q);

        let curvature = dot(&c, &q);
        if curvature <= 0.0 {
            tracing::debug!(iterations, curvature, "cg breakdown: non-positive curvature");
            return CgOutcome {
                iterations,
                residual: delta,
                converged: false,
            };
        }

        let alpha = delta / curvature;
        axpy(dv, alpha, &c);
        axpy(&mut r, -alpha, &q);

        let delta_old = delta;
        delta = dot(&r, &r);

        // c = filter(r + (δ/δ_old)·c)
        xpby(&mut c, &r, delta / delta_old);
        constraints.filter(&mut c);

        iterations += 1;
        on_iteration(iterations, delta);
    }

    CgOutcome {
        iterations,
        residual: delta,
        converged: delta <= target,
    }
}
