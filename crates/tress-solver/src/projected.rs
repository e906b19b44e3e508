//! Direct solve of the constraint-projected system.
//!
//! With `y` free and `dv = z + S·y`, the filtered system becomes
//! `(S·A·S + (I − S)) · y = S · (b − A·z)`, which is symmetric positive
//! definite whenever `A` is. It is factorized with faer's sparse LLᵀ.

use glam::{Mat3, Vec3};
use tress_math::long_vector;
use tress_math::{BlockSparseMatrix, DirectSolver};
use tress_types::TressResult;

use crate::constraint::ConstraintSet;

/// Builds `S·A·S + (I − S)` block by block.
pub fn project_matrix(a: &BlockSparseMatrix, constraints: &ConstraintSet) -> BlockSparseMatrix {
    let n = a.vertex_count();
    let s = constraints.filters();
    let mut projected = a.clone();
    for i in 0..n {
        let block = projected.diagonal_mut(i);
        *block = s[i] * *block * s[i] + (Mat3::IDENTITY - s[i]);
    }
    for (row, col, value) in projected.off_diagonal_mut() {
        *value = s[row] * *value * s[col];
    }
    projected
}

/// Solves for `dv` with a fresh factorization.
pub fn solve_projected(
    a: &BlockSparseMatrix,
    b: &[Vec3],
    constraints: &ConstraintSet,
    dv: &mut [Vec3],
) -> TressResult<()> {
    let n = b.len();
    let z = constraints.targets();

    // rhs = S·(b − A·z)
    let mut az = long_vector::zeros(n);
    a.mul_vector(z, &mut az);
    let mut rhs = long_vector::zeros(n);
    long_vector::sub(&mut rhs, b, &az);
    constraints.filter(&mut rhs);

    let mut solver = DirectSolver::new();
    solver.factorize(&project_matrix(a, constraints))?;

    let mut y = long_vector::zeros(n);
    solver.solve(&rhs, &mut y)?;
    constraints.filter(&mut y);

    for ((out, zi), yi) in dv.iter_mut().zip(z).zip(&y) {
        *out = *zi + *yi;
    }
    Ok(())
}
