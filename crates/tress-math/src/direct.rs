//! Sparse Cholesky solver backed by `faer`.
//!
//! Expands a [`BlockSparseMatrix`] to scalar triplets, factorizes it with
//! faer's supernodal LLᵀ in f64, and solves long-vector right-hand sides
//! against the cached factor.
//!
//! ## Workflow
//! 1. `factorize(matrix)` builds the CSC matrix and runs symbolic + numeric LLᵀ
//! 2. `solve(rhs, solution)` does forward/backward substitution
//! 3. Repeat `solve()` with different right-hand sides without re-factorizing

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::sparse::{SparseColMat, Triplet};
use faer::Side;
use glam::Vec3;
use tress_types::{TressError, TressResult};

use crate::block_sparse::BlockSparseMatrix;

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// The matrix must be symmetric positive definite. Only the upper triangle
/// is read by the factorization.
pub struct DirectSolver {
    factorization: Option<Llt<usize, f64>>,
    /// Scalar dimension (3 × vertex count).
    dimension: usize,
}

impl DirectSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    fn to_csc_f64(matrix: &BlockSparseMatrix) -> TressResult<SparseColMat<usize, f64>> {
        let n = 3 * matrix.vertex_count();
        let triplets: Vec<Triplet<usize, usize, f64>> = matrix
            .to_triplets()
            .into_iter()
            .map(|(row, col, val)| Triplet { row, col, val })
            .collect();

        SparseColMat::try_new_from_triplets(n, n, &triplets)
            .map_err(|e| TressError::Solver(format!("failed to construct CSC matrix: {e:?}")))
    }

    /// Factorizes `matrix`, replacing any previous factorization.
    pub fn factorize(&mut self, matrix: &BlockSparseMatrix) -> TressResult<()> {
        if matrix.vertex_count() == 0 {
            return Err(TressError::Solver("cannot factorize an empty matrix".into()));
        }

        self.factorization = None;
        self.dimension = 3 * matrix.vertex_count();

        let csc = Self::to_csc_f64(matrix)?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| TressError::Solver(format!("symbolic analysis failed: {e:?}")))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| TressError::Solver(format!("Cholesky factorization failed: {e:?}")))?;

        self.factorization = Some(llt);
        Ok(())
    }

    /// Solves `M · solution = rhs` with the cached factorization.
    pub fn solve(&self, rhs: &[Vec3], solution: &mut [Vec3]) -> TressResult<()> {
        let llt = self
            .factorization
            .as_ref()
            .ok_or_else(|| TressError::Solver("solver not factorized".into()))?;

        for len in [rhs.len(), solution.len()] {
            if 3 * len != self.dimension {
                return Err(TressError::DimensionMismatch {
                    expected: self.dimension / 3,
                    found: len,
                });
            }
        }

        let rhs_f64: faer::Mat<f64> =
            faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i / 3][i % 3] as f64);

        let sol = llt.solve(&rhs_f64);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = Vec3::new(
                sol[(3 * i, 0)] as f32,
                sol[(3 * i + 1, 0)] as f32,
                sol[(3 * i + 2, 0)] as f32,
            );
        }
        Ok(())
    }

    pub fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}

impl Default for DirectSolver {
    fn default() -> Self {
        Self::new()
    }
}
