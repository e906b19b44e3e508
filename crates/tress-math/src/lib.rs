//! # tress-math
//!
//! Linear algebra primitives for the tress integrator.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec3`, `Mat3`) as the per-vertex
//!   vector and 3×3 block types
//! - Block helpers (outer products, cross-product matrices)
//! - Long vectors: one `Vec3` per vertex
//! - A symmetric block-sparse matrix with one diagonal block per vertex
//!   and one off-diagonal block per spring
//! - A faer-backed sparse Cholesky solver used as the direct reference path

pub mod block;
pub mod block_sparse;
pub mod direct;
pub mod long_vector;

pub use block_sparse::{BlockSparseMatrix, MatrixBlock};
pub use direct::DirectSolver;
pub use long_vector::LongVector;

// Re-export glam types as the canonical math types for tress.
pub use glam::{Mat3, Vec3};
