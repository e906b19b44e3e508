//! Error types for the tress integrator.
//!
//! All crates return `TressResult<T>` from fallible operations.
//! Conjugate-gradient non-convergence is *not* an error: it is reported
//! through the step report so the caller can retry with a smaller step.

use thiserror::Error;

/// Unified error type for the tress integrator.
#[derive(Debug, Error)]
pub enum TressError {
    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spring registration referenced missing vertices or an unknown slot.
    #[error("Invalid spring: {0}")]
    InvalidSpring(String),

    /// A per-vertex or per-spring index was out of range.
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// Two operands disagree on their block layout.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A timestep was zero, negative or not finite.
    #[error("Invalid timestep: {0}")]
    InvalidTimestep(f32),

    /// The direct (factorizing) linear solver failed.
    #[error("Linear solver failure: {0}")]
    Solver(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, TressError>`.
pub type TressResult<T> = Result<T, TressError>;
