//! Numeric constants and solver defaults.

/// Standard gravitational acceleration (m/s²).
pub const GRAVITY: f32 = 9.81;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Hard cap on conjugate-gradient iterations per solve.
pub const DEFAULT_CG_ITERATIONS: u32 = 100;

/// Relative conjugate-gradient tolerance. The solve stops once
/// `r·r <= tol² · ‖filter(b)‖²`.
pub const DEFAULT_CG_TOLERANCE: f32 = 0.01;

/// Spring lengths at or below this are treated as degenerate
/// (zero direction vector).
pub const ALMOST_ZERO: f32 = f32::EPSILON;

/// Additive guard on average-spring-length and rest-length denominators.
pub const LENGTH_EPSILON: f32 = f32::EPSILON;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f32 = 1.0e-7;

/// Cells per axis of the hair interaction grid.
pub const DEFAULT_GRID_RESOLUTION: usize = 10;

/// Vertex count above which the block-sparse product runs its two
/// accumulation passes on separate threads.
pub const PARALLEL_VERTEX_THRESHOLD: usize = 512;
