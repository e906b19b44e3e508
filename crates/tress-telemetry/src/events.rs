//! Solver event types.
//!
//! Structured events emitted by the integrator at fixed points of each
//! step. Events are small value types; anything heavier than a few
//! scalars belongs in the step report instead.

use serde::{Deserialize, Serialize};

/// A solver event, tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverEvent {
    /// Step number (0-indexed, counts calls to `solve`).
    pub timestep: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// A step started.
    StepBegin {
        /// Timestep size (seconds).
        dt: f32,
    },

    /// One conjugate-gradient iteration finished.
    CgIteration {
        /// Iteration number within the step (1-based).
        iteration: u32,
        /// Filtered residual `r · r` after the iteration.
        residual: f32,
    },

    /// Springs evaluated for the step.
    SpringActivity {
        /// Springs that contributed force this step.
        active: u32,
        /// All springs in the system.
        total: u32,
    },

    /// Hair interaction grid rebuilt.
    GridBuilt {
        /// Cells with non-zero density.
        occupied_cells: u32,
        /// Sum of splatted density (equals the in-bounds vertex count).
        total_density: f32,
    },

    /// Linear solve summary.
    Convergence {
        iterations: u32,
        /// Final filtered residual.
        residual: f32,
        /// False when the iteration cap was hit or CG broke down.
        converged: bool,
    },

    /// A step finished.
    StepEnd {
        /// Wall-clock time for the whole step (seconds).
        wall_time: f64,
    },
}

impl SolverEvent {
    /// Creates a new event for the given step.
    pub fn new(timestep: u32, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
