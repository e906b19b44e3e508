//! # tress-telemetry
//!
//! Event bus for solver telemetry. The integrator emits structured events
//! (step timing, CG residuals, spring activity, grid statistics,
//! convergence) that are consumed by pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SolverEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
