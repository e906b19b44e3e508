//! Pluggable event sinks.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::events::{EventKind, SolverEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SolverEvent);

    /// Called when the run ends.
    fn finalize(&mut self) {}

    /// Human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events into a shared log.
///
/// The log is behind an `Arc`, so a clone of the sink (or of its
/// [`log`](VecSink::log) handle) can inspect what was delivered after the
/// sink itself has been boxed into a bus.
#[derive(Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SolverEvent>>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the collected events.
    pub fn log(&self) -> Arc<Mutex<Vec<SolverEvent>>> {
        Arc::clone(&self.events)
    }

    /// Locks and returns the collected events.
    pub fn events(&self) -> MutexGuard<'_, Vec<SolverEvent>> {
        // A poisoned log still holds every event pushed before the panic.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SolverEvent) {
        self.events().push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
///
/// Per-iteration events go out at `trace`, step bookkeeping at `debug`,
/// and a step that fails to converge at `warn`.
pub struct TracingSink {
    /// Emit per-iteration CG events (they are noisy).
    verbose: bool,
}

impl TracingSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(false)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SolverEvent) {
        let step = event.timestep;
        match &event.kind {
            EventKind::CgIteration { iteration, residual } => {
                if self.verbose {
                    tracing::trace!(step, iteration, residual, "cg_iteration");
                }
            }
            EventKind::Convergence {
                iterations,
                residual,
                converged: false,
            } => {
                tracing::warn!(step, iterations, residual, "linear solve did not converge");
            }
            EventKind::StepEnd { wall_time } => {
                tracing::debug!(step, wall_time, "step_end");
            }
            kind => {
                tracing::debug!(step, event = ?kind, "solver_event");
            }
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
