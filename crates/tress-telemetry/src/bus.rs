//! Step-scoped event bus.
//!
//! The integrator opens a step with [`EventBus::begin_step`], records
//! payloads while the step runs, and closes it with [`EventBus::end_step`].
//! Sinks receive a step's events only when it closes, in recording order,
//! each stamped with the step number. Sinks never observe a half-finished
//! step.

use std::cell::RefCell;

use crate::events::{EventKind, SolverEvent};
use crate::sinks::EventSink;

/// Buffers one step of solver events and hands it to sinks.
pub struct EventBus {
    sinks: Vec<Box<dyn EventSink>>,
    /// Events of the open step. Recording only needs `&self`, so the
    /// conjugate-gradient callback can record while the solver is borrowed.
    pending: RefCell<Vec<SolverEvent>>,
    step: u32,
    steps_delivered: u32,
}

impl EventBus {
    /// Creates a new event bus with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            pending: RefCell::new(Vec::new()),
            step: 0,
            steps_delivered: 0,
        }
    }

    /// Registers a sink to receive events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Opens step `step`. Events left over from a step that never closed
    /// (a solve that returned an error) are delivered first.
    pub fn begin_step(&mut self, step: u32) {
        self.deliver();
        self.step = step;
    }

    /// Records an event for the open step.
    pub fn record(&self, kind: EventKind) {
        self.pending
            .borrow_mut()
            .push(SolverEvent::new(self.step, kind));
    }

    /// Number of events recorded in the open step.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Closes the open step and delivers its events. Returns how many
    /// events were delivered.
    pub fn end_step(&mut self) -> usize {
        let delivered = self.deliver();
        self.steps_delivered += 1;
        delivered
    }

    /// Steps closed so far.
    pub fn steps_delivered(&self) -> u32 {
        self.steps_delivered
    }

    /// Delivers anything still pending and lets each sink finalize.
    pub fn finalize(&mut self) {
        self.deliver();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    fn deliver(&mut self) -> usize {
        let events = std::mem::take(self.pending.get_mut());
        for event in &events {
            for sink in &mut self.sinks {
                sink.handle(event);
            }
        }
        events.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
