//! # tress-bench
//!
//! Benchmark suite for the tress integrator.
//!
//! Provides 3 procedural scenarios (hanging sheet, hair strand on a
//! spinning root, spring pair), a runner that drives the solver in the
//! right reference frame, and CSV/JSON metric export for regression
//! tracking.

pub mod generators;
pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use generators::Body;
pub use metrics::BenchmarkMetrics;
pub use runner::{BenchmarkRunner, RunOutcome};
pub use scenarios::{RootMotion, Scenario, ScenarioKind};
