//! # tress-solver
//!
//! Implicit (backward-Euler) mass-spring integrator for cloth and hair.
//!
//! ## Key Types
//!
//! - [`ImplicitSolver`]: the per-step driver, generic over the frame mapping
//! - [`WorldFrame`] / [`RootFrame`]: static choice of reference-frame handling
//! - [`Spring`] / [`SpringKind`]: the closed set of spring laws
//! - [`ConstraintSet`]: per-vertex filter projectors and target velocities
//! - [`InteractionGrid`]: voxel grid for volumetric hair interaction
//! - [`SolverConfig`]: material, hair-volume and linear-solver settings

pub mod cg;
pub mod config;
pub mod constraint;
pub mod forces;
pub mod frame;
pub mod grid;
pub mod projected;
pub mod solver;
pub mod spring;
pub mod state;

pub use config::{HairVolumeParams, LinearSolverKind, SolverConfig, SpringParams};
pub use constraint::ConstraintSet;
pub use forces::Face;
pub use frame::{FrameMapping, RootFrame, RootTransform, WorldFrame};
pub use grid::{ColliderPoint, GridChannel, InteractionGrid};
pub use solver::{ImplicitSolver, StepReport};
pub use spring::{GoalTarget, Spring, SpringKind};
pub use state::VertexState;
