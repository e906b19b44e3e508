//! # tress-types
//!
//! Shared types, identifiers, error types, and numeric constants
//! for the tress implicit mass-spring integrator.
//!
//! This crate has zero domain logic. It defines the vocabulary
//! that all other tress crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{TressError, TressResult};
pub use ids::BlockHandle;
