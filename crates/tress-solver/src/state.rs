//! Vertex state: positions, velocities and masses.
//!
//! Positions and velocities are stored in each vertex's root frame. The
//! solver writes its tentative result into `new_positions` /
//! `new_velocities`; only [`VertexState::commit`] makes it authoritative,
//! so a caller can drop a failed step without touching the state.

use glam::Vec3;
use tress_math::long_vector::{self, LongVector};

/// Per-vertex motion state.
#[derive(Debug, Clone)]
pub struct VertexState {
    pub positions: LongVector,
    pub velocities: LongVector,
    /// Result of the last solve, not yet committed.
    pub new_positions: LongVector,
    pub new_velocities: LongVector,
    /// Scalar mass per vertex (the mass block is `m · I`).
    pub masses: Vec<f32>,
}

impl VertexState {
    /// All vertices at the origin, at rest, with unit mass.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            positions: long_vector::zeros(vertex_count),
            velocities: long_vector::zeros(vertex_count),
            new_positions: long_vector::zeros(vertex_count),
            new_velocities: long_vector::zeros(vertex_count),
            masses: vec![1.0; vertex_count],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// `Vnew = V + dv`, `Xnew = X + dt · Vnew`.
    pub fn advance(&mut self, dv: &[Vec3], dt: f32) {
        for i in 0..self.vertex_count() {
            let v = self.velocities[i] + dv[i];
            self.new_velocities[i] = v;
            self.new_positions[i] = self.positions[i] + v * dt;
        }
    }

    /// Copies the tentative result into the authoritative state.
    pub fn commit(&mut self) {
        self.positions.copy_from_slice(&self.new_positions);
        self.velocities.copy_from_slice(&self.new_velocities);
    }

    /// Total kinetic energy: 0.5 · Σ mᵢ · |vᵢ|², root frame.
    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, &m)| 0.5 * m as f64 * v.length_squared() as f64)
            .sum()
    }
}
