//! External forces: gravity, air drag, and wind.
//!
//! Wind samples come from an external force-field evaluator, one world-
//! frame vector per vertex. Cloth couples them through face normals, hair
//! (no faces) through the part of the sample perpendicular to each
//! structural edge.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tress_math::block::scaled_identity;
use tress_math::BlockSparseMatrix;

use crate::frame::{FrameMapping, RootTransform};
use crate::spring::{Spring, SpringKind};

/// Wind coupling factor per face, before dividing by the corner count.
const FACE_WIND_FACTOR: f32 = 0.02;

/// Wind coupling factor per unit rest length of a hair edge.
const STRAND_WIND_FACTOR: f32 = 0.01;

/// Vertex indices of a cloth face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Face {
    Tri([usize; 3]),
    Quad([usize; 4]),
}

impl Face {
    pub fn vertices(&self) -> &[usize] {
        match self {
            Face::Tri(v) => v,
            Face::Quad(v) => v,
        }
    }

    /// Unnormalized face normal.
    ///
    /// Triangles use `(v0 − v1) × (v1 − v2)`, quads the diagonal cross
    /// product `(v0 − v2) × (v1 − v3)`.
    pub fn normal(&self, positions: &[Vec3]) -> Vec3 {
        match *self {
            Face::Tri([a, b, c]) => {
                (positions[a] - positions[b]).cross(positions[b] - positions[c])
            }
            Face::Quad([a, b, c, d]) => {
                (positions[a] - positions[c]).cross(positions[b] - positions[d])
            }
        }
    }

    fn wind_factor(&self) -> f32 {
        FACE_WIND_FACTOR / self.vertices().len() as f32
    }
}

/// Adds `m · g` per vertex, with `g` converted into each root frame.
pub fn add_gravity<F: FrameMapping>(
    forces: &mut [Vec3],
    positions: &[Vec3],
    velocities: &[Vec3],
    masses: &[f32],
    roots: &[RootTransform],
    gravity: Vec3,
) {
    for (i, f) in forces.iter_mut().enumerate() {
        let g = F::acceleration_to_root(&roots[i], positions[i], velocities[i], gravity);
        *f += scaled_identity(masses[i]) * g;
    }
}

/// Isotropic air drag `−drag · v` with Jacobian `−drag · I`.
///
/// Drag acts on the root-frame velocity directly.
pub fn add_drag(
    forces: &mut [Vec3],
    dfdv: &mut BlockSparseMatrix,
    velocities: &[Vec3],
    air_viscosity: f32,
) {
    let drag = 0.01 * air_viscosity;
    if drag == 0.0 {
        return;
    }
    let jacobian = scaled_identity(-drag);
    for (i, (f, v)) in forces.iter_mut().zip(velocities).enumerate() {
        *f -= *v * drag;
        *dfdv.diagonal_mut(i) += jacobian;
    }
}

/// Face-projected wind for cloth.
///
/// Each corner `v` of a face receives `n̂ · (w[v] · n) · factor`.
pub fn add_face_wind(forces: &mut [Vec3], positions: &[Vec3], faces: &[Face], wind: &[Vec3]) {
    for face in faces {
        let normal = face.normal(positions);
        let unit = normal.normalize_or_zero();
        let factor = face.wind_factor();
        for &v in face.vertices() {
            forces[v] += unit * (wind[v].dot(normal) * factor);
        }
    }
}

/// Edge-projected wind for hair.
///
/// For each structural spring both endpoints receive the component of
/// their wind sample perpendicular to the edge, scaled by rest length.
pub fn add_strand_wind<'a>(
    forces: &mut [Vec3],
    positions: &[Vec3],
    springs: impl IntoIterator<Item = &'a Spring>,
    wind: &[Vec3],
) {
    for spring in springs {
        if spring.kind != SpringKind::Structural || spring.deactivated {
            continue;
        }
        let edge = positions[spring.i] - positions[spring.j];
        let scale = spring.rest_length * STRAND_WIND_FACTOR;
        for v in [spring.i, spring.j] {
            forces[v] += perpendicular(wind[v], edge) * scale;
        }
    }
}

/// Component of `w` perpendicular to `axis` (all of `w` for a zero axis).
fn perpendicular(w: Vec3, axis: Vec3) -> Vec3 {
    let len_sq = axis.length_squared();
    if len_sq > 0.0 {
        w - axis * (w.dot(axis) / len_sq)
    } else {
        w
    }
}
