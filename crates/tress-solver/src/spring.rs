//! Spring force model.
//!
//! Each spring evaluates its force and 3×3 Jacobians from the current
//! root-frame state (phase 1, independent per spring, run in parallel),
//! then scatters them into the global force vector and block-sparse
//! Jacobians (phase 2, sequential in spring order).
//!
//! Sign convention for the scatter: the spring's off-diagonal block
//! receives `+J`, both endpoint diagonal blocks receive `−J`. The force is
//! added at `i` and subtracted at `j`, except for goal springs whose other
//! end is an animated target rather than a simulated vertex.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use tress_math::block::outer;
use tress_math::BlockSparseMatrix;
use tress_types::constants::ALMOST_ZERO;
use tress_types::BlockHandle;

use crate::config::SpringParams;

/// Closed set of spring laws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpringKind {
    Structural,
    Shear,
    /// Stretch spring whose elastic force is clamped to `max_sewing_force`.
    Sewing,
    /// Attachment of vertex `i` to an animated target.
    Goal,
    /// Compression-only spring following the empirical quartic law.
    Bending,
}

impl SpringKind {
    /// Structural, shear and sewing springs share the linear stretch law.
    pub fn is_stretch(self) -> bool {
        matches!(self, Self::Structural | Self::Shear | Self::Sewing)
    }
}

/// Animated target of a goal-anchored vertex.
///
/// The target for a step is `old + time · (new − old)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GoalTarget {
    /// Target position at the start of the frame (root frame).
    pub old: Vec3,
    /// Target position at the end of the frame (root frame).
    pub new: Vec3,
    /// Goal weight in `[0, 1]`; zero disables the pull.
    pub weight: f32,
}

impl GoalTarget {
    pub fn at(&self, time: f32) -> Vec3 {
        self.old + (self.new - self.old) * time
    }
}

/// Read-only inputs shared by every spring during evaluation.
pub struct SpringContext<'a> {
    pub positions: &'a [Vec3],
    pub velocities: &'a [Vec3],
    pub params: &'a SpringParams,
    /// Per-vertex goal targets (indexed by the goal spring's `i`).
    pub goals: &'a [GoalTarget],
    /// Fraction of the frame elapsed, used to interpolate goal targets.
    pub time: f32,
}

/// One spring between vertices `i` and `j`.
#[derive(Debug, Clone)]
pub struct Spring {
    pub i: usize,
    pub j: usize,
    pub kind: SpringKind,
    pub rest_length: f32,
    /// Stiffness input in `[0, 1]`, blending base and max coefficients.
    pub stiffness: f32,
    /// Persistent switch-off (tearing hook).
    pub deactivated: bool,

    handle: Option<BlockHandle>,
    active: bool,
    linear_branch: bool,
    force: Vec3,
    dfdx: Mat3,
    dfdv: Mat3,
}

impl Spring {
    /// Creates a spring with stiffness input 0.
    pub fn new(kind: SpringKind, i: usize, j: usize, rest_length: f32) -> Self {
        Self {
            i,
            j,
            kind,
            rest_length,
            stiffness: 0.0,
            deactivated: false,
            handle: None,
            active: false,
            linear_branch: false,
            force: Vec3::ZERO,
            dfdx: Mat3::ZERO,
            dfdv: Mat3::ZERO,
        }
    }

    pub fn structural(i: usize, j: usize, rest_length: f32) -> Self {
        Self::new(SpringKind::Structural, i, j, rest_length)
    }

    pub fn bending(i: usize, j: usize, rest_length: f32) -> Self {
        Self::new(SpringKind::Bending, i, j, rest_length)
    }

    pub fn goal(i: usize, j: usize) -> Self {
        Self::new(SpringKind::Goal, i, j, 0.0)
    }

    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Block handle assigned at registration.
    pub fn handle(&self) -> Option<BlockHandle> {
        self.handle
    }

    /// Binds the spring to its off-diagonal block. Unbound springs are
    /// evaluated but never scattered.
    pub fn bind(&mut self, handle: BlockHandle) {
        self.handle = Some(handle);
    }

    /// Whether the spring contributed during the last evaluation.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// For bending springs: whether the linear fallback won last step.
    pub fn used_linear_branch(&self) -> bool {
        self.linear_branch
    }

    /// Force on vertex `i` from the last evaluation.
    pub fn force(&self) -> Vec3 {
        self.force
    }

    pub fn dfdx(&self) -> Mat3 {
        self.dfdx
    }

    pub fn dfdv(&self) -> Mat3 {
        self.dfdv
    }

    /// Phase 1: computes the cached force and Jacobians.
    pub fn evaluate(&mut self, ctx: &SpringContext<'_>) {
        self.active = false;
        self.linear_branch = false;
        self.force = Vec3::ZERO;
        self.dfdx = Mat3::ZERO;
        self.dfdv = Mat3::ZERO;

        if self.deactivated {
            return;
        }

        let extent = ctx.positions[self.j] - ctx.positions[self.i];
        let vel = ctx.velocities[self.j] - ctx.velocities[self.i];
        let length = extent.length();
        let dir = if length > ALMOST_ZERO {
            extent / length
        } else {
            Vec3::ZERO
        };
        let l = self.rest_length;
        let params = ctx.params;

        match self.kind {
            SpringKind::Structural | SpringKind::Shear | SpringKind::Sewing => {
                if length <= l && !params.no_compression {
                    return;
                }
                self.active = true;

                let k = params.stretch_coefficient(self.stiffness);
                let mut elastic = k * (length - l);
                if self.kind == SpringKind::Sewing {
                    elastic = elastic.min(params.max_sewing_force);
                }
                self.force = dir * elastic + dir * (params.damping * vel.dot(dir));
                self.dfdx = stretch_jacobian(dir, length, l, k);
                self.dfdv = outer(dir, dir) * params.damping;
            }
            SpringKind::Goal => {
                self.active = true;

                let goal = ctx.goals.get(self.i).copied().unwrap_or_default();
                let target = goal.at(ctx.time);
                let k = params.goal_coefficient(self.stiffness, goal.weight);
                let friction = params.goal_friction * 0.01 * vel.dot(dir);
                self.force = -(ctx.positions[self.i] - target) * k + dir * friction;
            }
            SpringKind::Bending => {
                if length >= l {
                    return;
                }
                self.active = true;

                let kb = params.bending_coefficient(self.stiffness);
                let cb = kb;
                let (magnitude, slope, linear) = fbstar(length, l, kb, cb);
                self.linear_branch = linear;
                self.force = dir * magnitude;
                self.dfdx = outer(dir, dir) * slope;
            }
        }
    }

    /// Phase 2: scatters the cached contribution into the global buffers.
    pub fn apply(&self, forces: &mut [Vec3], dfdx: &mut BlockSparseMatrix, dfdv: &mut BlockSparseMatrix) {
        if !self.active {
            return;
        }
        let Some(handle) = self.handle else {
            return;
        };

        forces[self.i] += self.force;
        if self.kind != SpringKind::Goal {
            forces[self.j] -= self.force;
        }

        *dfdx.diagonal_mut(self.i) -= self.dfdx;
        *dfdx.diagonal_mut(self.j) -= self.dfdx;
        *dfdx.block_mut(handle) += self.dfdx;

        if self.kind != SpringKind::Bending {
            *dfdv.diagonal_mut(self.i) -= self.dfdv;
            *dfdv.diagonal_mut(self.j) -= self.dfdv;
            *dfdv.block_mut(handle) += self.dfdv;
        }
    }
}

/// `−k·[(I − d·dᵀ)·min(1, L/length) − I]`
fn stretch_jacobian(dir: Vec3, length: f32, rest_length: f32, k: f32) -> Mat3 {
    let ratio = if length > ALMOST_ZERO {
        (rest_length / length).min(1.0)
    } else {
        1.0
    };
    ((Mat3::IDENTITY - outer(dir, dir)) * ratio - Mat3::IDENTITY) * -k
}

/// Empirical bending law `fb(x)` with `x = length / rest_length`.
pub fn fb(length: f32, rest_length: f32) -> f32 {
    let x = length / rest_length;
    let xx = x * x;
    -11.541 * xx * xx + 34.193 * xx * x - 39.083 * xx + 23.116 * x - 9.713
}

/// `dfb/dx`.
pub fn fb_derivative(length: f32, rest_length: f32) -> f32 {
    let x = length / rest_length;
    let xx = x * x;
    -46.164 * xx * x + 102.579 * xx - 78.166 * x + 23.116
}

/// Bending force magnitude and its Jacobian scale.
///
/// Returns `(force, slope, linear)`: the larger signed value of the quartic
/// law `kb·fb` and the linear fallback `cb·(length − L)`, the derivative
/// of whichever branch won, and whether the linear branch won.
pub fn fbstar(length: f32, rest_length: f32, kb: f32, cb: f32) -> (f32, f32, bool) {
    let quartic = kb * fb(length, rest_length);
    let linear = cb * (length - rest_length);
    if quartic < linear {
        (linear, cb, true)
    } else {
        (quartic, kb * fb_derivative(length, rest_length), false)
    }
}
