//! World ↔ root frame conversions.
//!
//! Every vertex lives in a root frame that may translate, rotate and
//! accelerate with respect to world space (hair roots follow the scalp).
//! Positions, velocities, forces and force Jacobians are stored in the
//! root frame; these conversions carry the Euler, Coriolis and centrifugal
//! terms so that the integrator can work as if the frame were inertial.
//!
//! Whether a body uses a real moving frame is decided by the solver's type
//! parameter: [`RootFrame`] applies the full transform, [`WorldFrame`]
//! makes every conversion an identity copy.
//!
//! Each pair is an exact inverse: converting to the root frame and back
//! reproduces the input up to rounding.

use glam::{Mat3, Vec3};
use tress_math::block::skew;

/// Rigid motion of one vertex's root frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootTransform {
    /// Frame origin in world space.
    pub origin: Vec3,
    /// Frame orientation (columns are the frame axes in world space).
    pub rotation: Mat3,
    /// Linear velocity of the origin.
    pub velocity: Vec3,
    /// Angular velocity ω.
    pub omega: Vec3,
    /// Linear acceleration of the origin.
    pub acceleration: Vec3,
    /// Angular acceleration dω/dt.
    pub domega_dt: Vec3,
}

impl Default for RootTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RootTransform {
    /// The world frame itself.
    pub const IDENTITY: Self = Self {
        origin: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
        velocity: Vec3::ZERO,
        omega: Vec3::ZERO,
        acceleration: Vec3::ZERO,
        domega_dt: Vec3::ZERO,
    };

    /// Root motion without accelerations.
    pub fn new(origin: Vec3, velocity: Vec3, rotation: Mat3, omega: Vec3) -> Self {
        Self {
            origin,
            rotation,
            velocity,
            omega,
            ..Self::IDENTITY
        }
    }

    pub fn with_acceleration(mut self, acceleration: Vec3, domega_dt: Vec3) -> Self {
        self.acceleration = acceleration;
        self.domega_dt = domega_dt;
        self
    }

    /// Sum of the fictitious terms `m·(dω×x) + 2m·(ω×v) + m·(ω×(ω×x))`.
    fn fictitious(&self, x: Vec3, v: Vec3, mass: f32) -> Vec3 {
        let euler = self.domega_dt.cross(x);
        let coriolis = 2.0 * self.omega.cross(v);
        let centrifugal = self.omega.cross(self.omega.cross(x));
        (euler + coriolis + centrifugal) * mass
    }

    /// `m·[dω]× + m·[ω]×[ω]×`
    fn fictitious_dfdx(&self, mass: f32) -> Mat3 {
        let w = skew(self.omega);
        (skew(self.domega_dt) + w * w) * mass
    }

    /// `2m·[ω]×`
    fn fictitious_dfdv(&self, mass: f32) -> Mat3 {
        skew(self.omega) * (2.0 * mass)
    }
}

/// Static choice of reference-frame handling.
///
/// Implemented by zero-sized markers; the solver is generic over it so the
/// choice costs nothing at run time.
pub trait FrameMapping: Send + Sync + 'static {
    /// Human-readable name for logs.
    const NAME: &'static str;

    fn position_to_root(root: &RootTransform, x: Vec3) -> Vec3;
    fn position_to_world(root: &RootTransform, x: Vec3) -> Vec3;

    /// `x` is the root-frame position of the vertex.
    fn velocity_to_root(root: &RootTransform, x: Vec3, v: Vec3) -> Vec3;
    fn velocity_to_world(root: &RootTransform, x: Vec3, v: Vec3) -> Vec3;

    /// `x` and `v` are the root-frame motion state of the vertex.
    fn force_to_root(root: &RootTransform, x: Vec3, v: Vec3, f: Vec3, mass: f32) -> Vec3;
    fn force_to_world(root: &RootTransform, x: Vec3, v: Vec3, f: Vec3, mass: f32) -> Vec3;

    fn dfdx_to_root(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3;
    fn dfdx_to_world(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3;
    fn dfdv_to_root(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3;
    fn dfdv_to_world(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3;

    /// Rotates a free vector (constraint axis, target velocity change).
    fn direction_to_root(root: &RootTransform, d: Vec3) -> Vec3;
    fn direction_to_world(root: &RootTransform, d: Vec3) -> Vec3;

    /// Acceleration is force per unit mass.
    fn acceleration_to_root(root: &RootTransform, x: Vec3, v: Vec3, a: Vec3) -> Vec3 {
        Self::force_to_root(root, x, v, a, 1.0)
    }

    fn acceleration_to_world(root: &RootTransform, x: Vec3, v: Vec3, a: Vec3) -> Vec3 {
        Self::force_to_world(root, x, v, a, 1.0)
    }
}

/// Every vertex is simulated directly in world space.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldFrame;

/// Every vertex is simulated in its own moving root frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootFrame;

impl FrameMapping for WorldFrame {
    const NAME: &'static str = "world";

    fn position_to_root(_: &RootTransform, x: Vec3) -> Vec3 {
        x
    }
    fn position_to_world(_: &RootTransform, x: Vec3) -> Vec3 {
        x
    }
    fn velocity_to_root(_: &RootTransform, _: Vec3, v: Vec3) -> Vec3 {
        v
    }
    fn velocity_to_world(_: &RootTransform, _: Vec3, v: Vec3) -> Vec3 {
        v
    }
    fn force_to_root(_: &RootTransform, _: Vec3, _: Vec3, f: Vec3, _: f32) -> Vec3 {
        f
    }
    fn force_to_world(_: &RootTransform, _: Vec3, _: Vec3, f: Vec3, _: f32) -> Vec3 {
        f
    }
    fn dfdx_to_root(_: &RootTransform, m: &Mat3, _: f32) -> Mat3 {
        *m
    }
    fn dfdx_to_world(_: &RootTransform, m: &Mat3, _: f32) -> Mat3 {
        *m
    }
    fn dfdv_to_root(_: &RootTransform, m: &Mat3, _: f32) -> Mat3 {
        *m
    }
    fn dfdv_to_world(_: &RootTransform, m: &Mat3, _: f32) -> Mat3 {
        *m
    }
    fn direction_to_root(_: &RootTransform, d: Vec3) -> Vec3 {
        d
    }
    fn direction_to_world(_: &RootTransform, d: Vec3) -> Vec3 {
        d
    }
}

impl FrameMapping for RootFrame {
    const NAME: &'static str = "root";

    fn position_to_root(root: &RootTransform, x: Vec3) -> Vec3 {
        root.rotation.transpose() * (x - root.origin)
    }

    fn position_to_world(root: &RootTransform, x: Vec3) -> Vec3 {
        root.rotation * x + root.origin
    }

    fn velocity_to_root(root: &RootTransform, x: Vec3, v: Vec3) -> Vec3 {
        root.rotation.transpose() * (v - root.velocity) + root.omega.cross(x)
    }

    fn velocity_to_world(root: &RootTransform, x: Vec3, v: Vec3) -> Vec3 {
        root.rotation * (v - root.omega.cross(x)) + root.velocity
    }

    fn force_to_root(root: &RootTransform, x: Vec3, v: Vec3, f: Vec3, mass: f32) -> Vec3 {
        root.fictitious(x, v, mass) + root.rotation.transpose() * (f - root.acceleration * mass)
    }

    fn force_to_world(root: &RootTransform, x: Vec3, v: Vec3, f: Vec3, mass: f32) -> Vec3 {
        root.rotation * (f - root.fictitious(x, v, mass)) + root.acceleration * mass
    }

    fn dfdx_to_root(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3 {
        let r = root.rotation;
        r.transpose() * *m * r + root.fictitious_dfdx(mass)
    }

    fn dfdx_to_world(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3 {
        let r = root.rotation;
        r * (*m - root.fictitious_dfdx(mass)) * r.transpose()
    }

    fn dfdv_to_root(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3 {
        let r = root.rotation;
        r.transpose() * *m * r + root.fictitious_dfdv(mass)
    }

    fn dfdv_to_world(root: &RootTransform, m: &Mat3, mass: f32) -> Mat3 {
        let r = root.rotation;
        r * (*m - root.fictitious_dfdv(mass)) * r.transpose()
    }

    fn direction_to_root(root: &RootTransform, d: Vec3) -> Vec3 {
        root.rotation.transpose() * d
    }

    fn direction_to_world(root: &RootTransform, d: Vec3) -> Vec3 {
        root.rotation * d
    }
}
