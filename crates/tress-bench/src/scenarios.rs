//! Benchmark scenarios: procedural body, pinning and config per test case.
//!
//! Three canonical scenarios for regression testing:
//! 1. **Hanging sheet**: cloth pinned along one edge, drapes under gravity and wind
//! 2. **Hair strand**: strand attached to a spinning root, with volume and collider friction
//! 3. **Spring pair**: two masses on a stretched spring relaxing to rest length

use std::f32::consts::TAU;

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tress_solver::{ColliderPoint, RootTransform, SolverConfig, SpringParams};
use tress_types::constants::DEFAULT_DT;

use crate::generators::{cloth_grid, hair_strand, spring_pair, Body};

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Cloth pinned along one edge, hanging under gravity.
    HangingSheet,
    /// Hair strand on a spinning root (root-frame simulation).
    HairStrand,
    /// Two vertices and one stretched spring.
    SpringPair,
}

impl ScenarioKind {
    /// Returns all scenario kinds.
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::HangingSheet,
            ScenarioKind::HairStrand,
            ScenarioKind::SpringPair,
        ]
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::HangingSheet => "hanging_sheet",
            ScenarioKind::HairStrand => "hair_strand",
            ScenarioKind::SpringPair => "spring_pair",
        }
    }

    /// Inverse of [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// Rigid spin of a root frame about its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMotion {
    pub origin: Vec3,
    /// Angular velocity (rad/s); the rotation axis is its direction.
    pub omega: Vec3,
}

impl RootMotion {
    /// Root transform after `time` seconds of spinning.
    pub fn transform_at(&self, time: f32) -> RootTransform {
        let rotation = Mat3::from_quat(Quat::from_scaled_axis(self.omega * time));
        RootTransform::new(self.origin, Vec3::ZERO, rotation, self.omega)
    }
}

/// A fully specified benchmark scenario.
pub struct Scenario {
    /// Scenario type.
    pub kind: ScenarioKind,
    /// Simulated body.
    pub body: Body,
    /// Per-vertex pinning (zero velocity change).
    pub pinned: Vec<bool>,
    /// Solver configuration.
    pub config: SolverConfig,
    /// Number of timesteps to simulate.
    pub timesteps: u32,
    /// Timestep size (seconds).
    pub dt: f32,
    /// Per-vertex mass (kg).
    pub vertex_mass: f32,
    /// Uniform wind force sample, world frame.
    pub wind: Option<Vec3>,
    /// Root-frame motion. `Some` runs the solver in root frames.
    pub root_motion: Option<RootMotion>,
    /// Collider samples for hair friction.
    pub colliders: Vec<ColliderPoint>,
}

impl Scenario {
    /// Create the hanging sheet scenario.
    ///
    /// A 1m × 1m cloth at 20×20 resolution, pinned along its first row,
    /// hanging under gravity with a light breeze for 2 seconds at 60fps.
    pub fn hanging_sheet() -> Self {
        let cols = 20;
        let body = cloth_grid(cols, 20, 1.0, 1.0, 1.0);
        let n = body.vertex_count();

        let mut pinned = vec![false; n];
        for item in pinned.iter_mut().take(cols + 1) {
            *item = true;
        }

        let mut config = SolverConfig::cloth();
        config.springs.avg_spring_length = body.avg_structural_length();

        Self {
            kind: ScenarioKind::HangingSheet,
            body,
            pinned,
            config,
            timesteps: 120,
            dt: DEFAULT_DT,
            vertex_mass: 0.002, // ~0.9 kg/m² over 441 vertices
            wind: Some(Vec3::new(0.0, 0.0, 2.0)),
            root_motion: None,
            colliders: Vec::new(),
        }
    }

    /// Create the hair strand scenario.
    ///
    /// A 0.3m strand of 24 segments sticks out horizontally from a root
    /// spinning at 2 rad/s about +Y. A ring of collider samples stands in
    /// for the scalp.
    pub fn hair_strand() -> Self {
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let body = hair_strand(24, 0.3, origin, Vec3::X);
        let n = body.vertex_count();

        let mut pinned = vec![false; n];
        pinned[0] = true;

        let mut config = SolverConfig::hair();
        config.springs.avg_spring_length = body.avg_structural_length();
        config.hair_volume.collider_friction = 0.2;

        let colliders = (0..16)
            .map(|k| {
                let angle = TAU * k as f32 / 16.0;
                ColliderPoint {
                    position: origin + Vec3::new(angle.cos(), 0.0, angle.sin()) * 0.1,
                    velocity: Vec3::ZERO,
                }
            })
            .collect();

        Self {
            kind: ScenarioKind::HairStrand,
            body,
            pinned,
            config,
            timesteps: 120,
            dt: DEFAULT_DT,
            vertex_mass: 0.0005,
            wind: Some(Vec3::new(0.0, 0.0, 0.5)),
            root_motion: Some(RootMotion {
                origin,
                omega: Vec3::new(0.0, 2.0, 0.0),
            }),
            colliders,
        }
    }

    /// Create the spring pair scenario.
    ///
    /// Two unit masses on a spring of rest length 1 and stiffness 100,
    /// released at length 1.5 without gravity or drag, for 1000 steps of
    /// 0.01s. The spring also resists compression; otherwise the pair
    /// overshoots through itself once it passes rest length.
    pub fn spring_pair() -> Self {
        let mut config = SolverConfig::debug();
        config.springs = SpringParams {
            structural: 100.0,
            max_structural: 100.0,
            damping: 0.5,
            avg_spring_length: 1.0,
            no_compression: true,
            ..Default::default()
        };
        config.cg_max_iterations = 100;

        Self {
            kind: ScenarioKind::SpringPair,
            body: spring_pair(1.0, 1.5),
            pinned: vec![false; 2],
            config,
            timesteps: 1000,
            dt: 0.01,
            vertex_mass: 1.0,
            wind: None,
            root_motion: None,
            colliders: Vec::new(),
        }
    }

    /// Create a scenario by kind.
    pub fn from_kind(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::HangingSheet => Self::hanging_sheet(),
            ScenarioKind::HairStrand => Self::hair_strand(),
            ScenarioKind::SpringPair => Self::spring_pair(),
        }
    }

    /// Replace the solver configuration, keeping the scenario's average
    /// spring length.
    pub fn with_config(mut self, mut config: SolverConfig) -> Self {
        config.springs.avg_spring_length = self.config.springs.avg_spring_length;
        self.config = config;
        self
    }
}
