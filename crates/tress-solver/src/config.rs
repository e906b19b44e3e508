//! Solver configuration.
//!
//! Material coefficients, hair-volume coefficients and linear-solver
//! settings. Loaded from TOML; every section falls back to its defaults
//! when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tress_types::constants::{
    DEFAULT_CG_ITERATIONS, DEFAULT_CG_TOLERANCE, DEFAULT_GRID_RESOLUTION, GRAVITY, LENGTH_EPSILON,
};
use tress_types::{TressError, TressResult};

/// Which linear solver advances velocity each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    /// Filtered conjugate gradient on the block-sparse system.
    #[default]
    ConjugateGradient,
    /// faer sparse Cholesky on the constraint-projected system.
    Direct,
}

/// Spring material coefficients, shared by every spring of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    /// Base stiffness of structural, shear and sewing springs.
    pub structural: f32,
    /// Stiffness reached at a spring stiffness input of 1.
    pub max_structural: f32,
    /// Base bending stiffness.
    pub bending: f32,
    pub max_bending: f32,
    /// Base stiffness of goal springs (scaled towards `max_structural`).
    pub goal_stiffness: f32,
    /// Goal spring friction, in percent.
    pub goal_friction: f32,
    /// Ceiling on the elastic force magnitude of sewing springs.
    pub max_sewing_force: f32,
    /// Velocity damping along the spring axis.
    pub damping: f32,
    /// Average rest length; stiffnesses are divided by it.
    pub avg_spring_length: f32,
    /// Keep stretch springs active under compression.
    pub no_compression: bool,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            structural: 15.0,
            max_structural: 15.0,
            bending: 0.5,
            max_bending: 0.5,
            goal_stiffness: 1.0,
            goal_friction: 0.0,
            max_sewing_force: 0.0,
            damping: 5.0,
            avg_spring_length: 1.0,
            no_compression: false,
        }
    }
}

impl SpringParams {
    /// Stretch coefficient `k` for a structural, shear or sewing spring
    /// with stiffness input `s`.
    pub fn stretch_coefficient(&self, s: f32) -> f32 {
        let scaling = self.structural + s * (self.max_structural - self.structural).abs();
        scaling / (self.avg_spring_length + LENGTH_EPSILON)
    }

    /// Bending coefficient (`kb == cb`) for stiffness input `s`.
    pub fn bending_coefficient(&self, s: f32) -> f32 {
        let scaling = self.bending + s * (self.max_bending - self.bending).abs();
        scaling / (20.0 * (self.avg_spring_length + LENGTH_EPSILON))
    }

    /// Goal coefficient for stiffness input `s` and per-vertex goal weight.
    pub fn goal_coefficient(&self, s: f32, weight: f32) -> f32 {
        let scaling = self.goal_stiffness + s * (self.max_structural - self.goal_stiffness).abs();
        weight * scaling / (self.avg_spring_length + LENGTH_EPSILON)
    }
}

/// Coefficients of the volumetric hair interaction.
///
/// All zero disables the interaction grid entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairVolumeParams {
    /// Pull towards the grid-averaged neighbourhood velocity.
    pub velocity_smooth: f32,
    /// Pull towards the local collider velocity.
    pub collider_friction: f32,
    /// Push along the negative density gradient.
    pub pressure: f32,
    /// Gradient magnitude below which no pressure is applied.
    pub pressure_threshold: f32,
}

impl HairVolumeParams {
    /// True if any of the three effects is switched on.
    pub fn is_active(&self) -> bool {
        self.velocity_smooth > 0.0 || self.collider_friction > 0.0 || self.pressure > 0.0
    }
}

/// Configuration for the implicit integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Gravity vector [gx, gy, gz] in m/s², world frame.
    pub gravity: [f32; 3],

    /// Air viscosity in percent. Drag coefficient is `0.01 · air_viscosity`.
    pub air_viscosity: f32,

    /// Linear solver used for the velocity update.
    pub linear_solver: LinearSolverKind,

    /// Hard cap on conjugate-gradient iterations.
    pub cg_max_iterations: u32,

    /// Relative conjugate-gradient tolerance.
    pub cg_tolerance: f32,

    /// Cells per axis of the hair interaction grid.
    pub grid_resolution: usize,

    // Table-valued fields stay last for TOML output.
    /// Spring material coefficients.
    pub springs: SpringParams,

    /// Hair volume coefficients.
    pub hair_volume: HairVolumeParams,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -GRAVITY, 0.0],
            air_viscosity: 1.0,
            springs: SpringParams::default(),
            hair_volume: HairVolumeParams::default(),
            linear_solver: LinearSolverKind::ConjugateGradient,
            cg_max_iterations: DEFAULT_CG_ITERATIONS,
            cg_tolerance: DEFAULT_CG_TOLERANCE,
            grid_resolution: DEFAULT_GRID_RESOLUTION,
        }
    }
}

impl SolverConfig {
    /// Cloth defaults: moderately stiff, mild drag, no hair volume.
    pub fn cloth() -> Self {
        Self::default()
    }

    /// Hair defaults: softer bending, volume smoothing and pressure on.
    pub fn hair() -> Self {
        Self {
            springs: SpringParams {
                structural: 50.0,
                max_structural: 50.0,
                bending: 2.0,
                max_bending: 2.0,
                damping: 1.0,
                ..Default::default()
            },
            hair_volume: HairVolumeParams {
                velocity_smooth: 0.5,
                collider_friction: 0.0,
                pressure: 0.2,
                pressure_threshold: 0.1,
            },
            ..Default::default()
        }
    }

    /// Creates a config for debugging (no gravity or drag, fewer iterations).
    pub fn debug() -> Self {
        Self {
            gravity: [0.0; 3],
            air_viscosity: 0.0,
            cg_max_iterations: 20,
            cg_tolerance: 1e-2,
            ..Default::default()
        }
    }

    /// Checks that every coefficient is finite and in range.
    pub fn validate(&self) -> TressResult<()> {
        fn check(name: &str, value: f32) -> TressResult<()> {
            if !value.is_finite() || value < 0.0 {
                return Err(TressError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
            Ok(())
        }

        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(TressError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        check("air_viscosity", self.air_viscosity)?;

        let s = &self.springs;
        check("springs.structural", s.structural)?;
        check("springs.max_structural", s.max_structural)?;
        check("springs.bending", s.bending)?;
        check("springs.max_bending", s.max_bending)?;
        check("springs.goal_stiffness", s.goal_stiffness)?;
        check("springs.goal_friction", s.goal_friction)?;
        check("springs.max_sewing_force", s.max_sewing_force)?;
        check("springs.damping", s.damping)?;
        check("springs.avg_spring_length", s.avg_spring_length)?;

        let h = &self.hair_volume;
        check("hair_volume.velocity_smooth", h.velocity_smooth)?;
        check("hair_volume.collider_friction", h.collider_friction)?;
        check("hair_volume.pressure", h.pressure)?;
        check("hair_volume.pressure_threshold", h.pressure_threshold)?;

        if self.cg_max_iterations == 0 {
            return Err(TressError::InvalidConfig(
                "cg_max_iterations must be at least 1".into(),
            ));
        }
        if !self.cg_tolerance.is_finite() || self.cg_tolerance <= 0.0 {
            return Err(TressError::InvalidConfig(format!(
                "cg_tolerance must be positive, got {}",
                self.cg_tolerance
            )));
        }
        if self.grid_resolution < 2 {
            return Err(TressError::InvalidConfig(format!(
                "grid_resolution must be at least 2, got {}",
                self.grid_resolution
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> TressResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| TressError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> TressResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> TressResult<String> {
        toml::to_string_pretty(self).map_err(|e| TressError::Serialization(e.to_string()))
    }
}
