//! Implicit integrator driver.
//!
//! One call to [`ImplicitSolver::solve`] performs a full backward-Euler
//! step:
//! 1. **Forces**: gravity, hair volume, drag, wind and springs fill
//!    `F`, `dF/dX` and `dF/dV`
//! 2. **Assemble**: `A = M − dt·dF/dV − dt²·dF/dX`,
//!    `b = dt·F + dt²·dF/dX·V`
//! 3. **Solve**: `A·dv = b` under the constraint filter
//! 4. **Advance**: `Vnew = V + dv`, `Xnew = X + dt·Vnew`
//!
//! [`ImplicitSolver::commit`] then makes the result authoritative.

use std::marker::PhantomData;
use std::time::Instant;

use glam::{Mat3, Vec3};
use rayon::prelude::*;
use tress_math::block::scaled_identity;
use tress_math::long_vector;
use tress_math::BlockSparseMatrix;
use tress_telemetry::{EventBus, EventKind};
use tress_types::{BlockHandle, TressError, TressResult};

use crate::cg::{self, CgOutcome, CgSettings};
use crate::config::{HairVolumeParams, LinearSolverKind, SolverConfig, SpringParams};
use crate::constraint::ConstraintSet;
use crate::forces::{self, Face};
use crate::frame::{FrameMapping, RootTransform};
use crate::grid::{self, ColliderPoint, GridChannel, GridStats, InteractionGrid};
use crate::projected;
use crate::spring::{GoalTarget, Spring, SpringContext, SpringKind};
use crate::state::VertexState;

/// Summary of one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Linear-solver iterations (1 for the direct solver).
    pub iterations: u32,
    /// Final filtered residual `r·r`.
    pub residual: f32,
    /// Whether the linear solve reached its tolerance.
    pub converged: bool,
    /// Springs that contributed this step.
    pub active_springs: u32,
    /// Hair grid statistics, if the grid was built.
    pub grid: Option<GridStats>,
    /// Wall-clock time for the whole step (seconds).
    pub wall_time: f64,
}

/// Backward-Euler mass-spring integrator.
///
/// `F` selects the reference-frame handling: [`crate::WorldFrame`] for
/// cloth, [`crate::RootFrame`] for hair attached to a moving surface.
pub struct ImplicitSolver<F: FrameMapping> {
    config: SolverConfig,
    state: VertexState,
    roots: Vec<RootTransform>,
    /// Spring slots; `None` until registered.
    springs: Vec<Option<Spring>>,
    /// Block layout shared by every per-step matrix.
    layout: BlockSparseMatrix,
    constraints: ConstraintSet,
    goals: Vec<GoalTarget>,
    goal_time: f32,
    faces: Vec<Face>,
    wind: Option<Vec<Vec3>>,
    colliders: Vec<ColliderPoint>,
    telemetry: Option<EventBus>,
    step_index: u32,
    _frame: PhantomData<F>,
}

impl<F: FrameMapping> ImplicitSolver<F> {
    /// Creates a solver with all vertices at rest at the origin, unit
    /// masses, identity root frames, and no constraints.
    pub fn new(vertex_count: usize, spring_count: usize, config: SolverConfig) -> TressResult<Self> {
        config.validate()?;
        tracing::debug!(vertex_count, spring_count, frame = F::NAME, "creating implicit solver");
        Ok(Self {
            config,
            state: VertexState::new(vertex_count),
            roots: vec![RootTransform::IDENTITY; vertex_count],
            springs: vec![None; spring_count],
            layout: BlockSparseMatrix::new(vertex_count, spring_count),
            constraints: ConstraintSet::new(vertex_count),
            goals: vec![GoalTarget::default(); vertex_count],
            goal_time: 1.0,
            faces: Vec::new(),
            wind: None,
            colliders: Vec::new(),
            telemetry: None,
            step_index: 0,
            _frame: PhantomData,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.state.vertex_count()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Root-frame state, including the uncommitted result of the last solve.
    pub fn state(&self) -> &VertexState {
        &self.state
    }

    pub fn spring(&self, slot: usize) -> Option<&Spring> {
        self.springs.get(slot).and_then(Option::as_ref)
    }

    /// Registered springs in slot order.
    pub fn springs(&self) -> impl Iterator<Item = &Spring> {
        self.springs.iter().flatten()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn root_transform(&self, i: usize) -> TressResult<&RootTransform> {
        self.check_vertex(i)?;
        Ok(&self.roots[i])
    }

    fn check_vertex(&self, i: usize) -> TressResult<()> {
        let len = self.vertex_count();
        if i >= len {
            return Err(TressError::IndexOutOfRange {
                kind: "vertex",
                index: i,
                len,
            });
        }
        Ok(())
    }

    fn check_slot(&self, slot: usize) -> TressResult<()> {
        let len = self.springs.len();
        if slot >= len {
            return Err(TressError::IndexOutOfRange {
                kind: "spring slot",
                index: slot,
                len,
            });
        }
        Ok(())
    }

    // ─── Setters ──────────────────────────────────────────────

    /// Sets the root motion of vertex `i`; accelerations are zeroed.
    pub fn set_root_motion(
        &mut self,
        i: usize,
        origin: Vec3,
        velocity: Vec3,
        rotation: Mat3,
        omega: Vec3,
    ) -> TressResult<()> {
        self.set_root_transform(i, RootTransform::new(origin, velocity, rotation, omega))
    }

    /// Sets the full root transform of vertex `i`.
    pub fn set_root_transform(&mut self, i: usize, root: RootTransform) -> TressResult<()> {
        self.check_vertex(i)?;
        self.roots[i] = root;
        Ok(())
    }

    /// Sets world-space position and velocity of vertex `i`.
    pub fn set_motion_state(&mut self, i: usize, x: Vec3, v: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        let x_root = F::position_to_root(root, x);
        self.state.positions[i] = x_root;
        self.state.velocities[i] = F::velocity_to_root(root, x_root, v);
        Ok(())
    }

    pub fn set_position(&mut self, i: usize, x: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        self.state.positions[i] = F::position_to_root(&self.roots[i], x);
        Ok(())
    }

    /// Sets the world-space velocity of vertex `i` (uses its current position).
    pub fn set_velocity(&mut self, i: usize, v: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        self.state.velocities[i] =
            F::velocity_to_root(&self.roots[i], self.state.positions[i], v);
        Ok(())
    }

    pub fn set_vertex_mass(&mut self, i: usize, mass: f32) -> TressResult<()> {
        self.check_vertex(i)?;
        self.state.masses[i] = mass;
        Ok(())
    }

    /// Tags spring slot `slot` with endpoints `(i, j)` in the block layout.
    ///
    /// The returned handle addresses the slot's off-diagonal block.
    pub fn init_spring(&mut self, slot: usize, i: usize, j: usize) -> TressResult<BlockHandle> {
        self.check_slot(slot)?;
        let n = self.vertex_count();
        if i >= n || j >= n {
            return Err(TressError::InvalidSpring(format!(
                "slot {slot}: endpoints ({i}, {j}) out of range for {n} vertices"
            )));
        }
        Ok(self.layout.init_spring(slot, i, j))
    }

    /// Registers `spring` in slot `slot`, tagging the layout with its endpoints.
    pub fn set_spring(&mut self, slot: usize, mut spring: Spring) -> TressResult<BlockHandle> {
        if !(spring.rest_length.is_finite() && spring.rest_length >= 0.0) {
            return Err(TressError::InvalidSpring(format!(
                "slot {slot}: rest length must be finite and non-negative, got {}",
                spring.rest_length
            )));
        }
        if spring.i == spring.j && spring.kind != SpringKind::Goal {
            return Err(TressError::InvalidSpring(format!(
                "slot {slot}: {:?} spring connects vertex {} to itself",
                spring.kind, spring.i
            )));
        }
        let handle = self.init_spring(slot, spring.i, spring.j)?;
        spring.bind(handle);
        self.springs[slot] = Some(spring);
        Ok(handle)
    }

    /// Switches a spring off permanently (tearing).
    pub fn deactivate_spring(&mut self, slot: usize) -> TressResult<()> {
        self.check_slot(slot)?;
        match self.springs[slot].as_mut() {
            Some(spring) => {
                spring.deactivated = true;
                Ok(())
            }
            None => Err(TressError::InvalidSpring(format!("slot {slot} is not registered"))),
        }
    }

    /// Sets the goal target of vertex `i`, world space.
    pub fn set_goal_target(&mut self, i: usize, old: Vec3, new: Vec3, weight: f32) -> TressResult<()> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        self.goals[i] = GoalTarget {
            old: F::position_to_root(root, old),
            new: F::position_to_root(root, new),
            weight,
        };
        Ok(())
    }

    /// Fraction of the frame elapsed at the end of the next step; goal
    /// targets are interpolated with it. Defaults to 1.
    pub fn set_goal_time(&mut self, time: f32) {
        self.goal_time = time;
    }

    /// Cloth faces used for face-projected wind. Without faces wind acts
    /// on structural edges (hair).
    pub fn set_faces(&mut self, faces: Vec<Face>) -> TressResult<()> {
        let n = self.vertex_count();
        if let Some(&v) = faces.iter().flat_map(|f| f.vertices()).find(|&&v| v >= n) {
            return Err(TressError::IndexOutOfRange {
                kind: "face vertex",
                index: v,
                len: n,
            });
        }
        self.faces = faces;
        Ok(())
    }

    /// Per-vertex wind force samples (world frame), or `None` for no wind.
    pub fn set_wind(&mut self, wind: Option<Vec<Vec3>>) -> TressResult<()> {
        if let Some(w) = &wind {
            if w.len() != self.vertex_count() {
                return Err(TressError::DimensionMismatch {
                    expected: self.vertex_count(),
                    found: w.len(),
                });
            }
        }
        self.wind = wind;
        Ok(())
    }

    /// Collider samples for the hair friction grid (root frame of the body).
    pub fn set_colliders(&mut self, colliders: Vec<ColliderPoint>) {
        self.colliders = colliders;
    }

    pub fn set_spring_params(&mut self, params: SpringParams) {
        self.config.springs = params;
    }

    pub fn set_hair_volume(&mut self, params: HairVolumeParams) {
        self.config.hair_volume = params;
    }

    // ─── Constraints ──────────────────────────────────────────

    /// Resets every vertex to unconstrained.
    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
    }

    /// Pins vertex `i`: its velocity change is exactly `dv` (world frame).
    pub fn add_constraint_ndof0(&mut self, i: usize, dv: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        self.constraints.pin(i, F::direction_to_root(root, dv));
        Ok(())
    }

    /// Lets vertex `i` move only along the axis orthogonal to `c1` and `c2`.
    pub fn add_constraint_ndof1(&mut self, i: usize, c1: Vec3, c2: Vec3, dv: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        self.constraints.slide_line(
            i,
            F::direction_to_root(root, c1),
            F::direction_to_root(root, c2),
            F::direction_to_root(root, dv),
        );
        Ok(())
    }

    /// Lets vertex `i` move only within the plane orthogonal to `c1`.
    pub fn add_constraint_ndof2(&mut self, i: usize, c1: Vec3, dv: Vec3) -> TressResult<()> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        self.constraints
            .slide_plane(i, F::direction_to_root(root, c1), F::direction_to_root(root, dv));
        Ok(())
    }

    // ─── Telemetry ────────────────────────────────────────────

    pub fn attach_telemetry(&mut self, bus: EventBus) {
        self.telemetry = Some(bus);
    }

    pub fn telemetry_mut(&mut self) -> Option<&mut EventBus> {
        self.telemetry.as_mut()
    }

    pub fn detach_telemetry(&mut self) -> Option<EventBus> {
        self.telemetry.take()
    }

    fn emit(&self, kind: EventKind) {
        if let Some(bus) = &self.telemetry {
            bus.record(kind);
        }
    }

    // ─── Step ─────────────────────────────────────────────────

    /// Advances the tentative state by `dt`.
    ///
    /// Linear-solver non-convergence is reported in the returned
    /// [`StepReport`], not as an error. Errors are an invalid `dt` or a
    /// failed direct factorization.
    pub fn solve(&mut self, dt: f32) -> TressResult<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(TressError::InvalidTimestep(dt));
        }
        let start = Instant::now();
        let n = self.vertex_count();
        if let Some(bus) = self.telemetry.as_mut() {
            bus.begin_step(self.step_index);
        }
        self.emit(EventKind::StepBegin { dt });

        // ─── Forces ───
        // The layout carries tags only; its values stay zero.
        let mut f = long_vector::zeros(n);
        let mut dfdx = self.layout.clone();
        let mut dfdv = self.layout.clone();

        let gravity = Vec3::from_array(self.config.gravity);
        forces::add_gravity::<F>(
            &mut f,
            &self.state.positions,
            &self.state.velocities,
            &self.state.masses,
            &self.roots,
            gravity,
        );

        let grid_stats = grid::add_volume_forces(
            &mut f,
            &self.state.positions,
            &self.state.velocities,
            &self.colliders,
            &self.config.hair_volume,
            self.config.grid_resolution,
        );
        if let Some(stats) = grid_stats {
            self.emit(EventKind::GridBuilt {
                occupied_cells: stats.occupied_cells,
                total_density: stats.total_density,
            });
        }

        forces::add_drag(&mut f, &mut dfdv, &self.state.velocities, self.config.air_viscosity);

        if let Some(wind) = &self.wind {
            let wind_root: Vec<Vec3> = wind
                .iter()
                .zip(&self.roots)
                .map(|(w, root)| F::direction_to_root(root, *w))
                .collect();
            if self.faces.is_empty() {
                let springs = self.springs.iter().flatten();
                forces::add_strand_wind(&mut f, &self.state.positions, springs, &wind_root);
            } else {
                forces::add_face_wind(&mut f, &self.state.positions, &self.faces, &wind_root);
            }
        }

        let ctx = SpringContext {
            positions: &self.state.positions,
            velocities: &self.state.velocities,
            params: &self.config.springs,
            goals: &self.goals,
            time: self.goal_time,
        };
        self.springs
            .par_iter_mut()
            .filter_map(Option::as_mut)
            .for_each(|spring| spring.evaluate(&ctx));

        let mut active_springs = 0;
        for spring in self.springs.iter().flatten() {
            if spring.is_active() {
                spring.apply(&mut f, &mut dfdx, &mut dfdv);
                active_springs += 1;
            }
        }
        self.emit(EventKind::SpringActivity {
            active: active_springs,
            total: self.springs.len() as u32,
        });

        // ─── Assemble ───
        let mut a = self.layout.clone();
        for (i, &m) in self.state.masses.iter().enumerate() {
            *a.diagonal_mut(i) = scaled_identity(m);
        }
        a.sub_scaled(&dfdv, dt, &dfdx, dt * dt);

        let mut dfdx_v = long_vector::zeros(n);
        dfdx.mul_vector(&self.state.velocities, &mut dfdx_v);
        let mut b = long_vector::zeros(n);
        long_vector::combine(&mut b, &f, dt, &dfdx_v, dt * dt);

        // ─── Solve ───
        let mut dv = long_vector::zeros(n);
        let outcome = if n == 0 {
            CgOutcome {
                iterations: 0,
                residual: 0.0,
                converged: true,
            }
        } else {
            match self.config.linear_solver {
                LinearSolverKind::ConjugateGradient => {
                    let settings = CgSettings {
                        max_iterations: self.config.cg_max_iterations,
                        tolerance: self.config.cg_tolerance,
                    };
                    let bus = self.telemetry.as_ref();
                    let on_iteration = |iteration, residual| {
                        if let Some(bus) = bus {
                            bus.record(EventKind::CgIteration { iteration, residual });
                        }
                    };
                    cg::solve_filtered(&a, &b, &self.constraints, &settings, &mut dv, on_iteration)
                }
                LinearSolverKind::Direct => {
                    projected::solve_projected(&a, &b, &self.constraints, &mut dv)?;
                    CgOutcome {
                        iterations: 1,
                        residual: self.filtered_residual(&a, &b, &dv),
                        converged: true,
                    }
                }
            }
        };

        // ─── Advance ───
        self.state.advance(&dv, dt);

        self.emit(EventKind::Convergence {
            iterations: outcome.iterations,
            residual: outcome.residual,
            converged: outcome.converged,
        });
        if !outcome.converged {
            tracing::warn!(
                step = self.step_index,
                iterations = outcome.iterations,
                residual = outcome.residual,
                "implicit step did not converge"
            );
        }

        let wall_time = start.elapsed().as_secs_f64();
        tracing::debug!(
            step = self.step_index,
            iterations = outcome.iterations,
            active_springs,
            wall_time,
            "implicit step"
        );
        self.emit(EventKind::StepEnd { wall_time });
        if let Some(bus) = self.telemetry.as_mut() {
            bus.end_step();
        }
        self.step_index += 1;

        Ok(StepReport {
            iterations: outcome.iterations,
            residual: outcome.residual,
            converged: outcome.converged,
            active_springs,
            grid: grid_stats,
            wall_time,
        })
    }

    /// `‖filter(b − A·dv)‖²`
    fn filtered_residual(&self, a: &BlockSparseMatrix, b: &[Vec3], dv: &[Vec3]) -> f32 {
        let mut adv = long_vector::zeros(b.len());
        a.mul_vector(dv, &mut adv);
        let mut r = long_vector::zeros(b.len());
        long_vector::sub(&mut r, b, &adv);
        self.constraints.filter(&mut r);
        long_vector::norm_squared(&r)
    }

    /// Makes the result of the last `solve` authoritative.
    pub fn commit(&mut self) {
        self.state.commit();
    }

    /// World-space position and velocity of vertex `i` (committed state).
    pub fn motion_state(&self, i: usize) -> TressResult<(Vec3, Vec3)> {
        self.check_vertex(i)?;
        let root = &self.roots[i];
        let x = self.state.positions[i];
        let v = self.state.velocities[i];
        Ok((F::position_to_world(root, x), F::velocity_to_world(root, x, v)))
    }

    /// Builds the hair grid from the committed state and exports one channel.
    pub fn hair_grid_export(&self, channel: GridChannel) -> Vec<f32> {
        InteractionGrid::build(
            self.config.grid_resolution,
            &self.state.positions,
            &self.state.velocities,
        )
        .export(channel)
    }
}
