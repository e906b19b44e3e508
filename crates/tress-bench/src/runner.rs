//! Benchmark runner. Executes scenarios with the implicit solver and
//! collects metrics.
//!
//! Scenarios with root motion run with [`RootFrame`]; all others run
//! directly in world space with [`WorldFrame`].

use std::time::Instant;

use glam::Vec3;
use tress_solver::{FrameMapping, GridChannel, ImplicitSolver, RootFrame, WorldFrame};
use tress_telemetry::EventBus;
use tress_types::TressResult;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Metrics plus the final state of a run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub metrics: BenchmarkMetrics,
    /// Final world-space positions.
    pub positions: Vec<Vec3>,
    /// Final world-space velocities.
    pub velocities: Vec<Vec3>,
    /// Hair-grid channel exported after the last step, if requested.
    pub grid: Option<Vec<f32>>,
}

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario and return its metrics.
    pub fn run(scenario: &Scenario) -> TressResult<BenchmarkMetrics> {
        Ok(Self::run_detailed(scenario, None, None)?.metrics)
    }

    /// Run a single scenario, optionally exporting a hair-grid channel at
    /// the end and routing solver events to `telemetry`.
    pub fn run_detailed(
        scenario: &Scenario,
        grid_channel: Option<GridChannel>,
        telemetry: Option<EventBus>,
    ) -> TressResult<RunOutcome> {
        if scenario.root_motion.is_some() {
            Self::run_in::<RootFrame>(scenario, grid_channel, telemetry)
        } else {
            Self::run_in::<WorldFrame>(scenario, grid_channel, telemetry)
        }
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all() -> TressResult<Vec<BenchmarkMetrics>> {
        ScenarioKind::all()
            .iter()
            .map(|&kind| Self::run(&Scenario::from_kind(kind)))
            .collect()
    }

    /// Builds a solver holding the scenario's body, pins, wind and colliders.
    pub fn build_solver<F: FrameMapping>(scenario: &Scenario) -> TressResult<ImplicitSolver<F>> {
        let body = &scenario.body;
        let n = body.vertex_count();
        let mut solver = ImplicitSolver::<F>::new(n, body.spring_count(), scenario.config.clone())?;

        if let Some(motion) = &scenario.root_motion {
            let root = motion.transform_at(0.0);
            for i in 0..n {
                solver.set_root_transform(i, root)?;
            }
        }
        for (i, &x) in body.positions.iter().enumerate() {
            solver.set_vertex_mass(i, scenario.vertex_mass)?;
            solver.set_motion_state(i, x, Vec3::ZERO)?;
        }
        for (slot, spring) in body.springs.iter().enumerate() {
            solver.set_spring(slot, spring.clone())?;
        }
        solver.set_faces(body.faces.clone())?;
        if let Some(wind) = scenario.wind {
            solver.set_wind(Some(vec![wind; n]))?;
        }
        solver.set_colliders(scenario.colliders.clone());

        for (i, &pinned) in scenario.pinned.iter().enumerate() {
            if pinned {
                solver.add_constraint_ndof0(i, Vec3::ZERO)?;
            }
        }
        Ok(solver)
    }

    fn run_in<F: FrameMapping>(
        scenario: &Scenario,
        grid_channel: Option<GridChannel>,
        telemetry: Option<EventBus>,
    ) -> TressResult<RunOutcome> {
        let mut solver = Self::build_solver::<F>(scenario)?;
        if let Some(bus) = telemetry {
            solver.attach_telemetry(bus);
        }

        let n = scenario.body.vertex_count();
        let mut step_times: Vec<f64> = Vec::with_capacity(scenario.timesteps as usize);
        let mut total_iterations: u32 = 0;
        let mut converged_steps: u32 = 0;

        let total_start = Instant::now();

        for step in 0..scenario.timesteps {
            if let Some(motion) = &scenario.root_motion {
                let root = motion.transform_at(step as f32 * scenario.dt);
                for i in 0..n {
                    solver.set_root_transform(i, root)?;
                }
            }
            let report = solver.solve(scenario.dt)?;
            solver.commit();

            step_times.push(report.wall_time);
            total_iterations += report.iterations;
            if report.converged {
                converged_steps += 1;
            }
        }

        let total_wall_time = total_start.elapsed().as_secs_f64();

        if let Some(mut bus) = solver.detach_telemetry() {
            bus.finalize();
        }

        let mut positions = Vec::with_capacity(n);
        let mut velocities = Vec::with_capacity(n);
        for i in 0..n {
            let (x, v) = solver.motion_state(i)?;
            positions.push(x);
            velocities.push(v);
        }

        let max_displacement = positions
            .iter()
            .zip(&scenario.body.positions)
            .map(|(x, x0)| (*x - *x0).length())
            .fold(0.0f32, f32::max);

        let avg_step = if step_times.is_empty() {
            0.0
        } else {
            step_times.iter().sum::<f64>() / step_times.len() as f64
        };
        let min_step = step_times.iter().copied().fold(f64::MAX, f64::min);
        let max_step = step_times.iter().copied().fold(0.0, f64::max);
        let avg_iter = if scenario.timesteps > 0 {
            total_iterations as f32 / scenario.timesteps as f32
        } else {
            0.0
        };

        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            total_wall_time,
            timesteps: scenario.timesteps,
            avg_step_time: avg_step,
            min_step_time: if step_times.is_empty() { 0.0 } else { min_step },
            max_step_time: max_step,
            final_kinetic_energy: solver.state().kinetic_energy(),
            max_displacement,
            avg_iterations: avg_iter,
            converged_steps,
            vertex_count: n,
            spring_count: scenario.body.spring_count(),
        };
        tracing::info!(
            scenario = %metrics.scenario,
            timesteps = metrics.timesteps,
            total_wall_time = metrics.total_wall_time,
            converged_steps,
            "benchmark finished"
        );

        Ok(RunOutcome {
            metrics,
            positions,
            velocities,
            grid: grid_channel.map(|channel| solver.hair_grid_export(channel)),
        })
    }
}
