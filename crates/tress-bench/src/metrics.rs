//! Data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Number of timesteps executed.
    pub timesteps: u32,
    /// Average wall-clock time per timestep (seconds).
    pub avg_step_time: f64,
    /// Minimum step time.
    pub min_step_time: f64,
    /// Maximum step time.
    pub max_step_time: f64,
    /// Final kinetic energy in the simulation frame.
    pub final_kinetic_energy: f64,
    /// Maximum vertex displacement from initial position (world space).
    pub max_displacement: f32,
    /// Average linear-solver iterations per step.
    pub avg_iterations: f32,
    /// Steps whose linear solve reached its tolerance.
    pub converged_steps: u32,
    /// Vertex count.
    pub vertex_count: usize,
    /// Spring count.
    pub spring_count: usize,
}

impl BenchmarkMetrics {
    /// CSV header row.
    pub fn to_csv_header() -> String {
        "scenario,vertex_count,spring_count,timesteps,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,final_ke,max_displacement,avg_iterations,converged_steps".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.6e},{:.6},{:.1},{}",
            self.scenario,
            self.vertex_count,
            self.spring_count,
            self.timesteps,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.final_kinetic_energy,
            self.max_displacement,
            self.avg_iterations,
            self.converged_steps,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }

    /// Fraction of steps that converged (1 for an empty run).
    pub fn convergence_rate(&self) -> f32 {
        if self.timesteps == 0 {
            1.0
        } else {
            self.converged_steps as f32 / self.timesteps as f32
        }
    }
}
