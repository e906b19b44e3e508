//! CLI command implementations.

use std::collections::BTreeMap;
use std::path::Path;

use clap::ValueEnum;
use glam::Vec3;
use serde::Serialize;
use tress_bench::metrics::BenchmarkMetrics;
use tress_bench::runner::BenchmarkRunner;
use tress_bench::scenarios::{Scenario, ScenarioKind};
use tress_solver::{GridChannel, SolverConfig};
use tress_telemetry::{EventBus, EventKind, VecSink};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Grid channel as a command-line value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Channel {
    Density,
    Velocity,
}

impl From<Channel> for GridChannel {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Density => GridChannel::Density,
            Channel::Velocity => GridChannel::Velocity,
        }
    }
}

/// JSON document written by `simulate --output`.
#[derive(Serialize)]
struct SimulationOutput<'a> {
    metrics: &'a BenchmarkMetrics,
    positions: &'a [Vec3],
    velocities: &'a [Vec3],
}

/// JSON document written by `grid`.
#[derive(Serialize)]
struct GridOutput<'a> {
    scenario: &'a str,
    channel: GridChannel,
    resolution: usize,
    data: &'a [f32],
}

fn parse_scenario(name: &str) -> Result<ScenarioKind, Box<dyn std::error::Error>> {
    ScenarioKind::from_name(name).ok_or_else(|| {
        let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
        format!("Unknown scenario: '{name}'. Available: {}", available.join(", ")).into()
    })
}

fn event_label(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::StepBegin { .. } => "step_begin",
        EventKind::CgIteration { .. } => "cg_iteration",
        EventKind::SpringActivity { .. } => "spring_activity",
        EventKind::GridBuilt { .. } => "grid_built",
        EventKind::Convergence { .. } => "convergence",
        EventKind::StepEnd { .. } => "step_end",
    }
}

/// Run one scenario, optionally with a config file.
pub fn simulate(
    config_path: Option<&str>,
    scenario_name: &str,
    steps: Option<u32>,
    output_path: Option<&str>,
    show_events: bool,
) -> CliResult {
    println!("tress Simulation");
    println!("────────────────");

    let kind = parse_scenario(scenario_name)?;
    let mut scenario = Scenario::from_kind(kind);
    if let Some(path) = config_path {
        println!("Config:    {path}");
        scenario = scenario.with_config(SolverConfig::load(Path::new(path))?);
    }
    if let Some(steps) = steps {
        scenario.timesteps = steps;
    }

    println!("Scenario:  {}", kind.name());
    println!(
        "Body:      {} verts, {} springs",
        scenario.body.vertex_count(),
        scenario.body.spring_count()
    );
    println!("Steps:     {} × {:.4}s", scenario.timesteps, scenario.dt);
    println!("Solver:    {:?}", scenario.config.linear_solver);
    println!();

    let sink = VecSink::new();
    let telemetry = show_events.then(|| {
        let mut bus = EventBus::new();
        bus.add_sink(Box::new(sink.clone()));
        bus
    });

    let outcome = BenchmarkRunner::run_detailed(&scenario, None, telemetry)
        .map_err(|e| format!("Simulation failed: {e}"))?;
    let metrics = &outcome.metrics;

    println!("  Wall time:     {:.3}s", metrics.total_wall_time);
    println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
    println!("  Avg iters:     {:.1}", metrics.avg_iterations);
    println!("  Converged:     {}/{}", metrics.converged_steps, metrics.timesteps);
    println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
    println!("  Max displace:  {:.4}m", metrics.max_displacement);

    if show_events {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for event in sink.events().iter() {
            *counts.entry(event_label(&event.kind)).or_insert(0) += 1;
        }
        println!();
        println!("Events:");
        for (label, count) in counts {
            println!("  {label:<16} {count}");
        }
    }

    if let Some(path) = output_path {
        let doc = SimulationOutput {
            metrics,
            positions: &outcome.positions,
            velocities: &outcome.velocities,
        };
        std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
        println!();
        println!("State written to: {path}");
    }

    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, output_path: Option<&str>) -> CliResult {
    println!("tress Benchmark Suite");
    println!("═════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![parse_scenario(scenario_name)?]
    };

    let mut all_metrics = Vec::new();

    for &kind in &scenarios {
        let scenario = Scenario::from_kind(kind);

        println!(
            "Running: {} ({} verts, {} springs, {} steps)",
            kind.name(),
            scenario.body.vertex_count(),
            scenario.body.spring_count(),
            scenario.timesteps,
        );

        let metrics =
            BenchmarkRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
        println!("  Converged:     {:.1}%", metrics.convergence_rate() * 100.0);
        println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
        println!("  Max displace:  {:.4}m", metrics.max_displacement);
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        let csv = BenchmarkMetrics::to_csv(&all_metrics);
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }

    Ok(())
}

/// Run a scenario and export one hair-grid channel as JSON.
pub fn grid(
    scenario_name: &str,
    channel: Channel,
    steps: Option<u32>,
    output_path: Option<&str>,
) -> CliResult {
    let kind = parse_scenario(scenario_name)?;
    let mut scenario = Scenario::from_kind(kind);
    if let Some(steps) = steps {
        scenario.timesteps = steps;
    }

    let channel = GridChannel::from(channel);
    let outcome = BenchmarkRunner::run_detailed(&scenario, Some(channel), None)
        .map_err(|e| format!("Simulation failed: {e}"))?;
    let data = outcome.grid.unwrap_or_default();

    let doc = GridOutput {
        scenario: kind.name(),
        channel,
        resolution: scenario.config.grid_resolution,
        data: &data,
    };
    let json = serde_json::to_string(&doc)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Grid ({} values) written to: {path}", data.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Validate a solver config.
pub fn validate(path: &str) -> CliResult {
    println!("tress Validator");
    println!("───────────────");
    println!();

    if !path.ends_with(".toml") {
        return Err(format!("Unsupported file format: '{path}'. Use .toml (solver config).").into());
    }

    println!("Validating config: {path}");
    let config = SolverConfig::load(Path::new(path))?;
    println!("✅ Config is valid ({:?} solver).", config.linear_solver);
    Ok(())
}
