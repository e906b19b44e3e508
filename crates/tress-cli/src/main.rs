//! Command-line front end for simulation, benchmarking, grid export and config validation.

use clap::{Parser, Subcommand};

mod commands;

use commands::Channel;

#[derive(Parser)]
#[command(name = "tress")]
#[command(version, about = "tress: implicit mass-spring integrator for cloth and hair")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario, optionally with a config file.
    Simulate {
        /// Path to solver config (TOML). Scenario defaults if omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Scenario to run (hanging_sheet, hair_strand, spring_pair).
        #[arg(short, long, default_value = "hanging_sheet")]
        scenario: String,

        /// Override the scenario's step count.
        #[arg(long)]
        steps: Option<u32>,

        /// Write the final state and metrics as JSON to this path.
        #[arg(short, long)]
        output: Option<String>,

        /// Print a summary of solver events.
        #[arg(long)]
        events: bool,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run (hanging_sheet, hair_strand, spring_pair, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a scenario and export one channel of the hair grid.
    Grid {
        #[arg(short, long, default_value = "hair_strand")]
        scenario: String,

        #[arg(long, value_enum, default_value_t = Channel::Density)]
        channel: Channel,

        /// Override the scenario's step count.
        #[arg(long)]
        steps: Option<u32>,

        /// Output JSON file path (stdout if omitted).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a solver config.
    Validate {
        /// Path to config file (TOML).
        path: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            config,
            scenario,
            steps,
            output,
            events,
        } => commands::simulate(config.as_deref(), &scenario, steps, output.as_deref(), events),
        Commands::Benchmark { scenario, output } => commands::benchmark(&scenario, output.as_deref()),
        Commands::Grid {
            scenario,
            channel,
            steps,
            output,
        } => commands::grid(&scenario, channel, steps, output.as_deref()),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
