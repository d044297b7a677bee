use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::commands::report_format::OutputFormat;

#[derive(Parser)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Path to a forecast config YAML
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding saved what-if scenarios (overrides the config)
    #[arg(long, global = true)]
    pub scenario_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast completion dates for the projects in a YAML file
    Forecast {
        /// Projects YAML file
        #[arg(short, long)]
        input: String,
        /// Only forecast the project with this id
        #[arg(short, long)]
        project: Option<String>,
        /// Number of simulation iterations (defaults to the config value)
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
        /// Seed for reproducible simulations
        #[arg(long)]
        seed: Option<u64>,
        /// Reference date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long)]
        now: Option<String>,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
        /// Write a PNG histogram of simulated completion days
        #[arg(long)]
        histogram: Option<String>,
    },
    /// Manage saved what-if scenarios
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },
    /// Serve forecasts over HTTP (POST /forecast)
    Serve {
        /// Address to listen on (defaults to the config value)
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ScenarioAction {
    /// Save (or overwrite) the scenario for a project
    Save {
        /// Project id
        #[arg(short, long)]
        project: String,
        /// Team members added to the project
        #[arg(short, long, default_value_t = 0)]
        team_size_delta: u32,
        /// Scope change in percent, between -50 and 50
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        scope_change: i32,
    },
    /// Show the saved scenario for a project
    Show {
        /// Project id
        #[arg(short, long)]
        project: String,
    },
    /// Remove the saved scenario for a project
    Clear {
        /// Project id
        #[arg(short, long)]
        project: String,
    },
    /// List all saved scenarios
    List,
}
