use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use completion_forecast::commands::base_commands::{CliArgs, Commands};
use completion_forecast::commands::forecast_cmd::forecast_command;
use completion_forecast::commands::scenario_cmd::scenario_command;
use completion_forecast::commands::serve_cmd::serve_command;
use completion_forecast::config::ForecastConfig;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let mut config = match ForecastConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(scenario_dir) = args.scenario_dir {
        config.scenario_dir = scenario_dir;
    }

    match args.command {
        cmd @ Commands::Forecast { .. } => forecast_command(cmd, &config).await,
        Commands::Scenario { action } => scenario_command(action, &config),
        cmd @ Commands::Serve { .. } => serve_command(cmd, &config).await,
        Commands::Completions { shell } => {
            let mut command = CliArgs::command();
            let name = command.get_name().to_string();
            generate(shell, &mut command, name, &mut io::stdout());
            ExitCode::SUCCESS
        }
    }
}
