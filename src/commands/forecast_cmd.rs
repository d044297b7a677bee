use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use tracing::warn;

use crate::commands::base_commands::Commands;
use crate::commands::report_format::render_forecasts;
use crate::config::ForecastConfig;
use crate::domain::scenario::Scenario;
use crate::services::forecast_engine::{ForecastEngine, ForecastRun};
use crate::services::histogram::write_histogram_png;
use crate::services::project_yaml::{load_projects_from_yaml_file, parse_timestamp};
use crate::services::scenario_store::{FileScenarioStore, ScenarioStore};

pub async fn forecast_command(cmd: Commands, config: &ForecastConfig) -> ExitCode {
    let Commands::Forecast {
        input,
        project,
        iterations,
        seed,
        now,
        format,
        output,
        histogram,
    } = cmd
    else {
        return ExitCode::FAILURE;
    };

    let mut projects = match load_projects_from_yaml_file(&input) {
        Ok(projects) => projects,
        Err(e) => {
            eprintln!("Failed to load projects: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(project_id) = &project {
        projects.retain(|candidate| &candidate.project.id == project_id);
        if projects.is_empty() {
            eprintln!("Project {project_id} not found in {input}");
            return ExitCode::FAILURE;
        }
    }

    let now = match now.as_deref() {
        Some(value) => match parse_timestamp(value) {
            Some(now) => now,
            None => {
                eprintln!("Invalid reference date: {value}");
                return ExitCode::FAILURE;
            }
        },
        None => Utc::now(),
    };

    let scenarios = load_saved_scenarios(&config.scenario_dir);
    let iterations = iterations.unwrap_or(config.iterations);
    let requests = projects
        .iter()
        .map(|project_input| {
            project_input
                .to_request(iterations)
                .with_scenario(scenarios.get(&project_input.project.id).copied())
        })
        .collect();

    let engine = ForecastEngine::new(config.max_iterations);
    let runs = engine.run_many(requests, now, seed.or(config.seed)).await;

    let mut failed = false;
    let mut completed: Vec<ForecastRun> = Vec::with_capacity(runs.len());
    for (project_input, run) in projects.iter().zip(runs) {
        match run {
            Ok(run) => completed.push(run),
            Err(e) => {
                failed = true;
                eprintln!("Failed to forecast {}: {e}", project_input.project.id);
            }
        }
    }

    if let Some(histogram) = &histogram {
        let multiple = completed.len() > 1;
        for run in &completed {
            let path = histogram_path(histogram, &run.result.project_id, multiple);
            match write_histogram_png(&path, &run.samples) {
                Ok(()) => println!("Forecast histogram written to {path}"),
                Err(e) => {
                    failed = true;
                    eprintln!("Failed to write forecast histogram {path}: {e}");
                }
            }
        }
    }

    let results: Vec<_> = completed.into_iter().map(|run| run.result).collect();
    let report = match render_forecasts(&results, format) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Failed to render forecast report: {e}");
            return ExitCode::FAILURE;
        }
    };

    match output {
        Some(output) => {
            if let Err(e) = tokio::fs::write(&output, report).await {
                eprintln!("Failed to write forecast report: {e}");
                return ExitCode::FAILURE;
            }
            println!("Forecast for {} projects written to {output}", results.len());
        }
        None => println!("{report}"),
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Saved scenarios keyed by project id. An unavailable store means no scenarios.
fn load_saved_scenarios(dir: &Path) -> BTreeMap<String, Scenario> {
    if !dir.is_dir() {
        return BTreeMap::new();
    }
    match FileScenarioStore::open(dir).and_then(|store| store.load_all()) {
        Ok(scenarios) => scenarios,
        Err(e) => {
            warn!(error = %e, "scenario store unavailable, forecasting without scenarios");
            BTreeMap::new()
        }
    }
}

fn histogram_path(base: &str, project_id: &str, multiple: bool) -> String {
    if !multiple {
        return base.to_string();
    }
    match base.strip_suffix(".png") {
        Some(stem) => format!("{stem}-{project_id}.png"),
        None => format!("{base}-{project_id}.png"),
    }
}
