use std::process::ExitCode;

use crate::commands::base_commands::ScenarioAction;
use crate::config::ForecastConfig;
use crate::domain::scenario::Scenario;
use crate::services::scenario_store::{FileScenarioStore, ScenarioStore};

pub fn scenario_command(action: ScenarioAction, config: &ForecastConfig) -> ExitCode {
    let store = match FileScenarioStore::open(&config.scenario_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open scenario store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match action {
        ScenarioAction::Save {
            project,
            team_size_delta,
            scope_change,
        } => match Scenario::new(team_size_delta, scope_change) {
            Ok(scenario) => store
                .save(&project, &scenario)
                .map(|()| format!("Scenario for {project} saved: {}", describe(&scenario))),
            Err(e) => {
                eprintln!("Invalid scenario: {e}");
                return ExitCode::FAILURE;
            }
        },
        ScenarioAction::Show { project } => store.load(&project).map(|scenario| match scenario {
            Some(scenario) => format!("{project}: {}", describe(&scenario)),
            None => format!("No scenario saved for {project}"),
        }),
        ScenarioAction::Clear { project } => store
            .clear(&project)
            .map(|()| format!("Scenario for {project} cleared")),
        ScenarioAction::List => store.load_all().map(|scenarios| {
            if scenarios.is_empty() {
                return "No scenarios saved".to_string();
            }
            scenarios
                .iter()
                .map(|(project, scenario)| format!("{project}: {}", describe(scenario)))
                .collect::<Vec<_>>()
                .join("\n")
        }),
    };

    match outcome {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Scenario store error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn describe(scenario: &Scenario) -> String {
    format!(
        "team {:+}, scope {:+}%",
        scenario.team_size_delta(),
        scenario.scope_change_percent()
    )
}
