use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use crate::commands::base_commands::Commands;
use crate::config::ForecastConfig;
use crate::services::forecast_engine::ForecastEngine;
use crate::services::http_service::{ServiceState, serve};
use crate::services::scenario_store::FileScenarioStore;

pub async fn serve_command(cmd: Commands, config: &ForecastConfig) -> ExitCode {
    let Commands::Serve { address } = cmd else {
        return ExitCode::FAILURE;
    };

    let address = address.unwrap_or_else(|| config.listen_address.clone());
    let address: SocketAddr = match address.parse() {
        Ok(address) => address,
        Err(e) => {
            eprintln!("Invalid listen address {address}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = match FileScenarioStore::open(&config.scenario_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open scenario store: {e}");
            return ExitCode::FAILURE;
        }
    };

    let state = Arc::new(ServiceState {
        engine: ForecastEngine::new(config.max_iterations),
        store: Arc::new(store),
        default_iterations: config.iterations,
        seed: config.seed,
    });
    println!("Serving forecasts on http://{address}/forecast");
    serve(state, address).await;
    ExitCode::SUCCESS
}
