pub mod forecast_engine;
pub mod histogram;
pub mod http_service;
pub mod monte_carlo;
pub mod percentiles;
pub mod project_yaml;
pub mod risk_classifier;
pub mod scenario_adjuster;
pub mod scenario_store;
pub mod velocity_tracker;
