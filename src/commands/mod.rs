pub mod base_commands;
pub mod forecast_cmd;
pub mod report_format;
pub mod scenario_cmd;
pub mod serve_cmd;
