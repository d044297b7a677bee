use clap::ValueEnum;
use thiserror::Error;

use crate::domain::forecast::ForecastResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

#[derive(Error, Debug)]
pub enum ReportFormatError {
    #[error("failed to serialize report as yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to serialize report as json: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn render_forecasts(
    results: &[ForecastResult],
    format: OutputFormat,
) -> Result<String, ReportFormatError> {
    match format {
        OutputFormat::Text => Ok(results
            .iter()
            .map(format_forecast_report)
            .collect::<Vec<_>>()
            .join("\n\n")),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(results)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
    }
}

pub fn format_forecast_report(result: &ForecastResult) -> String {
    let on_track = if result.on_track { "yes" } else { "no" };

    let mut lines = Vec::new();
    lines.push(format!("Forecast Report: {}", result.project_id));
    lines.push(format!("Progress: {:.1}%", result.progress_percent));
    if (result.adjusted_progress_percent - result.progress_percent).abs() > f64::EPSILON {
        lines.push(format!(
            "Adjusted progress: {:.1}%",
            result.adjusted_progress_percent
        ));
    }
    lines.push(format!(
        "Velocity: {:.2} %/day (current {:.2}, std dev {:.2}, trend {:+.1}%)",
        result.adjusted_velocity,
        result.velocity.current_velocity,
        result.velocity.velocity_std_dev,
        result.velocity.velocity_trend_percent
    ));
    lines.push(format!("Iterations: {}", result.iterations));
    lines.push(String::new());
    lines.push("Estimate | Days | Date".to_string());
    lines.push("---------|------|-----".to_string());
    lines.push(format_estimate_row(
        "P10",
        result.optimistic_days,
        &result.optimistic_date.format("%Y-%m-%d").to_string(),
    ));
    lines.push(format_estimate_row(
        "P50",
        result.realistic_days,
        &result.realistic_date.format("%Y-%m-%d").to_string(),
    ));
    lines.push(format_estimate_row(
        "P90",
        result.pessimistic_days,
        &result.pessimistic_date.format("%Y-%m-%d").to_string(),
    ));
    lines.push(String::new());
    lines.push(format!("Deadline: {}", result.deadline.format("%Y-%m-%d")));
    lines.push(format!(
        "Days from deadline: {:+}",
        result.days_diff_from_deadline
    ));
    lines.push(format!("Confidence: {}%", result.confidence_percent));
    lines.push(format!("Risk: {}", result.risk_level));
    lines.push(format!("On track: {on_track}"));

    lines.join("\n")
}

fn format_estimate_row(label: &str, days: f64, date: &str) -> String {
    format!("{label} | {days:.2} | {date}")
}
