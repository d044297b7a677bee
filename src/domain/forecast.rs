use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::velocity::VelocityMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub project_id: String,
    pub progress_percent: f64,
    pub adjusted_progress_percent: f64,
    pub adjusted_velocity: f64,
    pub iterations: usize,
    pub optimistic_days: f64,
    pub realistic_days: f64,
    pub pessimistic_days: f64,
    pub optimistic_date: NaiveDate,
    pub realistic_date: NaiveDate,
    pub pessimistic_date: NaiveDate,
    pub deadline: NaiveDate,
    pub confidence_percent: u8,
    /// Positive values are buffer before the deadline.
    pub days_diff_from_deadline: i64,
    pub risk_level: RiskLevel,
    pub on_track: bool,
    pub velocity: VelocityMetrics,
}
