use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress rate observed at a point in time, in percent per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityPoint {
    pub timestamp: DateTime<Utc>,
    pub velocity: f64,
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityMetrics {
    pub current_velocity: f64,
    pub average_velocity: f64,
    pub velocity_std_dev: f64,
    pub velocity_trend_percent: f64,
    pub history: Vec<VelocityPoint>,
}

/// A recorded progress measurement, used instead of the synthetic history when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub taken_at: DateTime<Utc>,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum VelocitySource {
    /// Back-project history from the current progress and project age.
    #[default]
    Synthetic,
    Snapshots(Vec<ProgressSnapshot>),
}
