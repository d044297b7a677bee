use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How far back a project without a creation timestamp is assumed to have started.
pub const DEFAULT_PROJECT_AGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Paused,
    InProgress,
}

impl ProjectStatus {
    /// Progress assumed for a project when no task completion data is available.
    pub fn fallback_progress(&self) -> f64 {
        match self {
            ProjectStatus::Completed => 100.0,
            ProjectStatus::Active => 65.0,
            ProjectStatus::InProgress => 40.0,
            ProjectStatus::Paused => 20.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Paused => "paused",
            ProjectStatus::InProgress => "in_progress",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "paused" => Ok(ProjectStatus::Paused),
            "in_progress" | "inprogress" | "in-progress" | "in progress" => {
                Ok(ProjectStatus::InProgress)
            }
            _ => Err(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub deadline: NaiveDate,
    pub status: ProjectStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn created_at_or_default(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at
            .unwrap_or_else(|| now - Duration::days(DEFAULT_PROJECT_AGE_DAYS))
    }
}

/// Finished vs. total task counts reported by the task tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub done: u32,
    pub total: u32,
}

impl TaskCompletion {
    pub fn percent(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let done = self.done.min(self.total);
        Some(done as f64 * 100.0 / self.total as f64)
    }
}

/// Picks the progress value fed into the forecast: an explicit percentage wins,
/// then task completion, then the status heuristic.
pub fn resolve_progress(
    explicit: Option<f64>,
    completion: Option<TaskCompletion>,
    status: ProjectStatus,
) -> f64 {
    explicit
        .or_else(|| completion.and_then(|c| c.percent()))
        .unwrap_or_else(|| status.fallback_progress())
}
