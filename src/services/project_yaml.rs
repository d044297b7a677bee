use std::collections::HashSet;
use std::io;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::project::{Project, ProjectStatus, TaskCompletion, resolve_progress};
use crate::domain::velocity::{ProgressSnapshot, VelocitySource};
use crate::services::forecast_engine::ForecastRequest;

#[derive(Error, Debug)]
pub enum ProjectYamlError {
    #[error("failed to read project yaml: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse project yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing project id")]
    MissingProjectId,
    #[error("duplicate project id: {0}")]
    DuplicateProjectId(String),
    #[error("invalid date format: {0} (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),
    #[error("invalid status value: {0}")]
    InvalidStatus(String),
}

#[derive(Serialize, Deserialize)]
struct ProjectRecord {
    id: String,
    name: Option<String>,
    deadline: String,
    status: Option<String>,
    created_at: Option<String>,
    progress: Option<f64>,
    tasks: Option<TaskCompletion>,
    snapshots: Option<Vec<SnapshotRecord>>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    taken_at: String,
    progress: f64,
}

/// A project as read from the input file, with its resolved progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInput {
    pub project: Project,
    pub progress_percent: f64,
    pub velocity_source: VelocitySource,
}

impl ProjectInput {
    pub fn to_request(&self, iterations: usize) -> ForecastRequest {
        ForecastRequest::new(self.project.clone(), self.progress_percent)
            .with_velocity_source(self.velocity_source.clone())
            .with_iterations(iterations)
    }
}

pub fn load_projects_from_yaml_file(path: &str) -> Result<Vec<ProjectInput>, ProjectYamlError> {
    let contents = std::fs::read_to_string(path)?;
    deserialize_projects_from_yaml_str(&contents)
}

pub fn deserialize_projects_from_yaml_str(
    input: &str,
) -> Result<Vec<ProjectInput>, ProjectYamlError> {
    let records: Vec<ProjectRecord> = serde_yaml::from_str(input)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut projects = Vec::with_capacity(records.len());

    for record in records {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(ProjectYamlError::MissingProjectId);
        }
        if !seen.insert(id.clone()) {
            return Err(ProjectYamlError::DuplicateProjectId(id));
        }

        let status = match record.status.as_deref() {
            Some(value) => value
                .parse::<ProjectStatus>()
                .map_err(ProjectYamlError::InvalidStatus)?,
            None => ProjectStatus::Active,
        };
        let deadline = parse_date(&record.deadline)
            .ok_or_else(|| ProjectYamlError::InvalidDate(record.deadline.clone()))?;
        let created_at = record
            .created_at
            .as_deref()
            .map(|value| {
                parse_timestamp(value).ok_or_else(|| ProjectYamlError::InvalidDate(value.into()))
            })
            .transpose()?;
        let velocity_source = match record.snapshots {
            Some(snapshots) if !snapshots.is_empty() => {
                VelocitySource::Snapshots(snapshots_from_records(snapshots)?)
            }
            _ => VelocitySource::Synthetic,
        };

        let progress_percent = resolve_progress(record.progress, record.tasks, status);
        projects.push(ProjectInput {
            project: Project {
                name: record.name.unwrap_or_else(|| id.clone()),
                id,
                deadline,
                status,
                created_at,
            },
            progress_percent,
            velocity_source,
        });
    }

    Ok(projects)
}

fn snapshots_from_records(
    records: Vec<SnapshotRecord>,
) -> Result<Vec<ProgressSnapshot>, ProjectYamlError> {
    records
        .into_iter()
        .map(|record| {
            let taken_at = parse_timestamp(&record.taken_at)
                .ok_or_else(|| ProjectYamlError::InvalidDate(record.taken_at.clone()))?;
            Ok(ProgressSnapshot {
                taken_at,
                progress_percent: record.progress,
            })
        })
        .collect()
}

/// Parses a `YYYY-MM-DD` calendar date, also accepting an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|timestamp| timestamp.date_naive()))
}

/// Parses an RFC 3339 timestamp; a bare `YYYY-MM-DD` date means midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
