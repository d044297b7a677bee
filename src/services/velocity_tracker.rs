use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::project::Project;
use crate::domain::velocity::{ProgressSnapshot, VelocityMetrics, VelocityPoint, VelocitySource};

/// Longest lookback used when back-projecting history.
const HISTORY_HORIZON_DAYS: i64 = 30;
/// Lookback windows in days, oldest first.
const LOOKBACK_WINDOWS_DAYS: [i64; 3] = [30, 14, 7];
/// Number of most recent points the summary statistics are computed over.
const RECENT_WINDOW: usize = 3;

pub fn compute_velocity_metrics_for_source(
    project: &Project,
    source: &VelocitySource,
    progress_percent: f64,
    now: DateTime<Utc>,
) -> VelocityMetrics {
    match source {
        VelocitySource::Synthetic => compute_velocity_metrics(project, progress_percent, now),
        VelocitySource::Snapshots(snapshots) => {
            compute_velocity_metrics_from_snapshots(project, snapshots, progress_percent, now)
        }
    }
}

/// Derives velocity metrics by linearly back-projecting the current progress
/// over the project's age.
///
/// This is an approximation: the "historical" points are synthesised from a single
/// progress value, so very young or very old projects can show odd trends.
pub fn compute_velocity_metrics(
    project: &Project,
    progress_percent: f64,
    now: DateTime<Utc>,
) -> VelocityMetrics {
    let created_at = project.created_at_or_default(now);
    let days_elapsed = (now - created_at).num_days().max(1);
    let current_rate = progress_percent / days_elapsed as f64;

    let mut history = Vec::with_capacity(LOOKBACK_WINDOWS_DAYS.len() + 1);
    for window in LOOKBACK_WINDOWS_DAYS {
        let timestamp = now - Duration::days(window);
        if timestamp < created_at {
            continue;
        }
        let span = window.min(days_elapsed) as f64;
        let progress_then =
            (progress_percent - (HISTORY_HORIZON_DAYS as f64 - span) * current_rate).max(0.0);
        history.push(VelocityPoint {
            timestamp,
            velocity: progress_then / span,
            progress: progress_then,
        });
    }
    history.push(VelocityPoint {
        timestamp: now,
        velocity: current_rate,
        progress: progress_percent,
    });

    let metrics = metrics_from_history(history);
    debug!(
        project_id = %project.id,
        days_elapsed,
        average_velocity = metrics.average_velocity,
        std_dev = metrics.velocity_std_dev,
        "computed synthetic velocity metrics"
    );
    metrics
}

/// Derives velocity metrics from recorded progress snapshots.
///
/// Each snapshot after the first contributes the rate since its predecessor, and a
/// final point covers the span from the last snapshot to `now`. Snapshots later
/// than `now` are ignored. Without any usable snapshot this falls back to
/// [`compute_velocity_metrics`].
pub fn compute_velocity_metrics_from_snapshots(
    project: &Project,
    snapshots: &[ProgressSnapshot],
    progress_percent: f64,
    now: DateTime<Utc>,
) -> VelocityMetrics {
    let mut ordered: Vec<&ProgressSnapshot> = snapshots
        .iter()
        .filter(|snapshot| snapshot.taken_at <= now)
        .collect();
    if ordered.is_empty() {
        return compute_velocity_metrics(project, progress_percent, now);
    }
    ordered.sort_by_key(|snapshot| snapshot.taken_at);

    let mut history = Vec::with_capacity(ordered.len());
    for pair in ordered.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        history.push(VelocityPoint {
            timestamp: current.taken_at,
            velocity: rate_between(
                previous.progress_percent,
                current.progress_percent,
                previous.taken_at,
                current.taken_at,
            ),
            progress: current.progress_percent,
        });
    }
    if let Some(last) = ordered.last() {
        history.push(VelocityPoint {
            timestamp: now,
            velocity: rate_between(last.progress_percent, progress_percent, last.taken_at, now),
            progress: progress_percent,
        });
    }

    let metrics = metrics_from_history(history);
    debug!(
        project_id = %project.id,
        snapshots = ordered.len(),
        average_velocity = metrics.average_velocity,
        std_dev = metrics.velocity_std_dev,
        "computed velocity metrics from snapshots"
    );
    metrics
}

fn rate_between(from: f64, to: f64, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let days = (end - start).num_days().max(1) as f64;
    ((to - from) / days).max(0.0)
}

fn metrics_from_history(history: Vec<VelocityPoint>) -> VelocityMetrics {
    let recent: Vec<f64> = history
        .iter()
        .skip(history.len().saturating_sub(RECENT_WINDOW))
        .map(|point| point.velocity)
        .collect();

    let average_velocity = mean(&recent);
    let velocity_std_dev = population_std_dev(&recent, average_velocity);
    let velocity_trend_percent = trend_percent(&recent);
    let current_velocity = history.last().map(|point| point.velocity).unwrap_or(0.0);

    VelocityMetrics {
        current_velocity,
        average_velocity,
        velocity_std_dev,
        velocity_trend_percent,
        history,
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

fn trend_percent(values: &[f64]) -> f64 {
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if values.len() < 2 || *first == 0.0 {
        return 0.0;
    }
    let trend = (last - first) / first * 100.0;
    if trend.is_finite() { trend } else { 0.0 }
}
