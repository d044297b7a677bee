use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::forecast::ForecastResult;
use crate::domain::project::Project;
use crate::domain::scenario::Scenario;
use crate::domain::velocity::VelocitySource;
use crate::services::monte_carlo::{
    DEFAULT_ITERATIONS, SimulationError, date_after_days, simulate,
};
use crate::services::risk_classifier::{classify, is_on_track};
use crate::services::scenario_adjuster::apply_scenario;
use crate::services::scenario_store::ScenarioStore;
use crate::services::velocity_tracker::compute_velocity_metrics_for_source;

pub const DEFAULT_MAX_ITERATIONS: usize = 1_000_000;

#[derive(Error, Debug, PartialEq)]
pub enum ForecastError {
    #[error("progress must be within [0, 100], got {0}")]
    ProgressOutOfRange(f64),
    #[error("iterations must be greater than zero")]
    InvalidIterations,
    #[error("iterations {requested} exceed the configured cap of {cap}")]
    TooManyIterations { requested: usize, cap: usize },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid status value: {0}")]
    InvalidStatus(String),
    #[error("snapshot progress must be within [0, 100], got {0}")]
    SnapshotProgressOutOfRange(f64),
    #[error("forecast date falls outside the supported calendar range")]
    DateOutOfRange,
    #[error("forecast worker failed: {0}")]
    Worker(String),
}

impl From<SimulationError> for ForecastError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::InvalidIterations => ForecastError::InvalidIterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub project: Project,
    pub progress_percent: f64,
    pub scenario: Option<Scenario>,
    pub velocity_source: VelocitySource,
    pub iterations: usize,
}

impl ForecastRequest {
    pub fn new(project: Project, progress_percent: f64) -> Self {
        Self {
            project,
            progress_percent,
            scenario: None,
            velocity_source: VelocitySource::Synthetic,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn with_scenario(mut self, scenario: Option<Scenario>) -> Self {
        self.scenario = scenario;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_velocity_source(mut self, source: VelocitySource) -> Self {
        self.velocity_source = source;
        self
    }
}

/// A forecast together with the simulated completion-day sample it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRun {
    pub result: ForecastResult,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastEngine {
    max_iterations: usize,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl ForecastEngine {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn forecast<R: Rng + ?Sized>(
        &self,
        request: &ForecastRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ForecastResult, ForecastError> {
        self.run(request, now, rng).map(|run| run.result)
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        request: &ForecastRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ForecastRun, ForecastError> {
        self.validate(request)?;

        let project = &request.project;
        let metrics = compute_velocity_metrics_for_source(
            project,
            &request.velocity_source,
            request.progress_percent,
            now,
        );
        let adjusted = apply_scenario(&metrics, request.progress_percent, request.scenario.as_ref());
        let outcome = simulate(
            adjusted.progress,
            adjusted.velocity,
            metrics.velocity_std_dev,
            request.iterations,
            rng,
        )?;

        let today = now.date_naive();
        let to_date = |days| date_after_days(today, days).ok_or(ForecastError::DateOutOfRange);
        let optimistic_date = to_date(outcome.optimistic_days)?;
        let realistic_date = to_date(outcome.realistic_days)?;
        let pessimistic_date = to_date(outcome.pessimistic_days)?;
        let days_diff = (project.deadline - realistic_date).num_days();
        let risk_level = classify(days_diff, outcome.confidence_score);

        debug!(
            project_id = %project.id,
            realistic_days = outcome.realistic_days,
            confidence = outcome.confidence_percent,
            risk = %risk_level,
            "forecast complete"
        );

        Ok(ForecastRun {
            result: ForecastResult {
                project_id: project.id.clone(),
                progress_percent: request.progress_percent,
                adjusted_progress_percent: adjusted.progress,
                adjusted_velocity: adjusted.velocity,
                iterations: request.iterations,
                optimistic_days: outcome.optimistic_days,
                realistic_days: outcome.realistic_days,
                pessimistic_days: outcome.pessimistic_days,
                optimistic_date,
                realistic_date,
                pessimistic_date,
                deadline: project.deadline,
                confidence_percent: outcome.confidence_percent,
                days_diff_from_deadline: days_diff,
                risk_level,
                on_track: is_on_track(days_diff),
                velocity: metrics,
            },
            samples: outcome.samples,
        })
    }

    /// Runs a forecast, filling in the project's saved scenario when the request has none.
    /// A failing store is logged and the forecast proceeds without a scenario.
    pub fn run_with_store<R: Rng + ?Sized>(
        &self,
        request: &ForecastRequest,
        store: &dyn ScenarioStore,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<ForecastRun, ForecastError> {
        if request.scenario.is_some() {
            return self.run(request, now, rng);
        }
        let scenario = match store.load(&request.project.id) {
            Ok(scenario) => scenario,
            Err(e) => {
                warn!(
                    project_id = %request.project.id,
                    error = %e,
                    retryable = e.is_retryable(),
                    "scenario store failed, forecasting without scenario"
                );
                None
            }
        };
        let request = request.clone().with_scenario(scenario);
        self.run(&request, now, rng)
    }

    /// Forecasts every request on the blocking thread pool. Each request gets its
    /// own generator, seeded with `seed + index` when a seed is given.
    /// Results keep the order of `requests`.
    pub async fn run_many(
        &self,
        requests: Vec<ForecastRequest>,
        now: DateTime<Utc>,
        seed: Option<u64>,
    ) -> Vec<Result<ForecastRun, ForecastError>> {
        let handles: Vec<_> = requests
            .into_iter()
            .enumerate()
            .map(|(idx, request)| {
                let engine = *self;
                tokio::task::spawn_blocking(move || {
                    let mut rng = rng_for(seed, idx);
                    engine.run(&request, now, &mut rng)
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(ForecastError::Worker(e.to_string())),
            });
        }
        results
    }

    fn validate(&self, request: &ForecastRequest) -> Result<(), ForecastError> {
        let progress = request.progress_percent;
        if !is_valid_progress(progress) {
            return Err(ForecastError::ProgressOutOfRange(progress));
        }
        if let VelocitySource::Snapshots(snapshots) = &request.velocity_source {
            let invalid = snapshots
                .iter()
                .map(|snapshot| snapshot.progress_percent)
                .find(|progress| !is_valid_progress(*progress));
            if let Some(progress) = invalid {
                return Err(ForecastError::SnapshotProgressOutOfRange(progress));
            }
        }
        if request.iterations == 0 {
            return Err(ForecastError::InvalidIterations);
        }
        if request.iterations > self.max_iterations {
            return Err(ForecastError::TooManyIterations {
                requested: request.iterations,
                cap: self.max_iterations,
            });
        }
        Ok(())
    }
}

fn is_valid_progress(progress: f64) -> bool {
    progress.is_finite() && (0.0..=100.0).contains(&progress)
}

/// Generator for one forecast call: deterministic when seeded, entropy otherwise.
pub fn rng_for(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}
