use std::f64::consts::PI;

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Open01};
use serde::Serialize;
use thiserror::Error;

use crate::services::percentiles::value_f64_sorted;
use crate::services::velocity_tracker::{mean, population_std_dev};

pub const DEFAULT_ITERATIONS: usize = 1000;
/// Lower bound for a sampled velocity in percent per day; keeps the horizon finite.
pub const MIN_SIMULATED_VELOCITY: f64 = 0.1;
pub const MIN_CONFIDENCE_PERCENT: f64 = 40.0;
pub const MAX_CONFIDENCE_PERCENT: f64 = 95.0;

const OPTIMISTIC_PERCENTILE: f64 = 10.0;
const REALISTIC_PERCENTILE: f64 = 50.0;
const PESSIMISTIC_PERCENTILE: f64 = 90.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SimulationError {
    #[error("iterations must be greater than zero")]
    InvalidIterations,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub optimistic_days: f64,
    pub realistic_days: f64,
    pub pessimistic_days: f64,
    /// Unrounded confidence in 40.0..=95.0; risk thresholds compare against this.
    pub confidence_score: f64,
    /// `confidence_score` rounded for reporting.
    pub confidence_percent: u8,
    pub mean_days: f64,
    pub std_dev_days: f64,
    /// Simulated completion day counts, ascending.
    pub samples: Vec<f64>,
}

/// Runs the completion-day simulation, sampling velocity from a normal
/// distribution centred on `adjusted_velocity`.
pub fn simulate<R: Rng + ?Sized>(
    adjusted_progress: f64,
    adjusted_velocity: f64,
    velocity_std_dev: f64,
    iterations: usize,
    rng: &mut R,
) -> Result<SimulationOutcome, SimulationError> {
    if iterations == 0 {
        return Err(SimulationError::InvalidIterations);
    }

    let remaining = (100.0 - adjusted_progress).max(0.0);
    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let z = standard_normal(rng);
        let simulated_velocity =
            (adjusted_velocity + z * velocity_std_dev).max(MIN_SIMULATED_VELOCITY);
        samples.push(remaining / simulated_velocity);
    }
    samples.sort_by(|a, b| a.total_cmp(b));

    let mean_days = mean(&samples);
    let std_dev_days = population_std_dev(&samples, mean_days);
    let confidence_score = confidence_score(mean_days, std_dev_days);

    Ok(SimulationOutcome {
        optimistic_days: value_f64_sorted(&samples, OPTIMISTIC_PERCENTILE),
        realistic_days: value_f64_sorted(&samples, REALISTIC_PERCENTILE),
        pessimistic_days: value_f64_sorted(&samples, PESSIMISTIC_PERCENTILE),
        confidence_score,
        confidence_percent: confidence_score.round() as u8,
        mean_days,
        std_dev_days,
        samples,
    })
}

/// Box-Muller transform over two uniform draws from the open interval (0, 1).
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = Open01.sample(rng);
    let u2: f64 = Open01.sample(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Maps the coefficient of variation of the simulated durations to a 40..=95 score.
fn confidence_score(mean_days: f64, std_dev_days: f64) -> f64 {
    if mean_days <= 0.0 {
        // Nothing left to do: every run finishes immediately.
        return MAX_CONFIDENCE_PERCENT;
    }
    let raw = 100.0 - (std_dev_days / mean_days) * 100.0;
    if raw.is_finite() {
        raw.clamp(MIN_CONFIDENCE_PERCENT, MAX_CONFIDENCE_PERCENT)
    } else {
        MIN_CONFIDENCE_PERCENT
    }
}

/// Calendar date reached after `days` (rounded up) from `start`, or `None`
/// past the end of the representable calendar.
pub fn date_after_days(start: NaiveDate, days: f64) -> Option<NaiveDate> {
    let whole_days = days.ceil().max(0.0) as u64;
    start.checked_add_days(Days::new(whole_days))
}
