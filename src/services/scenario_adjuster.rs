use crate::domain::scenario::Scenario;
use crate::domain::velocity::VelocityMetrics;

/// Throughput gained per added team member, as a fraction of the current velocity.
/// A flat multiplier; it ignores onboarding cost and coordination overhead.
pub const THROUGHPUT_GAIN_PER_MEMBER: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedInputs {
    pub velocity: f64,
    pub progress: f64,
}

pub fn apply_scenario(
    metrics: &VelocityMetrics,
    progress_percent: f64,
    scenario: Option<&Scenario>,
) -> AdjustedInputs {
    let Some(scenario) = scenario else {
        return AdjustedInputs {
            velocity: metrics.average_velocity,
            progress: progress_percent,
        };
    };

    let multiplier = 1.0 + scenario.team_size_delta() as f64 * THROUGHPUT_GAIN_PER_MEMBER;
    AdjustedInputs {
        velocity: metrics.average_velocity * multiplier,
        progress: (progress_percent - scenario.scope_change_percent() as f64).clamp(0.0, 100.0),
    }
}
