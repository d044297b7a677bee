use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SCOPE_CHANGE_PERCENT: i32 = -50;
pub const MAX_SCOPE_CHANGE_PERCENT: i32 = 50;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scope change must be within [-50, 50] percent, got {0}")]
    ScopeChangeOutOfRange(i32),
}

/// A what-if adjustment applied on top of a project's measured velocity and progress.
///
/// Values are validated on construction, including when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ScenarioRecord")]
pub struct Scenario {
    team_size_delta: u32,
    scope_change_percent: i32,
}

#[derive(Deserialize)]
struct ScenarioRecord {
    #[serde(default, alias = "teamSizeDelta")]
    team_size_delta: u32,
    #[serde(default, alias = "scopeChangePercent")]
    scope_change_percent: i32,
}

impl TryFrom<ScenarioRecord> for Scenario {
    type Error = ScenarioError;

    fn try_from(record: ScenarioRecord) -> Result<Self, Self::Error> {
        Scenario::new(record.team_size_delta, record.scope_change_percent)
    }
}

impl Scenario {
    pub fn new(team_size_delta: u32, scope_change_percent: i32) -> Result<Self, ScenarioError> {
        if !(MIN_SCOPE_CHANGE_PERCENT..=MAX_SCOPE_CHANGE_PERCENT).contains(&scope_change_percent) {
            return Err(ScenarioError::ScopeChangeOutOfRange(scope_change_percent));
        }
        Ok(Self {
            team_size_delta,
            scope_change_percent,
        })
    }

    pub fn team_size_delta(&self) -> u32 {
        self.team_size_delta
    }

    pub fn scope_change_percent(&self) -> i32 {
        self.scope_change_percent
    }
}
