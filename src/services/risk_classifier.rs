use crate::domain::forecast::RiskLevel;

const CRITICAL_SLIP_DAYS: i64 = -7;
const THIN_BUFFER_DAYS: i64 = 7;
const LOW_CONFIDENCE_PERCENT: f64 = 50.0;
const MODERATE_CONFIDENCE_PERCENT: f64 = 70.0;

/// Classifies schedule risk from the buffer between the deadline and the
/// realistic completion date (`days_diff`, negative when late) and the
/// unrounded forecast confidence. Rules are checked in order.
pub fn classify(days_diff: i64, confidence_percent: f64) -> RiskLevel {
    if days_diff < CRITICAL_SLIP_DAYS || confidence_percent < LOW_CONFIDENCE_PERCENT {
        RiskLevel::High
    } else if days_diff < 0 || confidence_percent < MODERATE_CONFIDENCE_PERCENT {
        RiskLevel::Medium
    } else if days_diff < THIN_BUFFER_DAYS {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn is_on_track(days_diff: i64) -> bool {
    days_diff >= 0
}
