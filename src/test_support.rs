use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::project::{Project, ProjectStatus};

pub fn on_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Fixed reference instant so date arithmetic in tests is stable.
pub fn fixed_now() -> DateTime<Utc> {
    at_midnight(on_date(2026, 3, 2))
}

/// An active project created at `created_at` whose deadline is
/// `deadline_in_days` after [`fixed_now`].
pub fn build_project(id: &str, created_at: DateTime<Utc>, deadline_in_days: i64) -> Project {
    Project {
        id: id.to_string(),
        name: format!("Project {id}"),
        deadline: fixed_now().date_naive() + Duration::days(deadline_in_days),
        status: ProjectStatus::Active,
        created_at: Some(created_at),
    }
}
