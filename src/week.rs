//! Semester week arithmetic.

use chrono::NaiveDate;

use crate::models::WeekNumber;

/// Computes the 1-based week of `reference` in a semester starting on
/// `semester_start`.
///
/// `floor(days / 7) + 1`, clamped to week 1 for dates before the start.
pub fn compute_week(semester_start: NaiveDate, reference: NaiveDate) -> WeekNumber {
    let days = (reference - semester_start).num_days();
    let week = days.div_euclid(7) + 1;
    if week < 1 {
        return WeekNumber::FIRST;
    }
    let week = u32::try_from(week).unwrap_or(u32::MAX);
    WeekNumber::new(week).unwrap_or(WeekNumber::FIRST)
}
