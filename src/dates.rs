//! Small date and statistics helpers shared by the estimator and the stats report.

use chrono::{Duration, NaiveDate};

/// Whole days from `from` to `to`. Negative when `to` is earlier.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Mean of the last `window` values, rounded to the nearest whole day (halves away from zero).
pub fn rounded_recent_mean(values: &[i64], window: usize) -> Option<i64> {
    let recent = &values[values.len().saturating_sub(window)..];
    mean(recent).map(|m| m.round() as i64)
}
