//! Ovulation and next-period prediction from menstrual cycle history.
//!
//! Cycle length is measured start-to-start across consecutive completed cycles. The
//! average over the most recent [`LENGTH_WINDOW`] lengths projects the next period from
//! the last completed cycle's start. Ovulation is placed a fixed [`LUTEAL_PHASE_DAYS`]
//! before that. Temperature observations are not consulted.
//!
//! Nothing here reads the clock: "today" is always passed in.

use chrono::NaiveDate;

use crate::dates::{add_days, days_between, rounded_recent_mean};
use crate::error::ValidationError;
use crate::models::{CyclePrediction, CycleRecord, CycleSummary, FertilityStatus, Prediction};

pub const LUTEAL_PHASE_DAYS: i64 = 14;
pub const LENGTH_WINDOW: usize = 6;
pub const MIN_COMPLETED_CYCLES: usize = 2;

/// Days before ovulation that count as fertile.
pub const FERTILE_DAYS_BEFORE: i64 = 5;
/// Days after ovulation that count as fertile.
pub const FERTILE_DAYS_AFTER: i64 = 1;

/// Checks the per-record invariants: the end is not before the start and every
/// observation lies within `[start, end or today]`.
pub fn validate_cycle(cycle: &CycleRecord, today: NaiveDate) -> Result<(), ValidationError> {
    if let Some(end_date) = cycle.end_date {
        if end_date < cycle.start_date {
            return Err(ValidationError::EndBeforeStart {
                record_id: cycle.id,
                start_date: cycle.start_date,
                end_date,
            });
        }
    }

    let last_allowed = cycle.end_date.unwrap_or(today).max(cycle.start_date);
    if let Some(day) = cycle
        .days
        .iter()
        .find(|d| d.date < cycle.start_date || d.date > last_allowed)
    {
        return Err(ValidationError::ObservationOutOfRange {
            record_id: cycle.id,
            date: day.date,
        });
    }

    Ok(())
}

/// Checks every record, then that no cycle starts before the cycle preceding it has ended.
///
/// A start on the previous cycle's end date is allowed, since a cycle may be closed on the
/// day the next period begins. Two cycles never share a start date.
pub fn validate_history(cycles: &[CycleRecord], today: NaiveDate) -> Result<(), ValidationError> {
    for cycle in cycles {
        validate_cycle(cycle, today)?;
    }

    let mut ordered: Vec<&CycleRecord> = cycles.iter().collect();
    ordered.sort_by_key(|c| c.start_date);

    for pair in ordered.windows(2) {
        let (previous, next) = (pair[0], pair[1]);
        let ends_after_next_start = previous.end_date.is_some_and(|end| next.start_date < end);
        if ends_after_next_start || next.start_date == previous.start_date {
            return Err(ValidationError::OverlappingCycles {
                record_id: next.id,
                previous_id: previous.id,
            });
        }
    }

    Ok(())
}

/// Completed cycles in start order, after validating the whole history.
fn completed_in_order<'a>(
    cycles: &'a [CycleRecord],
    today: NaiveDate,
) -> Result<Vec<&'a CycleRecord>, ValidationError> {
    validate_history(cycles, today)?;

    let mut completed: Vec<&CycleRecord> = cycles.iter().filter(|c| c.is_completed()).collect();
    completed.sort_by_key(|c| c.start_date);
    Ok(completed)
}

/// Start-to-start lengths, oldest first, over completed cycles.
pub fn cycle_lengths(completed: &[&CycleRecord]) -> Vec<i64> {
    completed
        .windows(2)
        .map(|pair| days_between(pair[0].start_date, pair[1].start_date))
        .collect()
}

/// Band for `days_until_ovulation` (negative once ovulation has passed).
pub fn fertility_status(days_until_ovulation: i64) -> FertilityStatus {
    match days_until_ovulation.abs() {
        0..=1 => FertilityStatus::Peak,
        2..=3 => FertilityStatus::High,
        4..=5 => FertilityStatus::Medium,
        _ => FertilityStatus::Low,
    }
}

pub fn estimate(cycles: &[CycleRecord], today: NaiveDate) -> Result<Prediction, ValidationError> {
    let completed = completed_in_order(cycles, today)?;

    if completed.len() < MIN_COMPLETED_CYCLES {
        tracing::debug!(
            completed = completed.len(),
            "not enough completed cycles for a prediction"
        );
        return Ok(Prediction::Insufficient);
    }

    let lengths = cycle_lengths(&completed);
    let Some(average_cycle_length) = rounded_recent_mean(&lengths, LENGTH_WINDOW) else {
        return Ok(Prediction::Insufficient);
    };

    let Some(last) = completed.last() else {
        return Ok(Prediction::Insufficient);
    };
    let predicted_period_date = add_days(last.start_date, average_cycle_length);
    let predicted_ovulation_date = add_days(predicted_period_date, -LUTEAL_PHASE_DAYS);
    let status = fertility_status(days_between(today, predicted_ovulation_date));

    tracing::debug!(
        average_cycle_length,
        %predicted_period_date,
        %predicted_ovulation_date,
        ?status,
        "cycle prediction"
    );

    Ok(Prediction::Predicted(CyclePrediction {
        predicted_ovulation_date,
        predicted_period_date,
        average_cycle_length,
        fertile_window_start: add_days(predicted_ovulation_date, -FERTILE_DAYS_BEFORE),
        fertile_window_end: add_days(predicted_ovulation_date, FERTILE_DAYS_AFTER),
        fertility_status: status,
    }))
}

/// Dashboard card for the latest cycle. `None` when the user has no cycles at all.
pub fn summarize(
    cycles: &[CycleRecord],
    today: NaiveDate,
) -> Result<Option<CycleSummary>, ValidationError> {
    let prediction = estimate(cycles, today)?;
    let Some(latest) = cycles.iter().max_by_key(|c| c.start_date) else {
        return Ok(None);
    };

    let predicted = prediction.predicted();
    // an open cycle starting on or after the projected date means that period has arrived
    let period_arrived = |p: &CyclePrediction| {
        !latest.is_completed() && latest.start_date >= p.predicted_period_date
    };
    let in_fertile_window = predicted
        .map(|p| (p.fertile_window_start..=p.fertile_window_end).contains(&today))
        .unwrap_or(false);

    Ok(Some(CycleSummary {
        cycle_day: days_between(latest.start_date, today) + 1,
        start_date: latest.start_date,
        fertility_status: prediction.fertility_status(),
        in_fertile_window,
        period_expected_in_days: predicted
            .filter(|p| !period_arrived(*p))
            .map(|p| days_between(today, p.predicted_period_date)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayObservation, MucusCategory};
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn cycle(start: &str, end: Option<&str>) -> CycleRecord {
        CycleRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            start_date: date(start),
            end_date: end.map(date),
            days: Vec::new(),
        }
    }

    fn three_regular_cycles() -> Vec<CycleRecord> {
        vec![
            cycle("2024-01-01", Some("2024-01-05")),
            cycle("2024-01-29", Some("2024-02-02")),
            cycle("2024-02-26", Some("2024-03-02")),
        ]
    }

    #[test]
    fn test_reference_history() {
        let prediction = estimate(&three_regular_cycles(), date("2024-03-01")).unwrap();
        let p = prediction.predicted().expect("prediction");
        assert_eq!(p.average_cycle_length, 28);
        // 2024 is a leap year: 02-26 + 28 days lands on 03-25
        assert_eq!(p.predicted_period_date, date("2024-03-25"));
        assert_eq!(p.predicted_ovulation_date, date("2024-03-11"));
        assert_eq!(p.fertile_window_start, date("2024-03-06"));
        assert_eq!(p.fertile_window_end, date("2024-03-12"));
        assert_eq!(p.fertility_status, FertilityStatus::Low);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut cycles = three_regular_cycles();
        cycles.reverse();
        let prediction = estimate(&cycles, date("2024-03-01")).unwrap();
        assert_eq!(
            prediction.predicted().map(|p| p.predicted_period_date),
            Some(date("2024-03-25"))
        );
    }

    #[test]
    fn test_insufficient_history() {
        let today = date("2024-03-01");
        assert_eq!(estimate(&[], today).unwrap(), Prediction::Insufficient);

        let one = vec![cycle("2024-01-01", Some("2024-01-05"))];
        assert_eq!(estimate(&one, today).unwrap(), Prediction::Insufficient);

        // open cycles do not count toward the minimum
        let one_plus_open = vec![
            cycle("2024-01-01", Some("2024-01-05")),
            cycle("2024-01-29", None),
        ];
        let prediction = estimate(&one_plus_open, today).unwrap();
        assert_eq!(prediction.fertility_status(), FertilityStatus::Unknown);
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(fertility_status(0), FertilityStatus::Peak);
        assert_eq!(fertility_status(1), FertilityStatus::Peak);
        assert_eq!(fertility_status(-1), FertilityStatus::Peak);
        assert_eq!(fertility_status(2), FertilityStatus::High);
        assert_eq!(fertility_status(3), FertilityStatus::High);
        assert_eq!(fertility_status(-3), FertilityStatus::High);
        assert_eq!(fertility_status(4), FertilityStatus::Medium);
        assert_eq!(fertility_status(5), FertilityStatus::Medium);
        assert_eq!(fertility_status(-5), FertilityStatus::Medium);
        assert_eq!(fertility_status(6), FertilityStatus::Low);
        assert_eq!(fertility_status(-40), FertilityStatus::Low);
    }

    #[test]
    fn test_status_against_today() {
        let cycles = three_regular_cycles();
        // ovulation predicted 2024-03-11
        let status = |today: &str| estimate(&cycles, date(today)).unwrap().fertility_status();
        assert_eq!(status("2024-03-10"), FertilityStatus::Peak);
        assert_eq!(status("2024-03-09"), FertilityStatus::High);
        assert_eq!(status("2024-03-07"), FertilityStatus::Medium);
        assert_eq!(status("2024-03-05"), FertilityStatus::Low);
        assert_eq!(status("2024-03-13"), FertilityStatus::High);
    }

    #[test]
    fn test_only_recent_six_lengths_count() {
        // six 30-day cycles after two irregular ones
        let mut cycles = vec![
            cycle("2023-01-01", Some("2023-01-05")),
            cycle("2023-03-01", Some("2023-03-05")),
        ];
        let mut start = date("2023-04-15");
        for _ in 0..7 {
            cycles.push(CycleRecord {
                start_date: start,
                end_date: Some(add_days(start, 4)),
                ..cycle("2000-01-01", None)
            });
            start = add_days(start, 30);
        }

        let full = estimate(&cycles, date("2023-12-01")).unwrap();
        let trimmed = estimate(&cycles[2..], date("2023-12-01")).unwrap();
        assert_eq!(full.predicted().unwrap().average_cycle_length, 30);
        assert_eq!(full, trimmed);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let bad = cycle("2024-01-29", Some("2024-01-20"));
        let bad_id = bad.id;
        let cycles = vec![cycle("2024-01-01", Some("2024-01-05")), bad];
        let err = estimate(&cycles, date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { record_id, .. } if record_id == bad_id));
    }

    #[test]
    fn test_overlapping_cycles_are_rejected() {
        let cycles = vec![
            cycle("2024-01-01", Some("2024-01-10")),
            cycle("2024-01-08", Some("2024-01-12")),
        ];
        let err = estimate(&cycles, date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingCycles { .. }));
    }

    #[test]
    fn test_end_on_next_start_is_allowed() {
        let cycles = vec![
            cycle("2024-01-01", Some("2024-01-29")),
            cycle("2024-01-29", Some("2024-02-26")),
            cycle("2024-02-26", Some("2024-03-02")),
        ];
        let prediction = estimate(&cycles, date("2024-03-01")).unwrap();
        let p = prediction.predicted().expect("prediction");
        assert_eq!(p.average_cycle_length, 28);
        assert_eq!(p.predicted_period_date, date("2024-03-25"));
        assert_eq!(p.predicted_ovulation_date, date("2024-03-11"));
    }

    #[test]
    fn test_shared_start_date_is_rejected() {
        let cycles = vec![
            cycle("2024-01-01", Some("2024-01-01")),
            cycle("2024-01-01", Some("2024-01-05")),
        ];
        let err = estimate(&cycles, date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingCycles { .. }));
    }

    #[test]
    fn test_open_cycle_inside_closed_cycle_is_rejected() {
        let cycles = vec![
            cycle("2024-01-01", Some("2024-02-05")),
            cycle("2024-01-29", None),
        ];
        let err = validate_history(&cycles, date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingCycles { .. }));
    }

    #[test]
    fn test_observation_outside_cycle_is_rejected() {
        let mut open = cycle("2024-02-26", None);
        open.days.push(DayObservation {
            date: date("2024-03-05"),
            temperature_f: Some(97.8),
            mucus: Some(MucusCategory::Sticky),
            ovulation_test: None,
            flow: None,
        });
        let open_id = open.id;

        assert!(validate_cycle(&open, date("2024-03-05")).is_ok());
        let err = validate_cycle(&open, date("2024-03-04")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ObservationOutOfRange {
                record_id: open_id,
                date: date("2024-03-05"),
            }
        );
    }

    #[test]
    fn test_temperature_does_not_move_ovulation() {
        let mut cycles = three_regular_cycles();
        cycles[2].days.push(DayObservation {
            date: date("2024-03-01"),
            temperature_f: Some(98.9),
            mucus: Some(MucusCategory::EggWhite),
            ovulation_test: Some(crate::models::OvulationTest::Positive),
            flow: None,
        });
        let prediction = estimate(&cycles, date("2024-03-01")).unwrap();
        assert_eq!(
            prediction.predicted().unwrap().predicted_ovulation_date,
            date("2024-03-11")
        );
    }

    #[test]
    fn test_summary_for_open_cycle() {
        let mut cycles = three_regular_cycles();
        // starts on the projected period date
        cycles.push(cycle("2024-03-25", None));
        let summary = summarize(&cycles, date("2024-03-27")).unwrap().unwrap();
        assert_eq!(summary.cycle_day, 3);
        assert_eq!(summary.start_date, date("2024-03-25"));
        assert_eq!(summary.period_expected_in_days, None);
        assert!(!summary.in_fertile_window);
    }

    #[test]
    fn test_summary_counts_down_for_cycle_started_early() {
        let mut cycles = three_regular_cycles();
        cycles.push(cycle("2024-03-20", None));
        let summary = summarize(&cycles, date("2024-03-22")).unwrap().unwrap();
        assert_eq!(summary.cycle_day, 3);
        assert_eq!(summary.period_expected_in_days, Some(3));
    }

    #[test]
    fn test_summary_inside_fertile_window() {
        let summary = summarize(&three_regular_cycles(), date("2024-03-09"))
            .unwrap()
            .unwrap();
        assert!(summary.in_fertile_window);
        assert_eq!(summary.fertility_status, FertilityStatus::High);
        assert_eq!(summary.period_expected_in_days, Some(16));
    }

    #[test]
    fn test_summary_without_cycles() {
        assert!(summarize(&[], date("2024-03-10")).unwrap().is_none());
    }
}
