use crate::dates::{days_between, mean};
use crate::models::{CycleRecord, CycleStat, CycleStatsReport};

/// Per-cycle period and cycle lengths in start order, with averages over the values present.
///
/// Open cycles have no period length yet. The latest cycle has no cycle length.
pub fn cycle_stats(cycles: &[CycleRecord]) -> CycleStatsReport {
    let mut ordered: Vec<&CycleRecord> = cycles.iter().collect();
    ordered.sort_by_key(|c| c.start_date);

    let cycle_stats: Vec<CycleStat> = ordered
        .iter()
        .enumerate()
        .map(|(i, cycle)| CycleStat {
            cycle_number: i + 1,
            start_date: cycle.start_date,
            period_length: cycle.end_date.map(|end| days_between(cycle.start_date, end)),
            cycle_length: ordered
                .get(i + 1)
                .map(|next| days_between(cycle.start_date, next.start_date)),
        })
        .collect();

    let periods: Vec<i64> = cycle_stats.iter().filter_map(|s| s.period_length).collect();
    let lengths: Vec<i64> = cycle_stats.iter().filter_map(|s| s.cycle_length).collect();

    CycleStatsReport {
        average_period_length: mean(&periods).unwrap_or(0.0),
        average_cycle_length: mean(&lengths).unwrap_or(0.0),
        cycle_stats,
    }
}
