use crate::dates::days_between;
use crate::models::{BleedingDay, BleedingEpisode, CycleRecord};

/// Flow observations from every cycle, oldest first.
pub fn flow_days(cycles: &[CycleRecord]) -> Vec<BleedingDay> {
    let mut days: Vec<BleedingDay> = cycles
        .iter()
        .flat_map(|c| c.days.iter())
        .filter_map(|d| {
            d.flow.map(|intensity| BleedingDay {
                date: d.date,
                intensity,
            })
        })
        .collect();
    days.sort_by_key(|d| d.date);
    days.dedup_by_key(|d| d.date);
    days
}

/// Groups sorted flow days into runs of consecutive dates.
pub fn group_episodes(days: Vec<BleedingDay>) -> Vec<BleedingEpisode> {
    let mut grouped: Vec<BleedingEpisode> = vec![];
    let mut current: Vec<BleedingDay> = vec![];

    for day in days {
        let gap = current.last().map(|prev| days_between(prev.date, day.date));
        if gap.is_some_and(|g| g != 1) {
            grouped.extend(close_episode(std::mem::take(&mut current)));
        }
        current.push(day);
    }
    grouped.extend(close_episode(current));

    grouped
}

fn close_episode(days: Vec<BleedingDay>) -> Option<BleedingEpisode> {
    let start_date = days.first()?.date;
    let end_date = days.last()?.date;
    Some(BleedingEpisode {
        start_date,
        end_date,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayObservation, FlowIntensity};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn flow(d: &str, intensity: Option<FlowIntensity>) -> DayObservation {
        DayObservation {
            date: date(d),
            temperature_f: None,
            mucus: None,
            ovulation_test: None,
            flow: intensity,
        }
    }

    #[test]
    fn test_two_episodes() {
        let cycles = vec![
            CycleRecord {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                start_date: date("2024-01-01"),
                end_date: Some(date("2024-01-03")),
                days: vec![
                    flow("2024-01-01", Some(FlowIntensity::Heavy)),
                    flow("2024-01-02", Some(FlowIntensity::Medium)),
                    flow("2024-01-03", Some(FlowIntensity::Light)),
                ],
            },
            CycleRecord {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                start_date: date("2024-01-29"),
                end_date: None,
                days: vec![
                    flow("2024-01-30", Some(FlowIntensity::Medium)),
                    flow("2024-01-29", Some(FlowIntensity::Heavy)),
                    flow("2024-01-31", None),
                ],
            },
        ];

        let episodes = group_episodes(flow_days(&cycles));
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].start_date, date("2024-01-01"));
        assert_eq!(episodes[0].end_date, date("2024-01-03"));
        assert_eq!(episodes[0].days.len(), 3);
        assert_eq!(episodes[1].start_date, date("2024-01-29"));
        assert_eq!(episodes[1].end_date, date("2024-01-30"));
        assert_eq!(episodes[1].days[0].intensity, FlowIntensity::Heavy);
    }

    #[test]
    fn test_no_flow_days() {
        assert!(group_episodes(Vec::new()).is_empty());
    }
}
