use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::HistoryStore;
use crate::error::StoreError;
use crate::models::{
    CycleRecord, DayObservation, NewCycle, NewSpermTest, SpermMeasurements, SpermTestRecord,
};
use crate::ovulation::validate_cycle;

#[derive(Default)]
struct Tables {
    cycles: HashMap<Uuid, CycleRecord>,
    sperm_tests: HashMap<Uuid, SpermTestRecord>,
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cycle_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound { entity: "cycle", id }
}

impl HistoryStore for InMemoryHistoryStore {
    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut cycles: Vec<CycleRecord> = tables
            .cycles
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cycles.sort_by_key(|c| c.start_date);
        Ok(cycles)
    }

    async fn find_cycle(&self, cycle_id: Uuid) -> Result<CycleRecord, StoreError> {
        let tables = self.tables.read().await;
        tables
            .cycles
            .get(&cycle_id)
            .cloned()
            .ok_or_else(|| cycle_not_found(cycle_id))
    }

    async fn create_cycle(&self, new: NewCycle) -> Result<CycleRecord, StoreError> {
        let record = CycleRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            start_date: new.start_date,
            end_date: None,
            days: Vec::new(),
        };
        self.tables
            .write()
            .await
            .cycles
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn close_cycle(
        &self,
        cycle_id: Uuid,
        end_date: NaiveDate,
    ) -> Result<CycleRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let cycle = tables
            .cycles
            .get_mut(&cycle_id)
            .ok_or_else(|| cycle_not_found(cycle_id))?;
        let mut candidate = cycle.clone();
        candidate.end_date = Some(end_date);
        validate_cycle(&candidate, end_date)?;

        *cycle = candidate;
        Ok(cycle.clone())
    }

    async fn log_day(
        &self,
        cycle_id: Uuid,
        day: DayObservation,
        today: NaiveDate,
    ) -> Result<CycleRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let cycle = tables
            .cycles
            .get_mut(&cycle_id)
            .ok_or_else(|| cycle_not_found(cycle_id))?;

        let mut candidate = cycle.clone();
        candidate.days.retain(|d| d.date != day.date);
        candidate.days.push(day);
        candidate.days.sort_by_key(|d| d.date);
        validate_cycle(&candidate, today)?;

        *cycle = candidate;
        Ok(cycle.clone())
    }

    async fn list_sperm_tests(&self, user_id: Uuid) -> Result<Vec<SpermTestRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut tests: Vec<SpermTestRecord> = tables
            .sperm_tests
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tests.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(tests)
    }

    async fn create_sperm_test(&self, new: NewSpermTest) -> Result<SpermTestRecord, StoreError> {
        let record = SpermTestRecord {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            date: new.date,
            measurements: new.measurements,
        };
        self.tables
            .write()
            .await
            .sperm_tests
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_sperm_test(
        &self,
        test_id: Uuid,
        measurements: SpermMeasurements,
    ) -> Result<SpermTestRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let test = tables
            .sperm_tests
            .get_mut(&test_id)
            .ok_or(StoreError::NotFound {
                entity: "sperm test",
                id: test_id,
            })?;
        test.measurements = measurements;
        Ok(test.clone())
    }
}
