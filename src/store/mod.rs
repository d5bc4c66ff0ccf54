//! Cycle and sperm-test history, behind a capability the routes are generic over.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    CycleRecord, DayObservation, NewCycle, NewSpermTest, SpermMeasurements, SpermTestRecord,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryHistoryStore;
pub use postgres::PgHistoryStore;

pub trait HistoryStore: Clone + Send + Sync + 'static {
    /// All of a user's cycles with their day logs, oldest start first.
    fn list_cycles(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<CycleRecord>, StoreError>> + Send;

    fn find_cycle(
        &self,
        cycle_id: Uuid,
    ) -> impl Future<Output = Result<CycleRecord, StoreError>> + Send;

    fn create_cycle(
        &self,
        new: NewCycle,
    ) -> impl Future<Output = Result<CycleRecord, StoreError>> + Send;

    /// Sets the end date. Fails with [`StoreError::Rejected`] when a logged day would fall
    /// after it.
    fn close_cycle(
        &self,
        cycle_id: Uuid,
        end_date: NaiveDate,
    ) -> impl Future<Output = Result<CycleRecord, StoreError>> + Send;

    /// Inserts or replaces the observation for `day.date`. The range check against the
    /// cycle's current bounds (`today` for an open cycle) happens in the same write.
    fn log_day(
        &self,
        cycle_id: Uuid,
        day: DayObservation,
        today: NaiveDate,
    ) -> impl Future<Output = Result<CycleRecord, StoreError>> + Send;

    /// All of a user's sperm tests, most recent first.
    fn list_sperm_tests(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<SpermTestRecord>, StoreError>> + Send;

    fn create_sperm_test(
        &self,
        new: NewSpermTest,
    ) -> impl Future<Output = Result<SpermTestRecord, StoreError>> + Send;

    fn update_sperm_test(
        &self,
        test_id: Uuid,
        measurements: SpermMeasurements,
    ) -> impl Future<Output = Result<SpermTestRecord, StoreError>> + Send;
}
