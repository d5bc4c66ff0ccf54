use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::HistoryStore;
use crate::error::StoreError;
use crate::models::{
    CycleRecord, DayObservation, NewCycle, NewSpermTest, SpermMeasurements, SpermTestRecord,
};
use crate::ovulation::validate_cycle;

#[derive(Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CycleRow {
    id: Uuid,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
}

#[derive(sqlx::FromRow)]
struct DayRow {
    cycle_id: Uuid,
    day: NaiveDate,
    temperature_f: Option<f64>,
    mucus: Option<String>,
    ovulation_test: Option<String>,
    flow: Option<String>,
}

#[derive(sqlx::FromRow)]
struct SpermTestRow {
    id: Uuid,
    user_id: Uuid,
    tested_on: NaiveDate,
    count_m_per_ml: f64,
    motility_pct: f64,
    morphology_pct: f64,
    volume_ml: f64,
}

fn parse_column<T: FromStr>(column: &'static str, value: Option<String>) -> Result<Option<T>, StoreError> {
    value
        .map(|v| v.parse::<T>().map_err(|_| StoreError::Corrupt { column, value: v.clone() }))
        .transpose()
}

impl DayRow {
    fn into_observation(self) -> Result<DayObservation, StoreError> {
        Ok(DayObservation {
            date: self.day,
            temperature_f: self.temperature_f,
            mucus: parse_column("mucus", self.mucus)?,
            ovulation_test: parse_column("ovulation_test", self.ovulation_test)?,
            flow: parse_column("flow", self.flow)?,
        })
    }
}

impl CycleRow {
    fn into_record(self, days: Vec<DayObservation>) -> CycleRecord {
        CycleRecord {
            id: self.id,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            days,
        }
    }
}

impl From<SpermTestRow> for SpermTestRecord {
    fn from(row: SpermTestRow) -> Self {
        SpermTestRecord {
            id: row.id,
            user_id: row.user_id,
            date: row.tested_on,
            measurements: SpermMeasurements {
                count: row.count_m_per_ml,
                motility: row.motility_pct,
                morphology: row.morphology_pct,
                volume: row.volume_ml,
            },
        }
    }
}

const SPERM_TEST_COLUMNS: &str =
    "id, user_id, tested_on, count_m_per_ml, motility_pct, morphology_pct, volume_ml";

impl PgHistoryStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("🗄️ Database migrations applied");

        Ok(Self { pool })
    }

    async fn days_for_cycle(&self, cycle_id: Uuid) -> Result<Vec<DayObservation>, StoreError> {
        let rows = sqlx::query_as::<_, DayRow>(
            "SELECT cycle_id, day, temperature_f, mucus, ovulation_test, flow
             FROM cycle_days
             WHERE cycle_id = $1
             ORDER BY day ASC",
        )
        .bind(cycle_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DayRow::into_observation).collect()
    }
}

impl HistoryStore for PgHistoryStore {
    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, StoreError> {
        let cycles = sqlx::query_as::<_, CycleRow>(
            "SELECT id, user_id, start_date, end_date
             FROM cycles
             WHERE user_id = $1
             ORDER BY start_date ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let day_rows = sqlx::query_as::<_, DayRow>(
            "SELECT d.cycle_id, d.day, d.temperature_f, d.mucus, d.ovulation_test, d.flow
             FROM cycle_days d
             JOIN cycles c ON c.id = d.cycle_id
             WHERE c.user_id = $1
             ORDER BY d.day ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut days_by_cycle: HashMap<Uuid, Vec<DayObservation>> = HashMap::new();
        for row in day_rows {
            let cycle_id = row.cycle_id;
            days_by_cycle
                .entry(cycle_id)
                .or_default()
                .push(row.into_observation()?);
        }

        Ok(cycles
            .into_iter()
            .map(|row| {
                let days = days_by_cycle.remove(&row.id).unwrap_or_default();
                row.into_record(days)
            })
            .collect())
    }

    async fn find_cycle(&self, cycle_id: Uuid) -> Result<CycleRecord, StoreError> {
        let Some(row) = sqlx::query_as::<_, CycleRow>(
            "SELECT id, user_id, start_date, end_date FROM cycles WHERE id = $1",
        )
        .bind(cycle_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Err(StoreError::NotFound {
                entity: "cycle",
                id: cycle_id,
            });
        };

        let days = self.days_for_cycle(cycle_id).await?;
        Ok(row.into_record(days))
    }

    async fn create_cycle(&self, new: NewCycle) -> Result<CycleRecord, StoreError> {
        let row = sqlx::query_as::<_, CycleRow>(
            "INSERT INTO cycles (id, user_id, start_date)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, start_date, end_date",
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.start_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                tracing::error!("❌ DB insert failed: {}", db_err.message());
                if let Some(constraint) = db_err.constraint() {
                    tracing::info!("🔒 Constraint violated: {}", constraint);
                }
            }
            StoreError::from(e)
        })?;

        Ok(row.into_record(Vec::new()))
    }

    async fn close_cycle(
        &self,
        cycle_id: Uuid,
        end_date: NaiveDate,
    ) -> Result<CycleRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query_as::<_, CycleRow>(
            "UPDATE cycles SET end_date = $2
             WHERE id = $1
             RETURNING id, user_id, start_date, end_date",
        )
        .bind(cycle_id)
        .bind(end_date)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Err(StoreError::NotFound {
                entity: "cycle",
                id: cycle_id,
            });
        };

        let day_rows = sqlx::query_as::<_, DayRow>(
            "SELECT cycle_id, day, temperature_f, mucus, ovulation_test, flow
             FROM cycle_days
             WHERE cycle_id = $1
             ORDER BY day ASC",
        )
        .bind(cycle_id)
        .fetch_all(&mut *tx)
        .await?;
        let days = day_rows
            .into_iter()
            .map(DayRow::into_observation)
            .collect::<Result<Vec<_>, _>>()?;

        // dropping `tx` on the error path rolls the update back
        let closed = row.into_record(days);
        validate_cycle(&closed, end_date)?;

        tx.commit().await?;
        Ok(closed)
    }

    async fn log_day(
        &self,
        cycle_id: Uuid,
        day: DayObservation,
        today: NaiveDate,
    ) -> Result<CycleRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // the row lock holds off a concurrent close until this day is written
        let Some(row) = sqlx::query_as::<_, CycleRow>(
            "SELECT id, user_id, start_date, end_date FROM cycles WHERE id = $1 FOR UPDATE",
        )
        .bind(cycle_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Err(StoreError::NotFound {
                entity: "cycle",
                id: cycle_id,
            });
        };
        validate_cycle(&row.into_record(vec![day.clone()]), today)?;

        sqlx::query(
            "INSERT INTO cycle_days (cycle_id, day, temperature_f, mucus, ovulation_test, flow)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (cycle_id, day) DO UPDATE SET
                temperature_f = EXCLUDED.temperature_f,
                mucus = EXCLUDED.mucus,
                ovulation_test = EXCLUDED.ovulation_test,
                flow = EXCLUDED.flow",
        )
        .bind(cycle_id)
        .bind(day.date)
        .bind(day.temperature_f)
        .bind(day.mucus.map(|m| m.as_str()))
        .bind(day.ovulation_test.map(|t| t.as_str()))
        .bind(day.flow.map(|f| f.as_str()))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.find_cycle(cycle_id).await
    }

    async fn list_sperm_tests(&self, user_id: Uuid) -> Result<Vec<SpermTestRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SpermTestRow>(&format!(
            "SELECT {SPERM_TEST_COLUMNS} FROM sperm_tests WHERE user_id = $1 ORDER BY tested_on DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SpermTestRecord::from).collect())
    }

    async fn create_sperm_test(&self, new: NewSpermTest) -> Result<SpermTestRecord, StoreError> {
        let row = sqlx::query_as::<_, SpermTestRow>(&format!(
            "INSERT INTO sperm_tests (id, user_id, tested_on, count_m_per_ml, motility_pct, morphology_pct, volume_ml)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SPERM_TEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.date)
        .bind(new.measurements.count)
        .bind(new.measurements.motility)
        .bind(new.measurements.morphology)
        .bind(new.measurements.volume)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_sperm_test(
        &self,
        test_id: Uuid,
        measurements: SpermMeasurements,
    ) -> Result<SpermTestRecord, StoreError> {
        let row = sqlx::query_as::<_, SpermTestRow>(&format!(
            "UPDATE sperm_tests
             SET count_m_per_ml = $2, motility_pct = $3, morphology_pct = $4, volume_ml = $5
             WHERE id = $1
             RETURNING {SPERM_TEST_COLUMNS}"
        ))
        .bind(test_id)
        .bind(measurements.count)
        .bind(measurements.motility)
        .bind(measurements.morphology)
        .bind(measurements.volume)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SpermTestRecord::from).ok_or(StoreError::NotFound {
            entity: "sperm test",
            id: test_id,
        })
    }
}
