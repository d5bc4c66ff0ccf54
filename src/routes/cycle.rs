use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use super::{server_today, UserQuery};
use crate::error::{AppError, StoreError};
use crate::models::{CloseCycleRequest, CycleRecord, CycleSummary, DayObservation, NewCycle};
use crate::ovulation;
use crate::store::HistoryStore;

pub fn routes<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .route("/cycle", get(get_cycle_summary::<S>).post(create_cycle::<S>))
        .route("/cycle/:id/end", put(close_cycle::<S>))
        .route("/cycle/:id/day", post(log_day::<S>))
        .with_state(store)
}

async fn create_cycle<S: HistoryStore>(
    State(store): State<S>,
    Json(body): Json<NewCycle>,
) -> Result<(StatusCode, Json<CycleRecord>), AppError> {
    let mut history = store.list_cycles(body.user_id).await?;
    history.push(CycleRecord {
        id: Uuid::nil(),
        user_id: body.user_id,
        start_date: body.start_date,
        end_date: None,
        days: Vec::new(),
    });
    ovulation::validate_history(&history, server_today())?;

    let cycle = store.create_cycle(body).await?;
    tracing::info!("🩸 Cycle {} started on {}", cycle.id, cycle.start_date);
    Ok((StatusCode::CREATED, Json(cycle)))
}

async fn close_cycle<S: HistoryStore>(
    State(store): State<S>,
    Path(cycle_id): Path<Uuid>,
    Json(body): Json<CloseCycleRequest>,
) -> Result<Json<CycleRecord>, AppError> {
    let cycle = store.find_cycle(cycle_id).await?;
    let mut history = store.list_cycles(cycle.user_id).await?;
    for record in history.iter_mut().filter(|c| c.id == cycle_id) {
        record.end_date = Some(body.end_date);
    }
    ovulation::validate_history(&history, server_today())?;

    let closed = store.close_cycle(cycle_id, body.end_date).await?;
    tracing::info!("✅ Cycle {} closed on {}", closed.id, body.end_date);
    Ok(Json(closed))
}

async fn log_day<S: HistoryStore>(
    State(store): State<S>,
    Path(cycle_id): Path<Uuid>,
    Json(day): Json<DayObservation>,
) -> Result<Json<CycleRecord>, AppError> {
    let updated = store.log_day(cycle_id, day, server_today()).await?;
    Ok(Json(updated))
}

async fn get_cycle_summary<S: HistoryStore>(
    State(store): State<S>,
    Query(params): Query<UserQuery>,
) -> Result<Json<CycleSummary>, AppError> {
    let cycles = store.list_cycles(params.user_id).await?;
    let Some(summary) = ovulation::summarize(&cycles, params.today())? else {
        return Err(StoreError::NotFound {
            entity: "cycle for user",
            id: params.user_id,
        }
        .into());
    };
    Ok(Json(summary))
}
