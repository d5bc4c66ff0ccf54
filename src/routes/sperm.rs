use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::UserQuery;
use crate::error::AppError;
use crate::models::{NewSpermTest, ScoredSpermTest, SpermMeasurements};
use crate::sperm;
use crate::store::HistoryStore;

#[derive(Serialize)]
pub struct SpermScoreResponse {
    pub latest: Option<ScoredSpermTest>,
    pub history: Vec<ScoredSpermTest>,
}

pub fn routes<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .route("/sperm-test", post(create_sperm_test::<S>))
        .route("/sperm-test/:id", put(update_sperm_test::<S>))
        .route("/sperm-score", get(get_sperm_score::<S>))
        .with_state(store)
}

async fn create_sperm_test<S: HistoryStore>(
    State(store): State<S>,
    Json(body): Json<NewSpermTest>,
) -> Result<(StatusCode, Json<ScoredSpermTest>), AppError> {
    // reject before anything is written
    sperm::score(&body.measurements)?;

    let record = store.create_sperm_test(body).await?;
    let scored = sperm::score_record(record)?;
    tracing::info!("🧪 Sperm test {} scored {}", scored.test.id, scored.score);
    Ok((StatusCode::CREATED, Json(scored)))
}

async fn update_sperm_test<S: HistoryStore>(
    State(store): State<S>,
    Path(test_id): Path<Uuid>,
    Json(measurements): Json<SpermMeasurements>,
) -> Result<Json<ScoredSpermTest>, AppError> {
    sperm::score_for_record(test_id, &measurements)?;

    let record = store.update_sperm_test(test_id, measurements).await?;
    let scored = sperm::score_record(record)?;
    tracing::info!("🧪 Sperm test {} re-scored {}", scored.test.id, scored.score);
    Ok(Json(scored))
}

async fn get_sperm_score<S: HistoryStore>(
    State(store): State<S>,
    Query(params): Query<UserQuery>,
) -> Result<Json<SpermScoreResponse>, AppError> {
    let tests = store.list_sperm_tests(params.user_id).await?;
    let latest = sperm::latest_score(&tests)?;
    let history = tests
        .into_iter()
        .map(sperm::score_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(SpermScoreResponse { latest, history }))
}
