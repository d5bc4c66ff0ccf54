use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::UserQuery;
use crate::error::AppError;
use crate::models::Prediction;
use crate::ovulation;
use crate::store::HistoryStore;

pub fn routes<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .route("/prediction", get(get_prediction::<S>))
        .with_state(store)
}

pub async fn get_prediction<S: HistoryStore>(
    State(store): State<S>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Prediction>, AppError> {
    let cycles = store.list_cycles(params.user_id).await?;
    let prediction = ovulation::estimate(&cycles, params.today())?;
    Ok(Json(prediction))
}
