use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};

use super::UserQuery;
use crate::error::AppError;
use crate::models::CycleStatsReport;
use crate::stats;
use crate::store::HistoryStore;

pub async fn get_cycle_stats<S: HistoryStore>(
    State(store): State<S>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CycleStatsReport>, AppError> {
    let cycles = store.list_cycles(query.user_id).await?;
    Ok(Json(stats::cycle_stats(&cycles)))
}

pub fn routes<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .route("/cycle-stats", get(get_cycle_stats::<S>))
        .with_state(store)
}
