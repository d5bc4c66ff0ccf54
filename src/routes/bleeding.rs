use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::UserQuery;
use crate::bleeding;
use crate::error::AppError;
use crate::models::BleedingEpisode;
use crate::store::HistoryStore;

pub fn routes<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .route("/bleeding-history", get(get_bleeding_history::<S>))
        .with_state(store)
}

pub async fn get_bleeding_history<S: HistoryStore>(
    State(store): State<S>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<BleedingEpisode>>, AppError> {
    let cycles = store.list_cycles(params.user_id).await?;
    let episodes = bleeding::group_episodes(bleeding::flow_days(&cycles));
    Ok(Json(episodes))
}
