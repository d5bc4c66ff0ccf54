use axum::{routing::get, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::store::HistoryStore;

pub mod bleeding;
pub mod cycle;
pub mod cycle_stats;
pub mod prediction;
pub mod sperm;

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
    /// Overrides the server's current date for the fertility calculations.
    pub today: Option<NaiveDate>,
}

impl UserQuery {
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(server_today)
    }
}

/// Date used on the write paths, where the client cannot override "today".
pub fn server_today() -> NaiveDate {
    chrono::Utc::now().naive_utc().date()
}

pub fn app<S: HistoryStore>(store: S) -> Router {
    Router::new()
        .merge(cycle::routes(store.clone()))
        .merge(prediction::routes(store.clone()))
        .merge(cycle_stats::routes(store.clone()))
        .merge(bleeding::routes(store.clone()))
        .merge(sperm::routes(store))
        .route("/health", get(|| async { "✅ Backend up" }))
}
