//! Error kinds for the fertility core, the history stores and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Input that the estimator or scorer refuses to compute over.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("cycle {record_id}: end date {end_date} is before start date {start_date}")]
    EndBeforeStart {
        record_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    #[error("cycle {record_id}: observation on {date} falls outside the cycle")]
    ObservationOutOfRange { record_id: Uuid, date: NaiveDate },

    #[error("cycle {record_id} starts before cycle {previous_id} has ended")]
    OverlappingCycles { record_id: Uuid, previous_id: Uuid },

    #[error("sperm test {}: invalid {field} value {value}", record_label(.record_id))]
    InvalidMeasurement {
        record_id: Option<Uuid>,
        field: &'static str,
        value: f64,
    },
}

fn record_label(id: &Option<Uuid>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "(unsaved)".to_string())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("unreadable value '{value}' in column {column}")]
    Corrupt { column: &'static str, value: String },

    /// The write would leave the record invalid. Checked while the record is locked.
    #[error(transparent)]
    Rejected(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Everything a route handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Store(StoreError::Rejected(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Store(StoreError::Database(e)) => {
                tracing::error!("❌ DB error: {:?}", e);
                "DB error".to_string()
            }
            AppError::Store(StoreError::Migration(e)) => {
                tracing::error!("❌ Migration error: {:?}", e);
                "DB error".to_string()
            }
            AppError::Store(e @ StoreError::Corrupt { .. }) => {
                tracing::error!("❌ {}", e);
                "DB error".to_string()
            }
            other => {
                tracing::info!("ℹ️ Rejected request: {}", other);
                other.to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
