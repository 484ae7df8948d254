use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// Failures surfaced by the service layer.
///
/// Recoverable input problems (bad numbers, bad dates, unknown actions) never
/// reach this type: the services fall back to defaults or no-ops instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for (StatusCode, Json<Value>) {
    fn from(e: AppError) -> Self {
        let status = e.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Store error: {:#}", e);
        }
        (status, Json(json!({ "error": e.to_string() })))
    }
}
