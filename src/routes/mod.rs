pub mod health;
pub mod labels;
pub mod metrics;
pub mod plan;
pub mod recipes;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

pub(crate) type ApiError = (StatusCode, Json<Value>);

pub(crate) fn to_json<T: Serialize>(value: T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| AppError::Store(e.into()).into())
}
