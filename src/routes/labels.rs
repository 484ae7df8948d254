use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::{
    models::label::CreateLabelRequest,
    routes::{to_json, ApiError},
    services::recipes::RecipeService,
    AppState,
};

/// GET /labels
pub async fn list_labels(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let labels = RecipeService::list_labels(&state.store).await?;
    to_json(labels)
}

/// POST /labels
pub async fn create_label(
    State(state): State<AppState>,
    Json(body): Json<CreateLabelRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let label = RecipeService::create_label(&state.store, &body.name, body.facet).await?;
    Ok((StatusCode::CREATED, to_json(label)?))
}
