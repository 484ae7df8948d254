use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::recipe::{RecipeDetailQuery, RecipeDraft, RecipeQuery},
    routes::{to_json, ApiError},
    services::recipes::RecipeService,
    AppState,
};

/// GET /recipes?q=&max_duration=&max_working_duration=&category_labels=&event_labels=&sort=
///
/// Parameters arrive as raw pairs so repeated label ids and malformed numbers
/// are handled leniently instead of rejecting the request.
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = RecipeQuery::from_pairs(&pairs);
    let index = RecipeService::index(&state.store, &query).await?;
    to_json(index)
}

/// GET /recipes/random: same filters as the index; `recipe` is null when
/// nothing matches.
pub async fn random_recipe(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let query = RecipeQuery::from_pairs(&pairs);
    let recipe = RecipeService::random(&state.store, &query).await?;
    to_json(json!({ "recipe": recipe }))
}

/// GET /recipes/{slug}?servings=
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<RecipeDetailQuery>,
) -> Result<Json<Value>, ApiError> {
    let detail = RecipeService::detail(&state.store, &slug, params.servings.as_deref()).await?;
    to_json(detail)
}

pub async fn create_recipe(
    State(state): State<AppState>,
    Json(body): Json<RecipeDraft>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let recipe = RecipeService::create(&state.store, &body).await?;
    Ok((StatusCode::CREATED, to_json(recipe)?))
}

pub async fn update_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(body): Json<RecipeDraft>,
) -> Result<Json<Value>, ApiError> {
    let recipe = RecipeService::update(&state.store, &slug, &body).await?;
    to_json(recipe)
}

pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    RecipeService::delete(&state.store, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{slug}/cook
pub async fn cook_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let recipe = RecipeService::by_slug(&state.store, &slug).await?;
    let count = RecipeService::cook(&state.store, recipe.id).await?;
    Ok(Json(json!({ "slug": recipe.slug, "cooked_count": count })))
}

/// POST /recipes/{slug}/undo-cook
pub async fn undo_cook_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let recipe = RecipeService::by_slug(&state.store, &slug).await?;
    let count = RecipeService::undo_cook(&state.store, recipe.id).await?;
    Ok(Json(json!({ "slug": recipe.slug, "cooked_count": count })))
}
