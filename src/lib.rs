// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::PgStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors = match &state.config.cors_allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin.parse()?))
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Recipes
        .route("/recipes", get(routes::recipes::list_recipes).post(routes::recipes::create_recipe))
        .route("/recipes/random", get(routes::recipes::random_recipe))
        .route(
            "/recipes/{slug}",
            get(routes::recipes::get_recipe)
                .put(routes::recipes::update_recipe)
                .delete(routes::recipes::delete_recipe),
        )
        .route("/recipes/{slug}/cook", post(routes::recipes::cook_recipe))
        .route("/recipes/{slug}/undo-cook", post(routes::recipes::undo_cook_recipe))
        // Labels
        .route("/labels", get(routes::labels::list_labels).post(routes::labels::create_label))
        // Weekly plan
        .route("/plan", get(routes::plan::get_plan).post(routes::plan::post_plan))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}
