use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health: database reachability, applied schema version and the size
/// of the catalog and plan.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health_summary().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "db": "connected",
                "schema_version": summary.schema_version,
                "recipes": summary.recipes,
                "planned_entries": summary.planned_entries,
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "db": e.to_string() })),
            )
        }
    }
}
