use axum::{
    extract::{Query, State},
    Form, Json,
};
use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::{
    models::plan::{PlanActionForm, PlanWindowQuery},
    routes::{to_json, ApiError},
    services::{
        plan::{window_weeks, PlanService},
        week::parse_date,
    },
    AppState,
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /plan?start_date=YYYY-MM-DD&weeks=N
pub async fn get_plan(
    State(state): State<AppState>,
    Query(params): Query<PlanWindowQuery>,
) -> Result<Json<Value>, ApiError> {
    let start = parse_date(params.start_date.as_deref()).unwrap_or_else(today);
    let weeks = window_weeks(
        params.weeks.as_deref(),
        state.config.plan_default_weeks,
        state.config.plan_max_weeks,
    );
    let window = PlanService::reconciled_window(&state.store, start, weeks).await?;
    to_json(window)
}

/// POST /plan: form body with `action` plus its companion fields.
/// Unknown actions or missing fields leave the plan untouched and just
/// return the view.
pub async fn post_plan(
    State(state): State<AppState>,
    Form(form): Form<PlanActionForm>,
) -> Result<Json<Value>, ApiError> {
    let today = today();
    if let Some(action) = PlanService::parse_action(&form, today) {
        let outcome = PlanService::apply(&state.store, action).await?;
        tracing::debug!("Plan action outcome: {:?}", outcome);
    }

    let start = parse_date(form.start_date.as_deref()).unwrap_or(today);
    let weeks = window_weeks(
        form.weeks.as_deref(),
        state.config.plan_default_weeks,
        state.config.plan_max_weeks,
    );
    let window = PlanService::reconciled_window(&state.store, start, weeks).await?;
    to_json(window)
}
