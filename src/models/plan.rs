use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One Monday-anchored week bucket. At most one row exists per `week_start`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct WeeklyPlan {
    pub id: i64,
    pub week_start: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A recipe scheduled on a concrete date.
/// `plan_id` is `None` only when the row was edited outside the service;
/// reconcile repairs it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct WeeklyPlanEntry {
    pub id: i64,
    pub plan_id: Option<i64>,
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

/// Where an entry currently sits: its date and the week of the plan it points to.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct EntryPlacement {
    pub id: i64,
    pub date: NaiveDate,
    pub week_start: Option<NaiveDate>,
}

/// An entry joined with the recipe fields the window view shows.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct PlannedMeal {
    pub id: i64,
    pub plan_id: Option<i64>,
    pub recipe_id: i64,
    pub recipe_title: String,
    pub recipe_slug: String,
    pub date: NaiveDate,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanDay {
    pub date: NaiveDate,
    pub entries: Vec<PlannedMeal>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanWeek {
    pub week_start: NaiveDate,
    pub days: Vec<PlanDay>,
}

/// Response body for GET/POST /plan.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanWindow {
    pub start_date: NaiveDate,
    pub weeks: Vec<PlanWeek>,
}

/// A fully-resolved plan mutation. Anything that cannot be turned into one of
/// these is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Add {
        recipe_id: i64,
        date: NaiveDate,
        comment: Option<String>,
    },
    Move {
        entry_id: i64,
        date: NaiveDate,
    },
    Comment {
        entry_id: i64,
        text: String,
    },
    Remove {
        entry_id: i64,
    },
    Clear,
}

impl PlanAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlanAction::Add { .. } => "add",
            PlanAction::Move { .. } => "move",
            PlanAction::Comment { .. } => "comment",
            PlanAction::Remove { .. } => "remove",
            PlanAction::Clear => "clear",
        }
    }
}

/// Raw form body for POST /plan. Every field is kept as text and parsed
/// leniently by the plan service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanActionForm {
    pub action: Option<String>,
    pub recipe_id: Option<String>,
    pub date: Option<String>,
    pub entry_id: Option<String>,
    pub comment: Option<String>,
    pub start_date: Option<String>,
    pub weeks: Option<String>,
}

/// Query params for GET /plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanWindowQuery {
    pub start_date: Option<String>,
    pub weeks: Option<String>,
}
