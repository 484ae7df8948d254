pub mod memory;
pub mod postgres;

use std::future::Future;

use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::{
    label::{Label, LabelFacet},
    plan::{EntryPlacement, PlannedMeal, WeeklyPlan, WeeklyPlanEntry},
    recipe::{Recipe, RecipeDraft},
};

pub use memory::MemoryStore;
pub use postgres::{HealthSummary, PgStore};

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Direction of a cook-count update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookDelta {
    Increment,
    /// Decrement, clamped at zero.
    Decrement,
}

/// Outcome of inserting a recipe under a candidate slug.
#[derive(Debug)]
pub enum SlugInsert {
    Inserted(Recipe),
    /// Another writer took the slug between the check and the insert.
    Taken,
}

/// Recipe and label storage.
pub trait RecipeRepository: Sync {
    /// All recipes with their labels attached, in no particular order.
    fn list_recipes(&self) -> impl Future<Output = anyhow::Result<Vec<Recipe>>> + Send;

    fn list_labels(&self) -> impl Future<Output = anyhow::Result<Vec<Label>>> + Send;

    fn find_recipe(&self, id: i64)
        -> impl Future<Output = anyhow::Result<Option<Recipe>>> + Send;

    fn find_recipe_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Recipe>>> + Send;

    fn slug_exists(&self, slug: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    fn insert_recipe(
        &self,
        slug: &str,
        draft: &RecipeDraft,
    ) -> impl Future<Output = anyhow::Result<SlugInsert>> + Send;

    /// Replace authoring fields and labels. The slug is left untouched.
    fn update_recipe(
        &self,
        id: i64,
        draft: &RecipeDraft,
    ) -> impl Future<Output = anyhow::Result<Option<Recipe>>> + Send;

    fn delete_recipe(&self, id: i64) -> impl Future<Output = anyhow::Result<bool>> + Send;

    fn create_label(
        &self,
        name: &str,
        facet: LabelFacet,
    ) -> impl Future<Output = anyhow::Result<Label>> + Send;

    /// Single atomic read-modify-write of `cooked_count`. Returns the new value,
    /// or `None` if the recipe does not exist.
    fn adjust_cooked_count(
        &self,
        id: i64,
        delta: CookDelta,
    ) -> impl Future<Output = anyhow::Result<Option<i32>>> + Send;
}

/// Weekly plan and entry storage.
pub trait PlanRepository: Sync {
    /// Atomic get-or-create keyed by `week_start`.
    fn get_or_create_plan(
        &self,
        week_start: NaiveDate,
    ) -> impl Future<Output = anyhow::Result<WeeklyPlan>> + Send;

    fn insert_entry(
        &self,
        plan_id: i64,
        recipe_id: i64,
        date: NaiveDate,
        comment: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<WeeklyPlanEntry>> + Send;

    fn find_entry(
        &self,
        id: i64,
    ) -> impl Future<Output = anyhow::Result<Option<WeeklyPlanEntry>>> + Send;

    /// Point the entry at the plan for `week_start` (created if needed) and set
    /// its date, as one atomic unit. Returns `None` if the entry does not exist.
    fn reassign_entry(
        &self,
        id: i64,
        week_start: NaiveDate,
        date: NaiveDate,
    ) -> impl Future<Output = anyhow::Result<Option<WeeklyPlanEntry>>> + Send;

    fn set_comment(
        &self,
        id: i64,
        comment: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<Option<WeeklyPlanEntry>>> + Send;

    fn delete_entry(&self, id: i64) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Returns the number of deleted entries.
    fn delete_all_entries(&self) -> impl Future<Output = anyhow::Result<u64>> + Send;

    fn list_placements(&self) -> impl Future<Output = anyhow::Result<Vec<EntryPlacement>>> + Send;

    /// Entries dated within `[from, to]`, ordered by date then id.
    fn list_meals_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = anyhow::Result<Vec<PlannedMeal>>> + Send;
}
