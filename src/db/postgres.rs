use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{CookDelta, PlanRepository, RecipeRepository, SlugInsert};
use crate::models::{
    label::{Label, LabelFacet},
    plan::{EntryPlacement, PlannedMeal, WeeklyPlan, WeeklyPlanEntry},
    recipe::{Recipe, RecipeDraft},
};

const RECIPE_COLUMNS: &str = "id, slug, title, servings, duration_minutes, working_minutes,
    temperature_celsius, external_link, ingredients, steps, cooked_count, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, plan_id, recipe_id, date, comment";

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct HealthSummary {
    pub schema_version: Option<i64>,
    pub recipes: i64,
    pub planned_entries: i64,
}

/// PostgreSQL-backed repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Latest applied migration plus catalog and plan sizes, for /health.
    pub async fn health_summary(&self) -> anyhow::Result<HealthSummary> {
        let summary = sqlx::query_as::<_, HealthSummary>(
            r#"SELECT (SELECT MAX(version) FROM _sqlx_migrations WHERE success) AS schema_version,
                      (SELECT COUNT(*) FROM recipes)             AS recipes,
                      (SELECT COUNT(*) FROM weekly_plan_entries) AS planned_entries"#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(summary)
    }

    async fn labels_for(&self, recipe_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<Label>>> {
        let rows = sqlx::query_as::<_, RecipeLabelRow>(
            r#"SELECT rl.recipe_id, l.id, l.name, l.facet
               FROM recipe_labels rl
               JOIN labels l ON l.id = rl.label_id
               WHERE rl.recipe_id = ANY($1)
               ORDER BY l.name, l.id"#,
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_recipe: HashMap<i64, Vec<Label>> = HashMap::new();
        for row in rows {
            let recipe_id = row.recipe_id;
            let label = LabelRow {
                id: row.id,
                name: row.name,
                facet: row.facet,
            }
            .into_label()?;
            by_recipe.entry(recipe_id).or_default().push(label);
        }
        Ok(by_recipe)
    }

    async fn attach_labels(&self, rows: Vec<RecipeRow>) -> anyhow::Result<Vec<Recipe>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut labels = self.labels_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let l = labels.remove(&row.id).unwrap_or_default();
                row.into_recipe(l)
            })
            .collect())
    }

    async fn fetch_one_recipe(&self, row: Option<RecipeRow>) -> anyhow::Result<Option<Recipe>> {
        match row {
            Some(row) => Ok(self.attach_labels(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

async fn replace_labels(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i64,
    label_ids: &[i64],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_labels WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    if !label_ids.is_empty() {
        // Unknown label ids are skipped rather than violating the foreign key.
        sqlx::query(
            r#"INSERT INTO recipe_labels (recipe_id, label_id)
               SELECT $1, id FROM labels WHERE id = ANY($2)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(recipe_id)
        .bind(label_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl RecipeRepository for PgStore {
    async fn list_recipes(&self) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.attach_labels(rows).await
    }

    async fn list_labels(&self) -> anyhow::Result<Vec<Label>> {
        let rows = sqlx::query_as::<_, LabelRow>(
            "SELECT id, name, facet FROM labels ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LabelRow::into_label).collect()
    }

    async fn find_recipe(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.fetch_one_recipe(row).await
    }

    async fn find_recipe_by_slug(&self, slug: &str) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        self.fetch_one_recipe(row).await
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM recipes WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_recipe(&self, slug: &str, draft: &RecipeDraft) -> anyhow::Result<SlugInsert> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"INSERT INTO recipes
                   (slug, title, servings, duration_minutes, working_minutes,
                    temperature_celsius, external_link, ingredients, steps)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (slug) DO NOTHING
               RETURNING {RECIPE_COLUMNS}"#
        ))
        .bind(slug)
        .bind(draft.title.trim())
        .bind(draft.servings)
        .bind(draft.duration_minutes)
        .bind(draft.working_minutes)
        .bind(draft.temperature_celsius)
        .bind(&draft.external_link)
        .bind(draft.ingredients_text())
        .bind(draft.steps_text())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(SlugInsert::Taken);
        };

        replace_labels(&mut tx, row.id, &draft.labels).await?;
        tx.commit().await?;

        let mut recipes = self.attach_labels(vec![row]).await?;
        recipes
            .pop()
            .map(SlugInsert::Inserted)
            .ok_or_else(|| anyhow::anyhow!("Inserted recipe vanished"))
    }

    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> anyhow::Result<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"UPDATE recipes
               SET title               = $1,
                   servings            = $2,
                   duration_minutes    = $3,
                   working_minutes     = $4,
                   temperature_celsius = $5,
                   external_link       = $6,
                   ingredients         = $7,
                   steps               = $8,
                   updated_at          = NOW()
               WHERE id = $9
               RETURNING {RECIPE_COLUMNS}"#
        ))
        .bind(draft.title.trim())
        .bind(draft.servings)
        .bind(draft.duration_minutes)
        .bind(draft.working_minutes)
        .bind(draft.temperature_celsius)
        .bind(&draft.external_link)
        .bind(draft.ingredients_text())
        .bind(draft.steps_text())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        replace_labels(&mut tx, id, &draft.labels).await?;
        tx.commit().await?;
        self.fetch_one_recipe(Some(row)).await
    }

    async fn delete_recipe(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_label(&self, name: &str, facet: LabelFacet) -> anyhow::Result<Label> {
        let row = sqlx::query_as::<_, LabelRow>(
            "INSERT INTO labels (name, facet) VALUES ($1, $2) RETURNING id, name, facet",
        )
        .bind(name)
        .bind(facet.to_string())
        .fetch_one(&self.pool)
        .await?;
        row.into_label()
    }

    async fn adjust_cooked_count(&self, id: i64, delta: CookDelta) -> anyhow::Result<Option<i32>> {
        let sql = match delta {
            CookDelta::Increment => {
                "UPDATE recipes SET cooked_count = cooked_count + 1
                 WHERE id = $1 RETURNING cooked_count"
            }
            CookDelta::Decrement => {
                "UPDATE recipes SET cooked_count = GREATEST(cooked_count - 1, 0)
                 WHERE id = $1 RETURNING cooked_count"
            }
        };
        let count: Option<i32> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(count)
    }
}

impl PlanRepository for PgStore {
    async fn get_or_create_plan(&self, week_start: NaiveDate) -> anyhow::Result<WeeklyPlan> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on conflict.
        let plan = sqlx::query_as::<_, WeeklyPlan>(
            r#"INSERT INTO weekly_plans (week_start)
               VALUES ($1)
               ON CONFLICT (week_start) DO UPDATE SET week_start = EXCLUDED.week_start
               RETURNING id, week_start, created_at"#,
        )
        .bind(week_start)
        .fetch_one(&self.pool)
        .await?;
        Ok(plan)
    }

    async fn insert_entry(
        &self,
        plan_id: i64,
        recipe_id: i64,
        date: NaiveDate,
        comment: Option<&str>,
    ) -> anyhow::Result<WeeklyPlanEntry> {
        let entry = sqlx::query_as::<_, WeeklyPlanEntry>(&format!(
            r#"INSERT INTO weekly_plan_entries (plan_id, recipe_id, date, comment)
               VALUES ($1, $2, $3, $4)
               RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(plan_id)
        .bind(recipe_id)
        .bind(date)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn find_entry(&self, id: i64) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        let entry = sqlx::query_as::<_, WeeklyPlanEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM weekly_plan_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn reassign_entry(
        &self,
        id: i64,
        week_start: NaiveDate,
        date: NaiveDate,
    ) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        // Plan upsert and entry update in one statement so no reader sees a
        // date that disagrees with the plan's week.
        let entry = sqlx::query_as::<_, WeeklyPlanEntry>(&format!(
            r#"WITH plan AS (
                   INSERT INTO weekly_plans (week_start)
                   VALUES ($2)
                   ON CONFLICT (week_start) DO UPDATE SET week_start = EXCLUDED.week_start
                   RETURNING id
               )
               UPDATE weekly_plan_entries
               SET plan_id = (SELECT id FROM plan),
                   date    = $3
               WHERE id = $1
               RETURNING {ENTRY_COLUMNS}"#
        ))
        .bind(id)
        .bind(week_start)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn set_comment(
        &self,
        id: i64,
        comment: Option<&str>,
    ) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        let entry = sqlx::query_as::<_, WeeklyPlanEntry>(&format!(
            "UPDATE weekly_plan_entries SET comment = $1 WHERE id = $2 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(comment)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn delete_entry(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM weekly_plan_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_entries(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM weekly_plan_entries")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_placements(&self) -> anyhow::Result<Vec<EntryPlacement>> {
        let rows = sqlx::query_as::<_, EntryPlacement>(
            r#"SELECT e.id, e.date, p.week_start
               FROM weekly_plan_entries e
               LEFT JOIN weekly_plans p ON p.id = e.plan_id
               ORDER BY e.id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_meals_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<PlannedMeal>> {
        let rows = sqlx::query_as::<_, PlannedMeal>(
            r#"SELECT e.id, e.plan_id, e.recipe_id,
                      r.title AS recipe_title,
                      r.slug  AS recipe_slug,
                      e.date, e.comment
               FROM weekly_plan_entries e
               JOIN recipes r ON r.id = e.recipe_id
               WHERE e.date BETWEEN $1 AND $2
               ORDER BY e.date, e.id"#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: i64,
    slug: String,
    title: String,
    servings: Option<i32>,
    duration_minutes: Option<i32>,
    working_minutes: Option<i32>,
    temperature_celsius: Option<i32>,
    external_link: Option<String>,
    ingredients: String,
    steps: String,
    cooked_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecipeRow {
    fn into_recipe(self, labels: Vec<Label>) -> Recipe {
        Recipe {
            id: self.id,
            slug: self.slug,
            title: self.title,
            servings: self.servings,
            duration_minutes: self.duration_minutes,
            working_minutes: self.working_minutes,
            temperature_celsius: self.temperature_celsius,
            external_link: self.external_link,
            ingredients: self.ingredients,
            steps: self.steps,
            cooked_count: self.cooked_count,
            labels,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Facet is read as TEXT and parsed, like the other enum-ish columns.
#[derive(Debug, FromRow)]
struct LabelRow {
    id: i64,
    name: String,
    facet: String,
}

impl LabelRow {
    fn into_label(self) -> anyhow::Result<Label> {
        Ok(Label {
            id: self.id,
            name: self.name,
            facet: self.facet.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecipeLabelRow {
    recipe_id: i64,
    id: i64,
    name: String,
    facet: String,
}
