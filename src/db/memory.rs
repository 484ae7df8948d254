use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};

use super::{CookDelta, PlanRepository, RecipeRepository, SlugInsert};
use crate::models::{
    label::{Label, LabelFacet},
    plan::{EntryPlacement, PlannedMeal, WeeklyPlan, WeeklyPlanEntry},
    recipe::{Recipe, RecipeDraft},
};

/// In-process repositories used by tests and demos.
///
/// Every operation runs under one mutex, which gives the same atomicity the
/// PostgreSQL store gets from single statements and unique constraints.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    labels: BTreeMap<i64, Label>,
    recipes: BTreeMap<i64, Recipe>,
    plans: BTreeMap<i64, WeeklyPlan>,
    entries: BTreeMap<i64, WeeklyPlanEntry>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn labels_by_ids(&self, ids: &[i64]) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .labels
            .values()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        labels
    }

    fn plan_for(&mut self, week_start: NaiveDate) -> WeeklyPlan {
        if let Some(plan) = self.plans.values().find(|p| p.week_start == week_start) {
            return plan.clone();
        }
        let plan = WeeklyPlan {
            id: self.next_id(),
            week_start,
            created_at: Utc::now(),
        };
        self.plans.insert(plan.id, plan.clone());
        plan
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))
    }

    /// Number of plan rows, for asserting the one-plan-per-Monday invariant.
    pub fn plan_count(&self) -> anyhow::Result<usize> {
        Ok(self.lock()?.plans.len())
    }

    pub fn plans(&self) -> anyhow::Result<Vec<WeeklyPlan>> {
        Ok(self.lock()?.plans.values().cloned().collect())
    }

    pub fn entries(&self) -> anyhow::Result<Vec<WeeklyPlanEntry>> {
        Ok(self.lock()?.entries.values().cloned().collect())
    }

    /// Write an entry's date directly, bypassing the plan service.
    /// Mimics an edit made elsewhere (admin screen, SQL console).
    pub fn force_entry_date(&self, id: i64, date: NaiveDate) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        let entry = inner
            .entries
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("No entry {id}"))?;
        entry.date = date;
        Ok(())
    }

    /// Drop an entry's plan reference directly.
    pub fn detach_entry(&self, id: i64) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        let entry = inner
            .entries
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("No entry {id}"))?;
        entry.plan_id = None;
        Ok(())
    }
}

impl RecipeRepository for MemoryStore {
    async fn list_recipes(&self) -> anyhow::Result<Vec<Recipe>> {
        Ok(self.lock()?.recipes.values().cloned().collect())
    }

    async fn list_labels(&self) -> anyhow::Result<Vec<Label>> {
        let inner = self.lock()?;
        let ids: Vec<i64> = inner.labels.keys().copied().collect();
        Ok(inner.labels_by_ids(&ids))
    }

    async fn find_recipe(&self, id: i64) -> anyhow::Result<Option<Recipe>> {
        Ok(self.lock()?.recipes.get(&id).cloned())
    }

    async fn find_recipe_by_slug(&self, slug: &str) -> anyhow::Result<Option<Recipe>> {
        Ok(self
            .lock()?
            .recipes
            .values()
            .find(|r| r.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> anyhow::Result<bool> {
        Ok(self.lock()?.recipes.values().any(|r| r.slug == slug))
    }

    async fn insert_recipe(&self, slug: &str, draft: &RecipeDraft) -> anyhow::Result<SlugInsert> {
        let mut inner = self.lock()?;
        if inner.recipes.values().any(|r| r.slug == slug) {
            return Ok(SlugInsert::Taken);
        }
        let now = Utc::now();
        let recipe = Recipe {
            id: inner.next_id(),
            slug: slug.to_string(),
            title: draft.title.trim().to_string(),
            servings: draft.servings,
            duration_minutes: draft.duration_minutes,
            working_minutes: draft.working_minutes,
            temperature_celsius: draft.temperature_celsius,
            external_link: draft.external_link.clone(),
            ingredients: draft.ingredients_text(),
            steps: draft.steps_text(),
            cooked_count: 0,
            labels: inner.labels_by_ids(&draft.labels),
            created_at: now,
            updated_at: now,
        };
        inner.recipes.insert(recipe.id, recipe.clone());
        Ok(SlugInsert::Inserted(recipe))
    }

    async fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> anyhow::Result<Option<Recipe>> {
        let mut inner = self.lock()?;
        let labels = inner.labels_by_ids(&draft.labels);
        let Some(recipe) = inner.recipes.get_mut(&id) else {
            return Ok(None);
        };
        recipe.title = draft.title.trim().to_string();
        recipe.servings = draft.servings;
        recipe.duration_minutes = draft.duration_minutes;
        recipe.working_minutes = draft.working_minutes;
        recipe.temperature_celsius = draft.temperature_celsius;
        recipe.external_link = draft.external_link.clone();
        recipe.ingredients = draft.ingredients_text();
        recipe.steps = draft.steps_text();
        recipe.labels = labels;
        recipe.updated_at = Utc::now();
        Ok(Some(recipe.clone()))
    }

    async fn delete_recipe(&self, id: i64) -> anyhow::Result<bool> {
        let mut inner = self.lock()?;
        let removed = inner.recipes.remove(&id).is_some();
        if removed {
            inner.entries.retain(|_, e| e.recipe_id != id);
        }
        Ok(removed)
    }

    async fn create_label(&self, name: &str, facet: LabelFacet) -> anyhow::Result<Label> {
        let mut inner = self.lock()?;
        let label = Label {
            id: inner.next_id(),
            name: name.to_string(),
            facet,
        };
        inner.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn adjust_cooked_count(&self, id: i64, delta: CookDelta) -> anyhow::Result<Option<i32>> {
        let mut inner = self.lock()?;
        Ok(inner.recipes.get_mut(&id).map(|r| {
            r.cooked_count = match delta {
                CookDelta::Increment => r.cooked_count.saturating_add(1),
                CookDelta::Decrement => (r.cooked_count - 1).max(0),
            };
            r.cooked_count
        }))
    }
}

impl PlanRepository for MemoryStore {
    async fn get_or_create_plan(&self, week_start: NaiveDate) -> anyhow::Result<WeeklyPlan> {
        Ok(self.lock()?.plan_for(week_start))
    }

    async fn insert_entry(
        &self,
        plan_id: i64,
        recipe_id: i64,
        date: NaiveDate,
        comment: Option<&str>,
    ) -> anyhow::Result<WeeklyPlanEntry> {
        let mut inner = self.lock()?;
        anyhow::ensure!(inner.plans.contains_key(&plan_id), "No plan {plan_id}");
        anyhow::ensure!(inner.recipes.contains_key(&recipe_id), "No recipe {recipe_id}");
        let entry = WeeklyPlanEntry {
            id: inner.next_id(),
            plan_id: Some(plan_id),
            recipe_id,
            date,
            comment: comment.map(str::to_string),
        };
        inner.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn find_entry(&self, id: i64) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        Ok(self.lock()?.entries.get(&id).cloned())
    }

    async fn reassign_entry(
        &self,
        id: i64,
        week_start: NaiveDate,
        date: NaiveDate,
    ) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        let mut inner = self.lock()?;
        let plan = inner.plan_for(week_start);
        Ok(inner.entries.get_mut(&id).map(|e| {
            e.plan_id = Some(plan.id);
            e.date = date;
            e.clone()
        }))
    }

    async fn set_comment(
        &self,
        id: i64,
        comment: Option<&str>,
    ) -> anyhow::Result<Option<WeeklyPlanEntry>> {
        let mut inner = self.lock()?;
        Ok(inner.entries.get_mut(&id).map(|e| {
            e.comment = comment.map(str::to_string);
            e.clone()
        }))
    }

    async fn delete_entry(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.lock()?.entries.remove(&id).is_some())
    }

    async fn delete_all_entries(&self) -> anyhow::Result<u64> {
        let mut inner = self.lock()?;
        let n = inner.entries.len() as u64;
        inner.entries.clear();
        Ok(n)
    }

    async fn list_placements(&self) -> anyhow::Result<Vec<EntryPlacement>> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .values()
            .map(|e| EntryPlacement {
                id: e.id,
                date: e.date,
                week_start: e
                    .plan_id
                    .and_then(|pid| inner.plans.get(&pid))
                    .map(|p| p.week_start),
            })
            .collect())
    }

    async fn list_meals_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<Vec<PlannedMeal>> {
        let inner = self.lock()?;
        let mut meals: Vec<PlannedMeal> = inner
            .entries
            .values()
            .filter(|e| e.date >= from && e.date <= to)
            .filter_map(|e| {
                let recipe = inner.recipes.get(&e.recipe_id)?;
                Some(PlannedMeal {
                    id: e.id,
                    plan_id: e.plan_id,
                    recipe_id: e.recipe_id,
                    recipe_title: recipe.title.clone(),
                    recipe_slug: recipe.slug.clone(),
                    date: e.date,
                    comment: e.comment.clone(),
                })
            })
            .collect();
        meals.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(meals)
    }
}
