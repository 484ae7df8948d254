use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::{
    db::{PlanRepository, RecipeRepository},
    error::AppError,
    models::plan::{
        PlanAction, PlanActionForm, PlanDay, PlanWeek, PlanWindow, PlannedMeal, WeeklyPlanEntry,
    },
    services::{
        metrics::{PLAN_ACTIONS_COUNTER, PLAN_RECONCILED_COUNTER},
        week::{monday_of, parse_date, week_dates},
    },
};

/// What a dispatched [`PlanAction`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Added(WeeklyPlanEntry),
    Moved(WeeklyPlanEntry),
    Commented(WeeklyPlanEntry),
    Removed,
    Cleared(u64),
}

pub struct PlanService;

impl PlanService {
    /// Turn a raw form into an action. Unknown actions and missing companion
    /// parameters give `None` (a no-op). An absent or malformed `date` on
    /// `add` falls back to `today`; `move` needs a valid date.
    pub fn parse_action(form: &PlanActionForm, today: NaiveDate) -> Option<PlanAction> {
        let entry_id = || parse_id(form.entry_id.as_deref());
        let action = match form.action.as_deref().map(str::trim)? {
            "add" => PlanAction::Add {
                recipe_id: parse_id(form.recipe_id.as_deref())?,
                date: parse_date(form.date.as_deref()).unwrap_or(today),
                comment: form.comment.clone(),
            },
            "move" => PlanAction::Move {
                entry_id: entry_id()?,
                date: parse_date(form.date.as_deref())?,
            },
            "comment" => PlanAction::Comment {
                entry_id: entry_id()?,
                text: form.comment.clone()?,
            },
            "remove" => PlanAction::Remove { entry_id: entry_id()? },
            "clear" => PlanAction::Clear,
            other => {
                tracing::debug!("Ignoring unknown plan action {:?}", other);
                return None;
            }
        };
        Some(action)
    }

    pub async fn apply<S>(store: &S, action: PlanAction) -> Result<PlanOutcome, AppError>
    where
        S: PlanRepository + RecipeRepository,
    {
        let name = action.name();
        let outcome = match action {
            PlanAction::Add { recipe_id, date, comment } => {
                PlanOutcome::Added(Self::add(store, recipe_id, date, comment.as_deref()).await?)
            }
            PlanAction::Move { entry_id, date } => {
                PlanOutcome::Moved(Self::move_entry(store, entry_id, date).await?)
            }
            PlanAction::Comment { entry_id, text } => {
                PlanOutcome::Commented(Self::comment(store, entry_id, &text).await?)
            }
            PlanAction::Remove { entry_id } => {
                Self::remove(store, entry_id).await?;
                PlanOutcome::Removed
            }
            PlanAction::Clear => PlanOutcome::Cleared(Self::clear(store).await?),
        };
        PLAN_ACTIONS_COUNTER.with_label_values(&[name]).inc();
        Ok(outcome)
    }

    /// Schedule a recipe on `date`. Not idempotent: every call creates a new
    /// entry, even for the same recipe and date.
    pub async fn add<S>(
        store: &S,
        recipe_id: i64,
        date: NaiveDate,
        comment: Option<&str>,
    ) -> Result<WeeklyPlanEntry, AppError>
    where
        S: PlanRepository + RecipeRepository,
    {
        store
            .find_recipe(recipe_id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))?;
        let plan = store.get_or_create_plan(monday_of(date)).await?;
        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let entry = store.insert_entry(plan.id, recipe_id, date, comment).await?;
        tracing::info!(
            "Planned recipe {} on {} (entry {}, week {})",
            recipe_id,
            date,
            entry.id,
            plan.week_start
        );
        Ok(entry)
    }

    /// Move an entry to `date`, repointing it at that date's week plan.
    pub async fn move_entry<S: PlanRepository>(
        store: &S,
        entry_id: i64,
        date: NaiveDate,
    ) -> Result<WeeklyPlanEntry, AppError> {
        store
            .find_entry(entry_id)
            .await?
            .ok_or(AppError::NotFound("Plan entry"))?;
        let entry = store
            .reassign_entry(entry_id, monday_of(date), date)
            .await?
            .ok_or(AppError::NotFound("Plan entry"))?;
        tracing::info!("Moved plan entry {} to {}", entry_id, date);
        Ok(entry)
    }

    /// Set the comment to the trimmed text; an empty text clears it.
    pub async fn comment<S: PlanRepository>(
        store: &S,
        entry_id: i64,
        text: &str,
    ) -> Result<WeeklyPlanEntry, AppError> {
        let text = text.trim();
        let comment = (!text.is_empty()).then_some(text);
        store
            .set_comment(entry_id, comment)
            .await?
            .ok_or(AppError::NotFound("Plan entry"))
    }

    /// Delete one entry. Its plan is kept even if it becomes empty.
    pub async fn remove<S: PlanRepository>(store: &S, entry_id: i64) -> Result<(), AppError> {
        if !store.delete_entry(entry_id).await? {
            return Err(AppError::NotFound("Plan entry"));
        }
        tracing::info!("Removed plan entry {}", entry_id);
        Ok(())
    }

    /// Delete every entry in every week.
    pub async fn clear<S: PlanRepository>(store: &S) -> Result<u64, AppError> {
        let n = store.delete_all_entries().await?;
        tracing::info!("Cleared {} plan entries", n);
        Ok(n)
    }

    /// Repoint every entry whose plan week disagrees with its date (or that has
    /// no plan). Returns the number of repaired entries; a second run returns 0.
    pub async fn reconcile<S: PlanRepository>(store: &S) -> Result<usize, AppError> {
        let mut repaired = 0;
        for placement in store.list_placements().await? {
            let expected = monday_of(placement.date);
            if placement.week_start == Some(expected) {
                continue;
            }
            // The entry may have been deleted since the listing.
            if store
                .reassign_entry(placement.id, expected, placement.date)
                .await?
                .is_some()
            {
                repaired += 1;
            }
        }
        if repaired > 0 {
            PLAN_RECONCILED_COUNTER.inc_by(repaired as f64);
            tracing::info!("Reconciled {} plan entries", repaired);
        }
        Ok(repaired)
    }

    /// `weeks` consecutive weeks starting at the Monday of `start_date`, with
    /// entries grouped by their exact date. The window stops early at the end
    /// of the representable date range.
    pub async fn view_window<S: PlanRepository>(
        store: &S,
        start_date: NaiveDate,
        weeks: u32,
    ) -> Result<PlanWindow, AppError> {
        let first = monday_of(start_date);
        let week_starts: Vec<NaiveDate> = (0..u64::from(weeks))
            .map_while(|i| first.checked_add_days(Days::new(7 * i)))
            .collect();
        let Some(&last_start) = week_starts.last() else {
            return Ok(PlanWindow { start_date: first, weeks: vec![] });
        };
        let last = last_start
            .checked_add_days(Days::new(6))
            .unwrap_or(NaiveDate::MAX);

        let mut by_date: BTreeMap<NaiveDate, Vec<PlannedMeal>> = BTreeMap::new();
        for meal in store.list_meals_between(first, last).await? {
            by_date.entry(meal.date).or_default().push(meal);
        }

        let weeks = week_starts
            .into_iter()
            .map(|week_start| {
                let days = week_dates(week_start)
                    .into_iter()
                    .map(|date| PlanDay {
                        date,
                        entries: by_date.remove(&date).unwrap_or_default(),
                    })
                    .collect();
                PlanWeek { week_start, days }
            })
            .collect();

        Ok(PlanWindow { start_date: first, weeks })
    }

    /// Reconcile, then build the window. Every plan view goes through here.
    pub async fn reconciled_window<S: PlanRepository>(
        store: &S,
        start_date: NaiveDate,
        weeks: u32,
    ) -> Result<PlanWindow, AppError> {
        Self::reconcile(store).await?;
        Self::view_window(store, start_date, weeks).await
    }
}

/// Window length from the raw `weeks` parameter: `default` when absent,
/// malformed or < 1, capped at `max`.
pub fn window_weeks(raw: Option<&str>, default: u32, max: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|w| *w >= 1)
        .unwrap_or(default)
        .min(max)
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}
