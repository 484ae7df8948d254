use rand::seq::SliceRandom;

use crate::{
    db::{CookDelta, RecipeRepository, SlugInsert},
    error::AppError,
    models::{
        label::{Label, LabelFacet},
        recipe::{Recipe, RecipeDetail, RecipeDraft, RecipeIndex, RecipeQuery},
    },
    services::{
        catalog,
        metrics::{RECIPES_COOKED_COUNTER, RECIPES_CREATED_COUNTER},
        scaling,
    },
};

/// Attempts before giving up when concurrent creates keep taking our slug.
const SLUG_INSERT_ATTEMPTS: usize = 5;

/// Column widths from the schema.
pub const TITLE_MAX_CHARS: usize = 200;
pub const LABEL_NAME_MAX_CHARS: usize = 100;
/// Leaves room for a collision suffix within the 255-wide slug column.
const SLUG_BASE_MAX_CHARS: usize = 240;

pub struct RecipeService;

impl RecipeService {
    /// Filtered, sorted catalog plus the label lists the index view offers.
    pub async fn index<R: RecipeRepository>(
        store: &R,
        query: &RecipeQuery,
    ) -> Result<RecipeIndex, AppError> {
        let recipes = catalog::browse(store.list_recipes().await?, query);
        let (labels_category, labels_event): (Vec<Label>, Vec<Label>) = store
            .list_labels()
            .await?
            .into_iter()
            .partition(|l| l.facet == LabelFacet::Category);

        Ok(RecipeIndex {
            result_count: recipes.len(),
            recipes,
            labels_category,
            labels_event,
            selected_categories: query.category_labels.clone(),
            selected_events: query.event_labels.clone(),
            sort: query.sort,
        })
    }

    /// One recipe picked uniformly from the filtered catalog.
    pub async fn random<R: RecipeRepository>(
        store: &R,
        query: &RecipeQuery,
    ) -> Result<Option<Recipe>, AppError> {
        let candidates = catalog::filter_recipes(store.list_recipes().await?, query);
        Ok(candidates.choose(&mut rand::thread_rng()).cloned())
    }

    pub async fn detail<R: RecipeRepository>(
        store: &R,
        slug: &str,
        servings: Option<&str>,
    ) -> Result<RecipeDetail, AppError> {
        let recipe = Self::by_slug(store, slug).await?;
        let base = scaling::base_servings(recipe.servings);
        let current = scaling::requested_servings(servings, base);
        let ingredients_list = recipe.ingredient_lines();
        let scaled_ingredients = scaling::scale_lines(&ingredients_list, base, current)
            .iter()
            .map(scaling::ScaledLine::text)
            .collect();

        Ok(RecipeDetail {
            steps_list: recipe.step_lines(),
            ingredients_list,
            scaled_ingredients,
            current_servings: current,
            base_servings: base,
            recipe,
        })
    }

    pub async fn by_slug<R: RecipeRepository>(store: &R, slug: &str) -> Result<Recipe, AppError> {
        store
            .find_recipe_by_slug(slug)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    /// Create a recipe under a fresh slug derived from its title.
    pub async fn create<R: RecipeRepository>(
        store: &R,
        draft: &RecipeDraft,
    ) -> Result<Recipe, AppError> {
        validate(draft)?;
        let base = slugify(&draft.title);

        for _ in 0..SLUG_INSERT_ATTEMPTS {
            let slug = Self::free_slug(store, &base).await?;
            match store.insert_recipe(&slug, draft).await? {
                SlugInsert::Inserted(recipe) => {
                    RECIPES_CREATED_COUNTER.inc();
                    tracing::info!("Created recipe {} ({})", recipe.slug, recipe.id);
                    return Ok(recipe);
                }
                SlugInsert::Taken => {
                    tracing::debug!("Slug {} taken concurrently, retrying", slug);
                }
            }
        }
        Err(anyhow::anyhow!("Could not allocate a slug for {:?}", draft.title).into())
    }

    /// First of `base`, `base-2`, `base-3`, ... that is not taken.
    async fn free_slug<R: RecipeRepository>(store: &R, base: &str) -> anyhow::Result<String> {
        let mut slug = base.to_string();
        let mut counter = 1;
        while store.slug_exists(&slug).await? {
            counter += 1;
            slug = format!("{base}-{counter}");
        }
        Ok(slug)
    }

    pub async fn update<R: RecipeRepository>(
        store: &R,
        slug: &str,
        draft: &RecipeDraft,
    ) -> Result<Recipe, AppError> {
        validate(draft)?;
        let recipe = Self::by_slug(store, slug).await?;
        store
            .update_recipe(recipe.id, draft)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    pub async fn delete<R: RecipeRepository>(store: &R, slug: &str) -> Result<(), AppError> {
        let recipe = Self::by_slug(store, slug).await?;
        if !store.delete_recipe(recipe.id).await? {
            return Err(AppError::NotFound("Recipe"));
        }
        tracing::info!("Deleted recipe {} ({})", recipe.slug, recipe.id);
        Ok(())
    }

    /// Increment `cooked_count`; returns the new count.
    pub async fn cook<R: RecipeRepository>(store: &R, recipe_id: i64) -> Result<i32, AppError> {
        Self::adjust(store, recipe_id, CookDelta::Increment).await
    }

    /// Decrement `cooked_count`, never below zero; returns the new count.
    pub async fn undo_cook<R: RecipeRepository>(store: &R, recipe_id: i64) -> Result<i32, AppError> {
        Self::adjust(store, recipe_id, CookDelta::Decrement).await
    }

    async fn adjust<R: RecipeRepository>(
        store: &R,
        recipe_id: i64,
        delta: CookDelta,
    ) -> Result<i32, AppError> {
        let count = store
            .adjust_cooked_count(recipe_id, delta)
            .await?
            .ok_or(AppError::NotFound("Recipe"))?;
        let direction = match delta {
            CookDelta::Increment => "cook",
            CookDelta::Decrement => "undo",
        };
        RECIPES_COOKED_COUNTER.with_label_values(&[direction]).inc();
        tracing::info!("Recipe {} {}: cooked_count = {}", recipe_id, direction, count);
        Ok(count)
    }

    pub async fn list_labels<R: RecipeRepository>(store: &R) -> Result<Vec<Label>, AppError> {
        Ok(store.list_labels().await?)
    }

    pub async fn create_label<R: RecipeRepository>(
        store: &R,
        name: &str,
        facet: LabelFacet,
    ) -> Result<Label, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Label name must not be empty".into()));
        }
        if name.chars().count() > LABEL_NAME_MAX_CHARS {
            return Err(AppError::InvalidInput(format!(
                "Label name must be at most {LABEL_NAME_MAX_CHARS} characters"
            )));
        }
        Ok(store.create_label(name, facet).await?)
    }
}

fn validate(draft: &RecipeDraft) -> Result<(), AppError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".into()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    if matches!(draft.servings, Some(s) if s < 1) {
        return Err(AppError::InvalidInput("Servings must be positive".into()));
    }
    let minutes = [
        draft.duration_minutes,
        draft.working_minutes,
        draft.temperature_celsius,
    ];
    if minutes.iter().flatten().any(|m| *m < 0) {
        return Err(AppError::InvalidInput("Durations and temperature must not be negative".into()));
    }
    Ok(())
}

/// URL slug for a title: lowercase ASCII letters, digits, `_` and single
/// hyphens. Common Latin accents are folded; other characters are dropped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_sep = true;
            continue;
        }
        let folded = if c.is_ascii_alphanumeric() || c == '_' {
            Some(c.to_string())
        } else {
            fold_accent(c).map(str::to_string)
        };
        if let Some(s) = folded {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push_str(&s);
        }
    }

    // Folding only emits ASCII, so byte truncation stays on a char boundary.
    slug.truncate(SLUG_BASE_MAX_CHARS);
    let slug = slug.trim_matches(|c| c == '-' || c == '_');
    if slug.is_empty() {
        "recipe".to_string()
    } else {
        slug.to_string()
    }
}

fn fold_accent(c: char) -> Option<&'static str> {
    let s = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'æ' => "ae",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.to_string(),
            servings: Some(4),
            ingredients: vec!["200 g flour".into(), "".into(), "salt to taste".into()],
            steps: vec!["Mix.".into(), "  ".into(), "Bake.".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Käsespätzle mit Röstzwiebeln"), "kasespatzle-mit-rostzwiebeln");
        assert_eq!(slugify("  Crème brûlée!  "), "creme-brulee");
        assert_eq!(slugify("Mom's  -- Best   Pie"), "moms-best-pie");
        assert_eq!(slugify("Weißwurst"), "weisswurst");
        assert_eq!(slugify("???"), "recipe");
    }

    #[tokio::test]
    async fn test_slug_collisions_get_numeric_suffix() {
        let store = MemoryStore::new();
        let a = RecipeService::create(&store, &draft("Pancakes")).await.unwrap();
        let b = RecipeService::create(&store, &draft("Pancakes")).await.unwrap();
        let c = RecipeService::create(&store, &draft("pancakes!")).await.unwrap();
        assert_eq!(a.slug, "pancakes");
        assert_eq!(b.slug, "pancakes-2");
        assert_eq!(c.slug, "pancakes-3");
    }

    #[tokio::test]
    async fn test_update_keeps_slug() {
        let store = MemoryStore::new();
        RecipeService::create(&store, &draft("Pancakes")).await.unwrap();
        let updated = RecipeService::update(&store, "pancakes", &draft("Crêpes"))
            .await
            .unwrap();
        assert_eq!(updated.slug, "pancakes");
        assert_eq!(updated.title, "Crêpes");
    }

    #[tokio::test]
    async fn test_title_longer_than_column_is_rejected() {
        let store = MemoryStore::new();
        let at_limit = "é".repeat(TITLE_MAX_CHARS);
        let recipe = RecipeService::create(&store, &draft(&at_limit)).await.unwrap();
        assert!(recipe.slug.len() <= SLUG_BASE_MAX_CHARS);

        let err = RecipeService::create(&store, &draft(&"a".repeat(TITLE_MAX_CHARS + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);

        let err = RecipeService::update(&store, &recipe.slug, &draft(&"b".repeat(201)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_label_name_longer_than_column_is_rejected() {
        let store = MemoryStore::new();
        let long = "x".repeat(LABEL_NAME_MAX_CHARS + 1);
        let err = RecipeService::create_label(&store, &long, LabelFacet::Event)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(RecipeService::list_labels(&store).await.unwrap().is_empty());

        let ok = "y".repeat(LABEL_NAME_MAX_CHARS);
        RecipeService::create_label(&store, &ok, LabelFacet::Event).await.unwrap();
    }

    #[test]
    fn test_slug_of_long_title_fits_column() {
        let slug = slugify(&"ß".repeat(TITLE_MAX_CHARS));
        assert_eq!(slug.len(), SLUG_BASE_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let store = MemoryStore::new();
        let err = RecipeService::create(&store, &draft("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_detail_scales_and_drops_blank_lines() {
        let store = MemoryStore::new();
        RecipeService::create(&store, &draft("Bread")).await.unwrap();
        let detail = RecipeService::detail(&store, "bread", Some("6")).await.unwrap();
        assert_eq!(detail.base_servings, 4);
        assert_eq!(detail.current_servings, 6);
        assert_eq!(detail.ingredients_list, vec!["200 g flour", "salt to taste"]);
        assert_eq!(detail.scaled_ingredients, vec!["300 g flour", "salt to taste"]);
        assert_eq!(detail.steps_list, vec!["Mix.", "Bake."]);
    }

    #[tokio::test]
    async fn test_detail_with_unset_servings_uses_one() {
        let store = MemoryStore::new();
        let mut d = draft("Omelette");
        d.servings = None;
        d.ingredients = vec!["2 eggs".into()];
        RecipeService::create(&store, &d).await.unwrap();
        let detail = RecipeService::detail(&store, "omelette", Some("3")).await.unwrap();
        assert_eq!(detail.base_servings, 1);
        assert_eq!(detail.scaled_ingredients, vec!["6 eggs"]);
    }

    #[tokio::test]
    async fn test_detail_unknown_slug_is_not_found() {
        let store = MemoryStore::new();
        let err = RecipeService::detail(&store, "nope", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_undo_cook_clamps_at_zero() {
        let store = MemoryStore::new();
        let r = RecipeService::create(&store, &draft("Risotto")).await.unwrap();
        assert_eq!(RecipeService::undo_cook(&store, r.id).await.unwrap(), 0);
        assert_eq!(RecipeService::undo_cook(&store, r.id).await.unwrap(), 0);
        assert_eq!(RecipeService::cook(&store, r.id).await.unwrap(), 1);
        assert_eq!(RecipeService::cook(&store, r.id).await.unwrap(), 2);
        assert_eq!(RecipeService::undo_cook(&store, r.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cook_unknown_recipe_is_not_found() {
        let store = MemoryStore::new();
        let err = RecipeService::cook(&store, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_index_splits_labels_by_facet() {
        let store = MemoryStore::new();
        let veg = RecipeService::create_label(&store, "Vegetarian", LabelFacet::Category)
            .await
            .unwrap();
        let xmas = RecipeService::create_label(&store, "Christmas", LabelFacet::Event)
            .await
            .unwrap();
        let mut d = draft("Stollen");
        d.labels = vec![veg.id, xmas.id];
        RecipeService::create(&store, &d).await.unwrap();
        RecipeService::create(&store, &draft("Goulash")).await.unwrap();

        let query = RecipeQuery { event_labels: vec![xmas.id], ..Default::default() };
        let index = RecipeService::index(&store, &query).await.unwrap();
        assert_eq!(index.result_count, 1);
        assert_eq!(index.recipes[0].slug, "stollen");
        assert_eq!(index.labels_category, vec![veg]);
        assert_eq!(index.labels_event, vec![xmas.clone()]);
        assert_eq!(index.selected_events, vec![xmas.id]);
    }

    #[tokio::test]
    async fn test_random_respects_filters() {
        let store = MemoryStore::new();
        let mut quick = draft("Toast");
        quick.duration_minutes = Some(5);
        RecipeService::create(&store, &quick).await.unwrap();
        RecipeService::create(&store, &draft("Roast")).await.unwrap();

        let query = RecipeQuery { max_duration: Some(10), ..Default::default() };
        for _ in 0..10 {
            let pick = RecipeService::random(&store, &query).await.unwrap().unwrap();
            assert_eq!(pick.slug, "toast");
        }

        let none = RecipeQuery { q: Some("nothing like this".into()), ..Default::default() };
        assert!(RecipeService::random(&store, &none).await.unwrap().is_none());
    }
}
