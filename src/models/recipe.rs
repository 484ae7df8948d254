use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::label::{Label, LabelFacet};

/// A catalogued recipe together with its labels.
///
/// Ingredients and steps are stored as newline-separated raw text; use
/// [`Recipe::ingredient_lines`] and [`Recipe::step_lines`] to read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// `None` means "unspecified"; scaling treats it as 1.
    pub servings: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub working_minutes: Option<i32>,
    pub temperature_celsius: Option<i32>,
    pub external_link: Option<String>,
    pub ingredients: String,
    pub steps: String,
    pub cooked_count: i32,
    pub labels: Vec<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    /// Non-blank ingredient lines, trimmed, in stored order.
    pub fn ingredient_lines(&self) -> Vec<String> {
        non_blank_lines(&self.ingredients)
    }

    /// Non-blank step lines, trimmed, in stored order.
    pub fn step_lines(&self) -> Vec<String> {
        non_blank_lines(&self.steps)
    }

    /// True if one of the recipe's labels has this id AND belongs to `facet`.
    pub fn has_label_in(&self, ids: &[i64], facet: LabelFacet) -> bool {
        self.labels
            .iter()
            .any(|l| l.facet == facet && ids.contains(&l.id))
    }
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Authoring input shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeDraft {
    pub title: String,
    pub servings: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub working_minutes: Option<i32>,
    pub temperature_celsius: Option<i32>,
    pub external_link: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub labels: Vec<i64>,
}

impl RecipeDraft {
    /// Ingredient lines joined for storage, blanks dropped.
    pub fn ingredients_text(&self) -> String {
        join_lines(&self.ingredients)
    }

    pub fn steps_text(&self) -> String {
        join_lines(&self.steps)
    }
}

fn join_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Orderings accepted by the `sort` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Title,
    Duration,
    Cooked,
}

impl SortKey {
    /// Unknown or absent keys fall back to [`SortKey::Title`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("duration") => SortKey::Duration,
            Some("cooked") => SortKey::Cooked,
            _ => SortKey::Title,
        }
    }
}

/// Parsed catalog query (GET /recipes, GET /recipes/random).
///
/// Built leniently from raw query pairs: unparseable numbers are treated as
/// absent and unparseable label ids are dropped. An empty `q` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub q: Option<String>,
    pub max_duration: Option<i32>,
    pub max_working_duration: Option<i32>,
    pub category_labels: Vec<i64>,
    pub event_labels: Vec<i64>,
    pub sort: SortKey,
}

impl RecipeQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut query = RecipeQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                // Matched verbatim, surrounding spaces included.
                "q" => query.q = (!value.is_empty()).then(|| value.clone()),
                "max_duration" => query.max_duration = parse_bound(value),
                "max_working_duration" => query.max_working_duration = parse_bound(value),
                "category_labels" => query.category_labels.extend(parse_id(value)),
                "event_labels" => query.event_labels.extend(parse_id(value)),
                "sort" => query.sort = SortKey::parse(Some(value)),
                _ => {}
            }
        }
        query
    }
}

/// A negative bound is kept; it simply matches nothing.
fn parse_bound(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Response body for GET /recipes.
#[derive(Debug, Serialize)]
pub struct RecipeIndex {
    pub recipes: Vec<Recipe>,
    pub result_count: usize,
    pub labels_category: Vec<Label>,
    pub labels_event: Vec<Label>,
    pub selected_categories: Vec<i64>,
    pub selected_events: Vec<i64>,
    pub sort: SortKey,
}

/// Response body for GET /recipes/{slug}.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    /// Unscaled ingredient lines as authored.
    pub ingredients_list: Vec<String>,
    pub scaled_ingredients: Vec<String>,
    pub steps_list: Vec<String>,
    pub current_servings: i32,
    pub base_servings: i32,
}

/// Query params for GET /recipes/{slug}.
#[derive(Debug, Deserialize)]
pub struct RecipeDetailQuery {
    pub servings: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_collects_repeated_labels() {
        let q = RecipeQuery::from_pairs(&pairs(&[
            ("category_labels", "3"),
            ("category_labels", "4"),
            ("event_labels", "9"),
        ]));
        assert_eq!(q.category_labels, vec![3, 4]);
        assert_eq!(q.event_labels, vec![9]);
    }

    #[test]
    fn test_query_ignores_non_numeric_bounds() {
        let q = RecipeQuery::from_pairs(&pairs(&[
            ("max_duration", "soon"),
            ("max_working_duration", "15"),
            ("category_labels", "x"),
        ]));
        assert_eq!(q.max_duration, None);
        assert_eq!(q.max_working_duration, Some(15));
        assert!(q.category_labels.is_empty());
    }

    #[test]
    fn test_query_empty_search_is_absent() {
        let q = RecipeQuery::from_pairs(&pairs(&[("q", ""), ("sort", "cooked")]));
        assert_eq!(q.q, None);
        assert_eq!(q.sort, SortKey::Cooked);
    }

    #[test]
    fn test_query_search_is_kept_verbatim() {
        let q = RecipeQuery::from_pairs(&pairs(&[("q", " pie ")]));
        assert_eq!(q.q.as_deref(), Some(" pie "));
    }

    #[test]
    fn test_query_keeps_negative_bounds() {
        let q = RecipeQuery::from_pairs(&pairs(&[
            ("max_duration", "-5"),
            ("max_working_duration", " 10 "),
        ]));
        assert_eq!(q.max_duration, Some(-5));
        assert_eq!(q.max_working_duration, Some(10));
    }

    #[test]
    fn test_sort_key_defaults_to_title() {
        assert_eq!(SortKey::parse(None), SortKey::Title);
        assert_eq!(SortKey::parse(Some("rating")), SortKey::Title);
        assert_eq!(SortKey::parse(Some("duration")), SortKey::Duration);
    }

    #[test]
    fn test_draft_drops_blank_lines() {
        let draft = RecipeDraft {
            ingredients: vec!["  200 g flour ".into(), "".into(), "  ".into(), "salt".into()],
            ..Default::default()
        };
        assert_eq!(draft.ingredients_text(), "200 g flour\nsalt");
    }
}
