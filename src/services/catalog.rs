use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{
    label::LabelFacet,
    recipe::{Recipe, RecipeQuery, SortKey},
};

/// Apply every filter dimension of `query` to `recipes`.
///
/// Dimensions combine with AND; the free-text search matches title OR raw
/// ingredient text. The result holds each recipe id at most once, in input
/// order.
pub fn filter_recipes(recipes: Vec<Recipe>, query: &RecipeQuery) -> Vec<Recipe> {
    let needle = query.q.as_deref().map(str::to_lowercase);
    let mut seen = HashSet::new();

    recipes
        .into_iter()
        .filter(|r| match &needle {
            Some(n) => r.title.to_lowercase().contains(n) || r.ingredients.to_lowercase().contains(n),
            None => true,
        })
        .filter(|r| within(r.duration_minutes, query.max_duration))
        .filter(|r| within(r.working_minutes, query.max_working_duration))
        .filter(|r| {
            query.category_labels.is_empty()
                || r.has_label_in(&query.category_labels, LabelFacet::Category)
        })
        .filter(|r| {
            query.event_labels.is_empty() || r.has_label_in(&query.event_labels, LabelFacet::Event)
        })
        .filter(|r| seen.insert(r.id))
        .collect()
}

/// An unset minute field never satisfies a bound.
fn within(value: Option<i32>, bound: Option<i32>) -> bool {
    match (bound, value) {
        (None, _) => true,
        (Some(max), Some(v)) => v <= max,
        (Some(_), None) => false,
    }
}

/// Order `recipes` by `key`. Ties fall back to title and then id so the output
/// is deterministic for a given input.
///
/// - `Title`: case-sensitive ascending.
/// - `Duration`: ascending, unset durations last (PostgreSQL's ASC default).
/// - `Cooked`: ascending by `cooked_count`.
pub fn sort_recipes(recipes: &mut [Recipe], key: SortKey) {
    recipes.sort_by(|a, b| {
        let primary = match key {
            SortKey::Title => Ordering::Equal,
            SortKey::Duration => nulls_last(a.duration_minutes, b.duration_minutes),
            SortKey::Cooked => a.cooked_count.cmp(&b.cooked_count),
        };
        primary
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn nulls_last(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter then sort, as the index view does.
pub fn browse(recipes: Vec<Recipe>, query: &RecipeQuery) -> Vec<Recipe> {
    let mut out = filter_recipes(recipes, query);
    sort_recipes(&mut out, query.sort);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::Label;
    use chrono::Utc;
    use proptest::prelude::*;

    fn label(id: i64, facet: LabelFacet) -> Label {
        Label { id, name: format!("label-{id}"), facet }
    }

    fn recipe(id: i64, title: &str) -> Recipe {
        Recipe {
            id,
            slug: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            servings: Some(2),
            duration_minutes: None,
            working_minutes: None,
            temperature_celsius: None,
            external_link: None,
            ingredients: String::new(),
            steps: String::new(),
            cooked_count: 0,
            labels: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(recipes: &[Recipe]) -> Vec<i64> {
        recipes.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<Recipe> {
        let mut soup = recipe(1, "Pumpkin Soup");
        soup.duration_minutes = Some(40);
        soup.working_minutes = Some(15);
        soup.ingredients = "1 kg pumpkin\n1 l stock".into();
        soup.labels = vec![label(10, LabelFacet::Category), label(20, LabelFacet::Event)];

        let mut salad = recipe(2, "Green Salad");
        salad.duration_minutes = Some(10);
        salad.working_minutes = Some(10);
        salad.ingredients = "1 head lettuce\n2 tbsp Pumpkin seeds".into();
        salad.labels = vec![label(11, LabelFacet::Category)];

        let mut cake = recipe(3, "apple cake");
        cake.labels = vec![label(20, LabelFacet::Event)];
        cake.cooked_count = 4;

        vec![soup, salad, cake]
    }

    #[test]
    fn test_empty_query_keeps_sample() {
        let out = filter_recipes(sample(), &RecipeQuery::default());
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_negative_bound_excludes_everything() {
        let query = RecipeQuery { max_duration: Some(-5), ..Default::default() };
        assert!(filter_recipes(sample(), &query).is_empty());
    }

    #[test]
    fn test_search_matches_title_or_ingredients_case_insensitive() {
        let query = RecipeQuery { q: Some("PUMPKIN".into()), ..Default::default() };
        assert_eq!(ids(&filter_recipes(sample(), &query)), vec![1, 2]);
    }

    #[test]
    fn test_search_keeps_surrounding_spaces() {
        let leading = RecipeQuery { q: Some(" soup".into()), ..Default::default() };
        assert_eq!(ids(&filter_recipes(sample(), &leading)), vec![1]);
        let trailing = RecipeQuery { q: Some("soup ".into()), ..Default::default() };
        assert!(filter_recipes(sample(), &trailing).is_empty());
    }

    #[test]
    fn test_max_duration_excludes_unset_duration() {
        let query = RecipeQuery { max_duration: Some(20), ..Default::default() };
        assert_eq!(ids(&filter_recipes(sample(), &query)), vec![2]);
    }

    #[test]
    fn test_max_working_duration_bound_is_inclusive() {
        let query = RecipeQuery { max_working_duration: Some(15), ..Default::default() };
        assert_eq!(ids(&filter_recipes(sample(), &query)), vec![1, 2]);
    }

    #[test]
    fn test_label_facets_combine_with_and() {
        let query = RecipeQuery {
            category_labels: vec![10, 11],
            event_labels: vec![20],
            ..Default::default()
        };
        assert_eq!(ids(&filter_recipes(sample(), &query)), vec![1]);
    }

    #[test]
    fn test_category_id_in_event_filter_never_matches() {
        let query = RecipeQuery { event_labels: vec![10, 11], ..Default::default() };
        assert!(filter_recipes(sample(), &query).is_empty());
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let mut input = sample();
        input.push(input[0].clone());
        let query = RecipeQuery { category_labels: vec![10], ..Default::default() };
        assert_eq!(ids(&filter_recipes(input, &query)), vec![1]);
    }

    #[test]
    fn test_sort_by_title_is_case_sensitive() {
        let mut out = sample();
        sort_recipes(&mut out, SortKey::Title);
        // Uppercase sorts before lowercase.
        assert_eq!(ids(&out), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_by_title_ties_are_deterministic() {
        let mut out = vec![recipe(7, "Stew"), recipe(5, "Stew"), recipe(6, "Stew")];
        sort_recipes(&mut out, SortKey::Title);
        assert_eq!(ids(&out), vec![5, 6, 7]);
    }

    #[test]
    fn test_sort_by_duration_puts_unset_last() {
        let mut out = sample();
        sort_recipes(&mut out, SortKey::Duration);
        assert_eq!(ids(&out), vec![2, 1, 3]);
    }

    #[test]
    fn test_sort_by_cooked_is_ascending() {
        let mut input = sample();
        input[0].cooked_count = 2;
        input[1].cooked_count = 9;
        let query = RecipeQuery { sort: SortKey::Cooked, ..Default::default() };
        assert_eq!(ids(&browse(input, &query)), vec![1, 3, 2]);
    }

    /// Label ids 1..=5 are categories, 6..=10 are events.
    fn facet_of(id: i64) -> LabelFacet {
        if id <= 5 {
            LabelFacet::Category
        } else {
            LabelFacet::Event
        }
    }

    fn any_catalog() -> impl Strategy<Value = Vec<Recipe>> {
        let fields = (
            "[A-Za-z ]{1,12}",
            proptest::option::of(0..240i32),
            proptest::option::of(0..120i32),
            prop::collection::btree_set(1..=10i64, 0..4),
            0..20i32,
        );
        prop::collection::vec(fields, 0..16).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (title, duration, working, label_ids, cooked))| {
                    let mut r = recipe(i as i64 + 1, &title);
                    r.duration_minutes = duration;
                    r.working_minutes = working;
                    r.cooked_count = cooked;
                    r.labels = label_ids.into_iter().map(|id| label(id, facet_of(id))).collect();
                    r
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_empty_query_is_identity(catalog in any_catalog()) {
            let out = filter_recipes(catalog.clone(), &RecipeQuery::default());
            prop_assert_eq!(ids(&out), ids(&catalog));
        }

        #[test]
        fn prop_category_ids_never_match_event_filter(
            catalog in any_catalog(),
            wanted in prop::collection::vec(1..=5i64, 1..4),
        ) {
            let query = RecipeQuery { event_labels: wanted, ..Default::default() };
            prop_assert!(filter_recipes(catalog, &query).is_empty());
        }

        #[test]
        fn prop_filtered_recipes_satisfy_every_dimension(
            catalog in any_catalog(),
            max_duration in proptest::option::of(0..240i32),
            categories in prop::collection::vec(1..=5i64, 0..3),
            events in prop::collection::vec(6..=10i64, 0..3),
        ) {
            let query = RecipeQuery {
                max_duration,
                category_labels: categories.clone(),
                event_labels: events.clone(),
                ..Default::default()
            };
            let out = filter_recipes(catalog.clone(), &query);
            for r in &out {
                if let Some(max) = max_duration {
                    prop_assert!(matches!(r.duration_minutes, Some(d) if d <= max));
                }
                prop_assert!(categories.is_empty() || r.labels.iter().any(|l| categories.contains(&l.id)));
                prop_assert!(events.is_empty() || r.labels.iter().any(|l| events.contains(&l.id)));
            }
            let kept: HashSet<i64> = out.iter().map(|r| r.id).collect();
            prop_assert_eq!(kept.len(), out.len());
        }

        #[test]
        fn prop_sort_is_ordered_permutation(catalog in any_catalog(), key in prop_oneof![
            Just(SortKey::Title),
            Just(SortKey::Duration),
            Just(SortKey::Cooked),
        ]) {
            let mut out = catalog.clone();
            sort_recipes(&mut out, key);
            let mut before = ids(&catalog);
            let mut after = ids(&out);
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
            for pair in out.windows(2) {
                let in_order = match key {
                    SortKey::Title => pair[0].title <= pair[1].title,
                    SortKey::Duration => {
                        nulls_last(pair[0].duration_minutes, pair[1].duration_minutes) != Ordering::Greater
                    }
                    SortKey::Cooked => pair[0].cooked_count <= pair[1].cooked_count,
                };
                prop_assert!(in_order);
            }
        }
    }
}
