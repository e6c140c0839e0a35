use serde::{Deserialize, Serialize};

use crate::match_registry::{Matches, UNMATCHED};
use crate::nutrition_table::{NutritionEntry, NutritionTable};
use crate::recipe::Recipe;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct NutritionTotals {
    pub calories: f64,
    pub carbs: f64,
    pub fat: f64,
    pub protein: f64,
}

impl NutritionTotals {
    fn add_scaled(&mut self, entry: &NutritionEntry, grams: f64) {
        let scale = grams / 100.0;
        macro_rules! add_scaled {
            ($target:expr; $($field:ident),*) => {
                $( $target.$field += entry.$field * scale; )*
            };
        }
        add_scaled!(self; calories, carbs, fat, protein);
    }
}

/// Why an ingredient could not be resolved. All reasons are shown the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    NotTriaged,
    MarkedUnmatched,
    /// Matched to a canonical name the current table no longer has.
    MissingFromTable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngredientStatus {
    Resolved { canonical: String },
    Unresolved(UnresolvedReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedIngredient {
    pub name: String,
    pub status: IngredientStatus,
}

impl ClassifiedIngredient {
    pub fn needs_attention(&self) -> bool {
        matches!(self.status, IngredientStatus::Unresolved(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeNutrition {
    pub totals: NutritionTotals,
    /// Fresh ingredients in recipe order.
    pub ingredients: Vec<ClassifiedIngredient>,
}

impl RecipeNutrition {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .filter(|i| i.needs_attention())
            .map(|i| i.name.as_str())
    }
}

/// Totals a recipe's fresh ingredients through the match registry. Pure.
///
/// Count-based ingredients are classified but add nothing, and condiments are
/// ignored entirely.
pub fn compute(recipe: &Recipe, registry: &Matches, table: &NutritionTable) -> RecipeNutrition {
    let mut totals = NutritionTotals::default();
    let mut ingredients = Vec::with_capacity(recipe.ingredients_detailed.fresh_ingredient.len());

    for (name, amount) in recipe.ingredients_detailed.fresh_ingredient.iter() {
        let status = match registry.get(name).map(String::as_str) {
            None => IngredientStatus::Unresolved(UnresolvedReason::NotTriaged),
            Some(UNMATCHED) => IngredientStatus::Unresolved(UnresolvedReason::MarkedUnmatched),
            Some(canonical) => match table.get(canonical) {
                Some(entry) => {
                    if let Some(grams) = amount.weight() {
                        totals.add_scaled(entry, grams);
                    }
                    IngredientStatus::Resolved { canonical: canonical.to_string() }
                }
                None => IngredientStatus::Unresolved(UnresolvedReason::MissingFromTable(canonical.to_string())),
            },
        };
        ingredients.push(ClassifiedIngredient { name: name.to_string(), status });
    }

    RecipeNutrition { totals, ingredients }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{FreshAmount, NewRecipe};
    use rand::Rng;
    use std::collections::BTreeMap;

    fn soup() -> Recipe {
        let mut recipe = NewRecipe { name: "Soup".into(), ..Default::default() };
        recipe.ingredients_detailed.fresh_ingredient.insert("carrot", FreshAmount::Weight(200.0));
        recipe.with_id("1".into())
    }

    fn carrot_table() -> NutritionTable {
        let mut entries = BTreeMap::new();
        entries.insert("Carrots, raw".to_string(), NutritionEntry::new(41.0, 10.0, 0.0, 1.0));
        NutritionTable::from_entries(entries).unwrap()
    }

    fn registry(pairs: &[(&str, &str)]) -> Matches {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_resolved_carrot() {
        let result = compute(&soup(), &registry(&[("carrot", "Carrots, raw")]), &carrot_table());
        assert_eq!(
            result.totals,
            NutritionTotals { calories: 82.0, carbs: 20.0, fat: 0.0, protein: 2.0 }
        );
        assert_eq!(
            result.ingredients,
            vec![ClassifiedIngredient {
                name: "carrot".into(),
                status: IngredientStatus::Resolved { canonical: "Carrots, raw".into() },
            }]
        );
    }

    #[test]
    fn test_empty_registry_leaves_carrot_unresolved() {
        let result = compute(&soup(), &Matches::new(), &carrot_table());
        assert_eq!(result.totals, NutritionTotals::default());
        assert_eq!(result.unresolved().collect::<Vec<_>>(), vec!["carrot"]);
        assert_eq!(result.ingredients[0].status, IngredientStatus::Unresolved(UnresolvedReason::NotTriaged));
    }

    #[test]
    fn test_sentinel_leaves_carrot_unresolved() {
        let result = compute(&soup(), &registry(&[("carrot", UNMATCHED)]), &carrot_table());
        assert_eq!(result.totals, NutritionTotals::default());
        assert_eq!(result.ingredients[0].status, IngredientStatus::Unresolved(UnresolvedReason::MarkedUnmatched));
    }

    #[test]
    fn test_match_missing_from_table_is_unresolved() {
        let result = compute(&soup(), &registry(&[("carrot", "Carrots, baby")]), &carrot_table());
        assert_eq!(result.totals, NutritionTotals::default());
        assert!(result.ingredients[0].needs_attention());
    }

    #[test]
    fn test_count_based_ingredient_is_resolved_but_adds_nothing() {
        let mut recipe = soup();
        recipe.ingredients_detailed.fresh_ingredient.insert("egg", FreshAmount::Count(2.0));
        recipe.ingredients_detailed.condiment.insert("salt", String::new());

        let mut entries = BTreeMap::new();
        entries.insert("Carrots, raw".to_string(), NutritionEntry::new(41.0, 10.0, 0.0, 1.0));
        entries.insert("Egg, whole, raw".to_string(), NutritionEntry::new(143.0, 0.7, 9.5, 12.6));
        let table = NutritionTable::from_entries(entries).unwrap();
        let matches = registry(&[("carrot", "Carrots, raw"), ("egg", "Egg, whole, raw")]);

        let result = compute(&recipe, &matches, &table);
        assert_eq!(result.totals.calories, 82.0);
        let names: Vec<&str> = result.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["carrot", "egg"]);
        assert!(result.ingredients.iter().all(|i| !i.needs_attention()));
    }

    #[test]
    fn test_compute_is_repeatable() {
        let recipe = soup();
        let matches = registry(&[("carrot", "Carrots, raw")]);
        let table = carrot_table();
        assert_eq!(compute(&recipe, &matches, &table), compute(&recipe, &matches, &table));
    }

    #[test]
    fn test_totals_never_negative_for_random_recipes() {
        let mut rng = rand::thread_rng();
        let mut entries = BTreeMap::new();
        for i in 0..20 {
            entries.insert(
                format!("item {i}"),
                NutritionEntry::new(rng.gen_range(0.0..900.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)),
            );
        }
        let table = NutritionTable::from_entries(entries).unwrap();

        for _ in 0..50 {
            let mut recipe = NewRecipe { name: "Random".into(), ..Default::default() };
            let mut matches = Matches::new();
            for j in 0..rng.gen_range(1..8) {
                let raw = format!("raw {j}");
                let amount = if rng.gen_bool(0.7) {
                    FreshAmount::Weight(rng.gen_range(0.1..1000.0))
                } else {
                    FreshAmount::Count(rng.gen_range(1.0..6.0))
                };
                recipe.ingredients_detailed.fresh_ingredient.insert(raw.clone(), amount);
                match rng.gen_range(0..3) {
                    0 => {}
                    1 => {
                        matches.insert(raw, UNMATCHED.to_string());
                    }
                    _ => {
                        matches.insert(raw, format!("item {}", rng.gen_range(0..25)));
                    }
                }
            }
            let totals = compute(&recipe.with_id("1".into()), &matches, &table).totals;
            for value in [totals.calories, totals.carbs, totals.fat, totals.protein] {
                assert!(value >= 0.0);
            }
        }
    }
}
