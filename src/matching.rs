use std::collections::BTreeSet;
use std::time::Duration;
use tracing::info;

use crate::error::StorageError;
use crate::match_registry::{MatchRegistry, Matches, UNMATCHED};
use crate::nutrition_table::NutritionTable;
use crate::recipe::Recipe;
use crate::recipe_store::RecipeStore;
use crate::translation::{gloss, Translator};

/// Every fresh ingredient name used by any recipe, in sorted order.
pub fn unique_fresh_ingredients(recipes: &[Recipe]) -> BTreeSet<String> {
    recipes
        .iter()
        .flat_map(|recipe| recipe.ingredients_detailed.fresh_ingredient.keys())
        .map(str::to_string)
        .collect()
}

/// Names not yet triaged, in the same stable order as the input set.
pub fn unmatched_ingredients(unique: &BTreeSet<String>, registry: &Matches) -> Vec<String> {
    unique
        .iter()
        .filter(|name| !registry.contains_key(name.as_str()))
        .cloned()
        .collect()
}

/// Splits operator input on commas, trimming pieces and dropping empty ones.
pub fn parse_search_terms(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical names containing every term (case-insensitive), alphabetically.
/// No terms means no filtering.
pub fn filter_candidates(table: &NutritionTable, terms: &[String]) -> Vec<String> {
    let lowered: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    let mut candidates: Vec<String> = table
        .names()
        .filter(|name| {
            let name = name.to_lowercase();
            lowered.iter().all(|term| name.contains(term.as_str()))
        })
        .map(str::to_string)
        .collect();
    candidates.sort();
    candidates
}

/// What the operator may pick from: the filtered names, then the sentinel.
pub fn selection_options(candidates: &[String]) -> Vec<String> {
    let mut options = candidates.to_vec();
    options.push(UNMATCHED.to_string());
    options
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMatch {
    pub candidate: String,
    /// Untriaged names including `candidate`.
    pub remaining: usize,
    pub gloss: Option<String>,
    /// Prefilled search box text: the gloss, or the raw name without one.
    pub default_search: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchStep {
    FullyMatched,
    Pending(PendingMatch),
}

/// Errors from confirming a match.
#[derive(thiserror::Error, Debug)]
pub enum ConfirmError {
    #[error("'{0}' is not a canonical name in the nutrition table")]
    UnknownSelection(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Drives the human-in-the-loop matching of raw ingredient names.
pub struct MatchWorkflow<'a> {
    store: &'a RecipeStore,
    table: &'a NutritionTable,
    registry: &'a mut MatchRegistry,
    translator: &'a dyn Translator,
    target_language: String,
    translation_timeout: Duration,
}

impl<'a> MatchWorkflow<'a> {
    pub fn new(
        store: &'a RecipeStore,
        table: &'a NutritionTable,
        registry: &'a mut MatchRegistry,
        translator: &'a dyn Translator,
    ) -> Self {
        Self {
            store,
            table,
            registry,
            translator,
            target_language: "English".to_string(),
            translation_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_translation(mut self, target_language: &str, timeout: Duration) -> Self {
        self.target_language = target_language.to_string();
        self.translation_timeout = timeout;
        self
    }

    /// Untriaged names, re-reading the recipe store.
    pub fn unmatched(&mut self) -> Result<Vec<String>, StorageError> {
        let recipes = self.store.load()?;
        let unique = unique_fresh_ingredients(&recipes);
        Ok(unmatched_ingredients(&unique, self.registry.get_or_init()?))
    }

    /// Picks the next untriaged ingredient and glosses it.
    pub async fn next_step(&mut self) -> Result<MatchStep, StorageError> {
        let unmatched = self.unmatched()?;
        let Some(candidate) = unmatched.first().cloned() else {
            info!("all ingredients are matched");
            return Ok(MatchStep::FullyMatched);
        };

        let gloss = gloss(self.translator, &candidate, &self.target_language, self.translation_timeout).await;
        let default_search = gloss.clone().unwrap_or_else(|| candidate.trim().to_string());
        Ok(MatchStep::Pending(PendingMatch {
            candidate,
            remaining: unmatched.len(),
            gloss,
            default_search,
        }))
    }

    pub fn search(&self, input: &str) -> Vec<String> {
        filter_candidates(self.table, &parse_search_terms(input))
    }

    /// Saves the operator's choice for `candidate`. Only table names and the
    /// sentinel are accepted.
    pub fn confirm(&mut self, candidate: &str, selection: &str) -> Result<(), ConfirmError> {
        if selection != UNMATCHED && !self.table.contains(selection) {
            return Err(ConfirmError::UnknownSelection(selection.to_string()));
        }
        self.registry.record(candidate, selection)?;
        info!(%candidate, %selection, "ingredient match saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition_table::NutritionEntry;
    use std::collections::BTreeMap;

    fn table(names: &[&str]) -> NutritionTable {
        let entries: BTreeMap<String, NutritionEntry> = names
            .iter()
            .map(|n| (n.to_string(), NutritionEntry::new(100.0, 1.0, 1.0, 1.0)))
            .collect();
        NutritionTable::from_entries(entries).unwrap()
    }

    fn chicken_table() -> NutritionTable {
        table(&[
            "Chicken breast, roasted",
            "Chicken thigh, raw",
            "Turkey breast, sliced",
            "CHICKEN BREAST TENDERS, breaded",
            "Beef, ground",
        ])
    }

    #[test]
    fn test_parse_search_terms() {
        assert_eq!(parse_search_terms(" chicken , breast,, "), vec!["chicken", "breast"]);
        assert!(parse_search_terms("").is_empty());
        assert!(parse_search_terms(" , ").is_empty());
    }

    #[test]
    fn test_filter_is_an_intersection() {
        let table = chicken_table();
        let terms = parse_search_terms("chicken, breast");
        let filtered = filter_candidates(&table, &terms);

        let with_chicken = filter_candidates(&table, &["chicken".to_string()]);
        let with_breast = filter_candidates(&table, &["breast".to_string()]);
        let intersection: Vec<String> = with_chicken.into_iter().filter(|n| with_breast.contains(n)).collect();

        assert_eq!(filtered, intersection);
        assert_eq!(filtered, vec!["CHICKEN BREAST TENDERS, breaded", "Chicken breast, roasted"]);
    }

    #[test]
    fn test_no_terms_returns_all_names() {
        let table = chicken_table();
        let all = filter_candidates(&table, &[]);
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_options_always_offer_sentinel() {
        let table = chicken_table();
        let none = filter_candidates(&table, &["tofu".to_string()]);
        assert!(none.is_empty());
        assert_eq!(selection_options(&none), vec![UNMATCHED.to_string()]);
        let some = selection_options(&["Beef, ground".to_string()]);
        assert_eq!(some.last().map(String::as_str), Some(UNMATCHED));
    }

    #[test]
    fn test_unmatched_is_stable_and_respects_sentinel() {
        let unique: BTreeSet<String> = ["葱", "胡萝卜", "鸡蛋"].iter().map(|s| s.to_string()).collect();
        let mut registry = Matches::new();
        registry.insert("鸡蛋".into(), UNMATCHED.into());
        let first = unmatched_ingredients(&unique, &registry);
        assert_eq!(first, unmatched_ingredients(&unique, &registry));
        assert_eq!(first.len(), 2);
        assert!(!first.contains(&"鸡蛋".to_string()));
    }
}
