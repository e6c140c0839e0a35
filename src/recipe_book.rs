use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::StorageError;
use crate::match_registry::MatchRegistry;
use crate::matching::MatchWorkflow;
use crate::nutrition_aggregator::{compute, RecipeNutrition};
use crate::nutrition_table::NutritionTable;
use crate::recipe::Recipe;
use crate::recipe_store::RecipeStore;
use crate::translation::Translator;

/// The three persisted resources wired together for one operator session.
#[derive(Debug)]
pub struct RecipeBook {
    pub store: RecipeStore,
    pub registry: MatchRegistry,
    nutrition_path: PathBuf,
    table: Option<NutritionTable>,
}

impl RecipeBook {
    pub fn new(store: RecipeStore, registry: MatchRegistry, nutrition_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            registry,
            nutrition_path: nutrition_path.into(),
            table: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            RecipeStore::new(&config.recipes_path),
            MatchRegistry::new(&config.matches_path),
            &config.nutrition_path,
        )
    }

    /// The nutrition table, loaded on first use and kept for the session.
    pub fn table(&mut self) -> Result<&NutritionTable, StorageError> {
        if self.table.is_none() {
            self.table = Some(NutritionTable::load(&self.nutrition_path)?);
        }
        Ok(self.table.get_or_insert_with(NutritionTable::default))
    }

    /// Nutrition for one recipe. Fails instead of reporting zero totals when the
    /// table or registry cannot be read.
    pub fn nutrition_for(&mut self, recipe: &Recipe) -> Result<RecipeNutrition, StorageError> {
        self.table()?;
        let registry = self.registry.get_or_init()?;
        let table = self.table.as_ref().ok_or_else(|| StorageError::NotFound {
            path: self.nutrition_path.clone(),
        })?;
        Ok(compute(recipe, registry, table))
    }

    /// Nutrition for every recipe in store order.
    pub fn nutrition_for_all(&mut self) -> Result<Vec<(Recipe, RecipeNutrition)>, StorageError> {
        let recipes = self.store.load()?;
        recipes
            .into_iter()
            .map(|recipe| {
                let nutrition = self.nutrition_for(&recipe)?;
                Ok((recipe, nutrition))
            })
            .collect()
    }

    /// A matching workflow over this session's store, table and registry.
    pub fn workflow<'a>(&'a mut self, translator: &'a dyn Translator) -> Result<MatchWorkflow<'a>, StorageError> {
        self.table()?;
        let table = self.table.as_ref().ok_or_else(|| StorageError::NotFound {
            path: self.nutrition_path.clone(),
        })?;
        Ok(MatchWorkflow::new(&self.store, table, &mut self.registry, translator))
    }
}
