use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StorageError;
use crate::recipe::{NewRecipe, Recipe};
use crate::storage::{read_json, write_json_atomic};

/// File-backed list of recipes. Every call re-reads the file; there is no
/// cached state, so two stores on the same path must not write concurrently.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    path: PathBuf,
}

impl RecipeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every recipe. A single malformed record fails the whole load; the
    /// error names that record so it can be fixed by hand.
    pub fn load(&self) -> Result<Vec<Recipe>, StorageError> {
        match read_json(&self.path) {
            Err(StorageError::Corrupt { path, source }) => {
                Err(self.find_bad_record().unwrap_or(StorageError::Corrupt { path, source }))
            }
            other => other,
        }
    }

    /// Re-reads the file record by record to report which recipe is malformed.
    fn find_bad_record(&self) -> Option<StorageError> {
        let records: Vec<serde_json::Value> = read_json(&self.path).ok()?;
        records.into_iter().enumerate().find_map(|(index, record)| {
            let label = record_label(index, &record);
            serde_json::from_value::<Recipe>(record).err().map(|e| StorageError::InvalidEntry {
                path: self.path.clone(),
                name: label,
                reason: e.to_string(),
            })
        })
    }

    /// Replaces the whole file.
    pub fn save(&self, recipes: &[Recipe]) -> Result<(), StorageError> {
        write_json_atomic(&self.path, recipes)
    }

    /// Appends one recipe with id `len + 1`.
    ///
    /// Ids come from the current length, so they would collide with survivors if
    /// recipes were ever deleted.
    pub fn append(&self, new_recipe: NewRecipe) -> Result<Recipe, StorageError> {
        let mut added = self.extend(vec![new_recipe])?;
        Ok(added.remove(0))
    }

    /// Appends several recipes with sequential ids in a single write.
    pub fn extend(&self, new_recipes: Vec<NewRecipe>) -> Result<Vec<Recipe>, StorageError> {
        let mut recipes = self.load()?;
        let mut added = Vec::with_capacity(new_recipes.len());
        for new_recipe in new_recipes {
            let recipe = new_recipe.with_id((recipes.len() + 1).to_string());
            recipes.push(recipe.clone());
            added.push(recipe);
        }
        self.save(&recipes)?;
        info!(path = %self.path.display(), added = added.len(), total = recipes.len(), "recipes appended");
        Ok(added)
    }
}

fn record_label(index: usize, record: &serde_json::Value) -> String {
    let field = |key: &str| match record.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "?".to_string(),
    };
    format!("recipe #{} (id {}, name {})", index + 1, field("id"), field("name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::FreshAmount;
    use tempfile::tempdir;

    fn store_with(content: &str) -> (tempfile::TempDir, RecipeStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recipes_normed.json");
        std::fs::write(&path, content).unwrap();
        (dir, RecipeStore::new(path))
    }

    #[test]
    fn test_missing_store_is_not_empty() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path().join("recipes.json"));
        assert!(matches!(store.load(), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_store_is_reported() {
        let (_dir, store) = store_with(r#"[{"id": "1", "name": "Soup""#);
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_bad_record_is_named_in_error() {
        let (_dir, store) = store_with(
            r#"[{"id": "1", "name": "Soup", "ingredients_detailed": {"fresh_ingredient": {"carrot": {"weight": 200}}}},
                {"id": "2", "name": "Salad", "ingredients_detailed": {"fresh_ingredient": {"lettuce": {"weight": 0}}}}]"#,
        );
        match store.load() {
            Err(StorageError::InvalidEntry { name, reason, .. }) => {
                assert_eq!(name, "recipe #2 (id 2, name Salad)");
                assert!(reason.contains("non-positive quantity"));
            }
            other => panic!("expected the Salad record to be reported, got {other:?}"),
        }
    }

    #[test]
    fn test_append_assigns_sequential_ids() {
        let (_dir, store) = store_with("[]");
        let mut soup = NewRecipe { name: "Soup".into(), ..Default::default() };
        soup.ingredients_detailed.fresh_ingredient.insert("carrot", FreshAmount::Weight(200.0));

        let first = store.append(soup.clone()).unwrap();
        let second = store.append(NewRecipe { name: "Salad".into(), ..Default::default() }).unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], first);
        assert_eq!(loaded[1].name, "Salad");
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_dir, store) = store_with(
            r#"[{"id": "1", "name": "凉拌黄瓜", "ingredients": ["黄瓜 1根"], "instructions": ["拍黄瓜", "拌匀"],
                "ingredients_detailed": {"fresh_ingredient": {"黄瓜": {"weight": 250.5}},
                                         "condiment": {"醋": "", "蒜": ""}}}]"#,
        );
        let first = store.load().unwrap();
        store.save(&first).unwrap();
        let bytes_once = std::fs::read(store.path()).unwrap();
        let second = store.load().unwrap();
        assert_eq!(first, second);
        store.save(&second).unwrap();
        assert_eq!(bytes_once, std::fs::read(store.path()).unwrap());
    }
}
