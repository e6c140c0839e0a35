use crate::recipe::Recipe;

/// Recipes whose name or any flat ingredient line contains `query`, ignoring
/// case. A blank query returns everything in store order.
pub fn search<'a>(query: &str, recipes: &'a [Recipe]) -> Vec<&'a Recipe> {
    if query.trim().is_empty() {
        return recipes.iter().collect();
    }
    let needle = query.to_lowercase();
    recipes
        .iter()
        .filter(|recipe| {
            recipe.name.to_lowercase().contains(&needle)
                || recipe
                    .ingredients
                    .iter()
                    .any(|line| line.to_lowercase().contains(&needle))
        })
        .collect()
}
