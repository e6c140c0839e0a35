//! Plain-text rendering of recipes for the terminal.

use crate::nutrition_aggregator::{ClassifiedIngredient, NutritionTotals, RecipeNutrition};
use crate::recipe::Recipe;

const ATTENTION_START: &str = "\x1b[31m";
const ATTENTION_END: &str = "\x1b[0m";

/// Fresh ingredient names joined by ", ", unresolved ones wrapped in red.
pub fn render_ingredients(ingredients: &[ClassifiedIngredient], color: bool) -> String {
    ingredients
        .iter()
        .map(|ingredient| match (ingredient.needs_attention(), color) {
            (false, _) => ingredient.name.clone(),
            (true, true) => format!("{ATTENTION_START}{}{ATTENTION_END}", ingredient.name),
            (true, false) => format!("!{}", ingredient.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_totals(totals: &NutritionTotals) -> String {
    format!(
        "{:.1} kcal | carbs {:.1} g | fat {:.1} g | protein {:.1} g",
        totals.calories, totals.carbs, totals.fat, totals.protein
    )
}

pub fn render_steps(instructions: &[String]) -> String {
    instructions
        .iter()
        .enumerate()
        .map(|(idx, step)| format!("{}. {}", idx + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_recipe(recipe: &Recipe, nutrition: &RecipeNutrition, color: bool) -> String {
    let mut out = format!("[{}] {}\n", recipe.id, recipe.name);
    out.push_str(&format!("  Main ingredients: {}\n", render_ingredients(&nutrition.ingredients, color)));
    out.push_str(&format!("  {}\n", render_totals(&nutrition.totals)));
    if !recipe.ingredients.is_empty() {
        out.push_str(&format!("  Ingredients: {}\n", recipe.ingredients.join(", ")));
    }
    if !recipe.instructions.is_empty() {
        for line in render_steps(&recipe.instructions).lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}
