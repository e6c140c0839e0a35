use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::nutrition_aggregator::RecipeNutrition;
use crate::recipe::Recipe;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    id: &'a str,
    name: &'a str,
    calories: f64,
    carbs: f64,
    fat: f64,
    protein: f64,
    /// Names needing attention, separated by `;`.
    unresolved: String,
}

/// Writes one CSV row of totals per recipe.
pub fn write_nutrition_report<W: Write>(writer: W, rows: &[(Recipe, RecipeNutrition)]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (recipe, nutrition) in rows {
        csv_writer
            .serialize(ReportRow {
                id: &recipe.id,
                name: &recipe.name,
                calories: nutrition.totals.calories,
                carbs: nutrition.totals.carbs,
                fat: nutrition.totals.fat,
                protein: nutrition.totals.protein,
                unresolved: nutrition.unresolved().collect::<Vec<_>>().join(";"),
            })
            .with_context(|| format!("Failed to write report row for recipe '{}'", recipe.id))?;
    }
    csv_writer.flush().context("Failed to flush nutrition report")?;
    Ok(())
}
