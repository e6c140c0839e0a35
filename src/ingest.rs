//! Normalizes recipes exported in the flat `total_ingredients` shape into store records.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::warn;

use crate::error::ValidationError;
use crate::recipe::{FreshAmount, IngredientsDetailed, NewRecipe, OrderedMap};

const FRESH_TYPE: &str = "fresh_ingredient";

#[derive(Debug, Clone, Deserialize)]
pub struct RawIngredient {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawInstructions {
    Text(String),
    Steps(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRecipe {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub instructions: RawInstructions,
    pub total_ingredients: OrderedMap<RawIngredient>,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub accepted: Vec<NewRecipe>,
    pub rejected: Vec<ValidationError>,
}

fn step_marker() -> &'static Regex {
    static STEP_MARKER: OnceLock<Regex> = OnceLock::new();
    // "1、" or "1." step numbering
    STEP_MARKER.get_or_init(|| Regex::new(r"\s*\d+[、.]").expect("step marker pattern is valid"))
}

fn leading_step_marker() -> &'static Regex {
    static LEADING_STEP_MARKER: OnceLock<Regex> = OnceLock::new();
    LEADING_STEP_MARKER.get_or_init(|| Regex::new(r"^\d+[、.]").expect("step marker pattern is valid"))
}

/// A marker directly followed by a digit is a decimal ("2.5"), not a step number.
fn is_step_marker(text: &str, marker: &regex::Match<'_>) -> bool {
    !text[marker.end()..].starts_with(|c: char| c.is_ascii_digit())
}

/// Splits numbered instructions into steps. Text before the first marker is dropped.
pub fn split_steps(text: &str) -> Vec<String> {
    let mut steps = Vec::new();
    let mut step_start = None;
    for marker in step_marker().find_iter(text).filter(|m| is_step_marker(text, m)) {
        if let Some(start) = step_start {
            steps.push(text[start..marker.start()].trim().to_string());
        }
        step_start = Some(marker.end());
    }
    if let Some(start) = step_start {
        steps.push(text[start..].trim().to_string());
    }
    steps.retain(|step| !step.is_empty());
    steps
}

/// Removes a leading step number from an already separated step.
fn strip_step_number(step: &str) -> String {
    let step = step.trim();
    match leading_step_marker().find(step) {
        Some(marker) if is_step_marker(step, &marker) => step[marker.end()..].trim().to_string(),
        _ => step.to_string(),
    }
}

/// Zero counts as absent: weight wins when non-zero, then count.
fn fresh_amount(raw: &RawIngredient) -> Result<FreshAmount, String> {
    let non_zero = |v: Option<f64>| v.filter(|x| *x != 0.0);
    match (non_zero(raw.weight), non_zero(raw.count)) {
        (Some(w), _) => FreshAmount::new(Some(w), None),
        (None, Some(c)) => FreshAmount::new(None, Some(c)),
        (None, None) => Err("has neither weight nor count".to_string()),
    }
}

pub fn normalize(raw: RawRecipe) -> Result<NewRecipe, ValidationError> {
    let mut detailed = IngredientsDetailed::default();
    for (name, ingredient) in raw.total_ingredients.iter() {
        if ingredient.kind == FRESH_TYPE {
            let amount = fresh_amount(ingredient)
                .map_err(|reason| ValidationError::new(&raw.name, format!("fresh ingredient '{name}' {reason}")))?;
            detailed.fresh_ingredient.insert(name, amount);
        } else {
            detailed.condiment.insert(name, String::new());
        }
    }

    let instructions = match raw.instructions {
        RawInstructions::Text(text) => split_steps(&text),
        RawInstructions::Steps(steps) => steps.iter().map(|s| strip_step_number(s)).collect(),
    };

    let recipe = NewRecipe {
        name: raw.name,
        ingredients: raw.ingredients,
        instructions,
        ingredients_detailed: detailed,
    };
    recipe.validate()?;
    Ok(recipe)
}

/// Normalizes a batch, keeping good records and reporting the bad ones.
pub fn normalize_batch(raws: Vec<RawRecipe>) -> IngestReport {
    let mut report = IngestReport::default();
    for raw in raws {
        match normalize(raw) {
            Ok(recipe) => report.accepted.push(recipe),
            Err(e) => {
                warn!(error = %e, "skipping malformed recipe");
                report.rejected.push(e);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawRecipe {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_split_steps() {
        assert_eq!(
            split_steps("准备：1、洗菜 2、切丝 3.下锅"),
            vec!["洗菜", "切丝", "下锅"]
        );
        assert_eq!(split_steps("1. Boil water. 2. Add carrots"), vec!["Boil water.", "Add carrots"]);
        assert!(split_steps("no numbers here").is_empty());
    }

    #[test]
    fn test_strip_step_number() {
        assert_eq!(strip_step_number("1、洗菜"), "洗菜");
        assert_eq!(strip_step_number("Stir well"), "Stir well");
    }

    #[test]
    fn test_decimals_are_not_step_numbers() {
        assert_eq!(strip_step_number("1. Add 2.5 cups water"), "Add 2.5 cups water");
        assert_eq!(strip_step_number("2.5 kg flour"), "2.5 kg flour");
        assert_eq!(split_steps("1、加水2.5升 2、煮"), vec!["加水2.5升", "煮"]);
        assert_eq!(
            split_steps("1. Add 0.5 cup oil 2. Fry for 12.5 minutes"),
            vec!["Add 0.5 cup oil", "Fry for 12.5 minutes"]
        );
    }

    #[test]
    fn test_normalize_splits_fresh_and_condiments() {
        let recipe = normalize(raw(
            r#"{"name": "胡萝卜汤", "ingredients": ["胡萝卜 200克", "盐 少许"],
                "instructions": "1、切块 2、煮汤",
                "total_ingredients": {
                    "胡萝卜": {"type": "fresh_ingredient", "weight": 200, "count": 0},
                    "鸡蛋": {"type": "fresh_ingredient", "weight": 0, "count": 2},
                    "盐": {"type": "condiment"}
                }}"#,
        ))
        .unwrap();

        let fresh: Vec<(&str, &FreshAmount)> = recipe.ingredients_detailed.fresh_ingredient.iter().collect();
        assert_eq!(fresh, vec![("胡萝卜", &FreshAmount::Weight(200.0)), ("鸡蛋", &FreshAmount::Count(2.0))]);
        assert_eq!(recipe.ingredients_detailed.condiment.get("盐").map(String::as_str), Some(""));
        assert_eq!(recipe.instructions, vec!["切块", "煮汤"]);
    }

    #[test]
    fn test_batch_rejects_only_offending_record() {
        let good = raw(
            r#"{"name": "Soup", "instructions": ["1. Boil", "Serve"],
                "total_ingredients": {"carrot": {"type": "fresh_ingredient", "weight": 200}}}"#,
        );
        let bad = raw(
            r#"{"name": "Mystery", "instructions": [],
                "total_ingredients": {"thing": {"type": "fresh_ingredient", "weight": 0, "count": 0}}}"#,
        );

        let report = normalize_batch(vec![good, bad]);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].instructions, vec!["Boil", "Serve"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].recipe, "Mystery");
        assert!(report.rejected[0].reason.contains("thing"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let result = normalize(raw(
            r#"{"name": "Odd", "instructions": "",
                "total_ingredients": {"carrot": {"type": "fresh_ingredient", "weight": -10}}}"#,
        ));
        assert!(result.is_err());
    }
}
