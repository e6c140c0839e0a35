use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Recipe catalog with human-confirmed ingredient nutrition matching", long_about = None)]
pub struct Cli {
    /// Recipe store file (overrides RECIPES_PATH)
    #[arg(long, global = true)]
    pub recipes: Option<PathBuf>,

    /// Nutrition table, JSON or CSV (overrides NUTRITION_PATH)
    #[arg(long, global = true)]
    pub nutrition: Option<PathBuf>,

    /// Ingredient match registry file (overrides MATCHES_PATH)
    #[arg(long, global = true)]
    pub matches: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show recipes with their nutrition, optionally filtered
    List {
        /// Matches recipe names and ingredient lines, case-insensitively
        #[arg(short, long, default_value = "")]
        query: String,
        /// Disable color highlighting of unmatched ingredients
        #[arg(long)]
        no_color: bool,
    },
    /// Add a recipe to the store
    Add {
        #[arg(long)]
        name: String,
        /// Comma separated ingredient lines
        #[arg(long, default_value = "")]
        ingredients: String,
        /// One instruction step, repeatable
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Fresh ingredient by mass, as NAME=GRAMS (repeatable)
        #[arg(long = "weight", value_parser = parse_quantity)]
        weights: Vec<(String, f64)>,
        /// Fresh ingredient by count, as NAME=N (repeatable)
        #[arg(long = "count", value_parser = parse_quantity)]
        counts: Vec<(String, f64)>,
        /// Unquantified condiment (repeatable)
        #[arg(long = "condiment")]
        condiments: Vec<String>,
    },
    /// Interactively match unmatched ingredients to nutrition entries
    Match,
    /// List ingredients that have not been matched yet
    Unmatched,
    /// Import raw recipes in the `total_ingredients` format
    Import {
        file: PathBuf,
    },
    /// Write a CSV nutrition report for every recipe
    Report {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parses `NAME=NUMBER`. The name may itself contain `=`; the last one splits.
pub fn parse_quantity(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=NUMBER, got '{arg}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing ingredient name in '{arg}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

impl Cli {
    /// Environment configuration with any path flags applied on top.
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        if let Some(path) = &self.recipes {
            config.recipes_path = path.clone();
        }
        if let Some(path) = &self.nutrition {
            config.nutrition_path = path.clone();
        }
        if let Some(path) = &self.matches {
            config.matches_path = path.clone();
        }
        config
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
