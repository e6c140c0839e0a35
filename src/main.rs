use anyhow::{bail, Context, Result};
use dialoguer::{Input, Select};
use std::io::IsTerminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recipe_nutrition::cli::{parse_args, Command};
use recipe_nutrition::config::AppConfig;
use recipe_nutrition::display::render_recipe;
use recipe_nutrition::ingest::{normalize_batch, RawRecipe};
use recipe_nutrition::matching::{selection_options, unique_fresh_ingredients, unmatched_ingredients, MatchStep};
use recipe_nutrition::recipe::{FreshAmount, NewRecipe};
use recipe_nutrition::recipe_book::RecipeBook;
use recipe_nutrition::report::write_nutrition_report;
use recipe_nutrition::search::search;
use recipe_nutrition::storage::read_json;
use recipe_nutrition::translation::{DisabledTranslator, GlossaryTranslator, OpenRouterTranslator, Translator};

const SEARCH_AGAIN: &str = "↩ search again";

fn build_translator(config: &AppConfig) -> Result<Box<dyn Translator>> {
    if let Some(path) = &config.glossary_path {
        let glossary = GlossaryTranslator::load(path)
            .with_context(|| format!("Failed to load glossary from '{}'", path.display()))?;
        info!(path = %path.display(), "using glossary translator");
        return Ok(Box::new(glossary));
    }
    if std::env::var(&config.api_key_env_var).is_ok() {
        return Ok(Box::new(OpenRouterTranslator::new(&config.api_key_env_var, &config.translation_model)));
    }
    warn!(
        "{} is not set and no glossary configured; matching will search with raw names",
        config.api_key_env_var
    );
    Ok(Box::new(DisabledTranslator))
}

fn list_recipes(book: &mut RecipeBook, query: &str, color: bool) -> Result<()> {
    let recipes = book.store.load().context("Failed to load recipes")?;
    let found = search(query, &recipes);
    if found.is_empty() {
        println!("No recipes match '{}'.", query);
        return Ok(());
    }
    for recipe in found {
        let nutrition = book
            .nutrition_for(recipe)
            .with_context(|| format!("Cannot compute nutrition for '{}'", recipe.name))?;
        println!("{}", render_recipe(recipe, &nutrition, color));
    }
    Ok(())
}

fn add_recipe(
    book: &RecipeBook,
    name: String,
    ingredients: String,
    steps: Vec<String>,
    weights: Vec<(String, f64)>,
    counts: Vec<(String, f64)>,
    condiments: Vec<String>,
) -> Result<()> {
    let mut recipe = NewRecipe {
        name,
        ingredients: ingredients
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        instructions: steps,
        ..Default::default()
    };
    let fresh = &mut recipe.ingredients_detailed.fresh_ingredient;
    for (ingredient, grams) in weights {
        if fresh.contains_key(&ingredient) {
            bail!("'{}' is listed more than once", ingredient);
        }
        let amount = FreshAmount::new(Some(grams), None).map_err(|e| anyhow::anyhow!("'{}' {}", ingredient, e))?;
        fresh.insert(ingredient, amount);
    }
    for (ingredient, count) in counts {
        if fresh.contains_key(&ingredient) {
            bail!("'{}' has both a weight and a count", ingredient);
        }
        let amount = FreshAmount::new(None, Some(count)).map_err(|e| anyhow::anyhow!("'{}' {}", ingredient, e))?;
        fresh.insert(ingredient, amount);
    }
    for condiment in condiments {
        recipe.ingredients_detailed.condiment.insert(condiment, String::new());
    }
    recipe.validate()?;

    let added = book.store.append(recipe).context("Failed to save recipe")?;
    println!("Recipe added successfully! (id {})", added.id);
    Ok(())
}

async fn match_ingredients(book: &mut RecipeBook, config: &AppConfig) -> Result<()> {
    let translator = build_translator(config)?;
    let mut workflow = book
        .workflow(translator.as_ref())
        .context("Nutrition table is required for matching")?
        .with_translation(&config.translation_language, config.translation_timeout);

    loop {
        let pending = match workflow.next_step().await? {
            MatchStep::FullyMatched => {
                println!("All ingredients are matched!");
                return Ok(());
            }
            MatchStep::Pending(pending) => pending,
        };

        println!("\nUnmatched ingredients remaining: {}", pending.remaining);
        let gloss = pending.gloss.as_deref().unwrap_or("no translation");
        let mut search_text = pending.default_search.clone();

        let selection = loop {
            search_text = Input::new()
                .with_prompt(format!("Search for {} ({}), comma separates terms", pending.candidate, gloss))
                .with_initial_text(search_text.clone())
                .allow_empty(true)
                .interact_text()
                .context("Failed to read search terms")?;

            let candidates = workflow.search(&search_text);
            let mut options = selection_options(&candidates);
            options.push(SEARCH_AGAIN.to_string());
            println!("{} candidates", candidates.len());

            let choice = Select::new()
                .with_prompt(format!("Choose the match for {}", pending.candidate))
                .items(&options)
                .default(0)
                .interact_opt()
                .context("Failed to read selection")?;

            match choice {
                None => {
                    println!("Stopped; progress so far is saved.");
                    return Ok(());
                }
                Some(idx) if options[idx] == SEARCH_AGAIN => continue,
                Some(idx) => break options[idx].clone(),
            }
        };

        workflow.confirm(&pending.candidate, &selection)?;
        println!("Saved: {} -> {}", pending.candidate, selection);
    }
}

fn list_unmatched(book: &mut RecipeBook) -> Result<()> {
    let recipes = book.store.load().context("Failed to load recipes")?;
    let registry = book.registry.get_or_init().context("Failed to load ingredient matches")?;
    let unmatched = unmatched_ingredients(&unique_fresh_ingredients(&recipes), registry);
    if unmatched.is_empty() {
        println!("All ingredients are matched!");
    } else {
        println!("{} unmatched ingredients:", unmatched.len());
        for name in unmatched {
            println!("  {}", name);
        }
    }
    Ok(())
}

fn import_recipes(book: &RecipeBook, file: &std::path::Path) -> Result<()> {
    let raws: Vec<RawRecipe> =
        read_json(file).with_context(|| format!("Failed to read raw recipes from '{}'", file.display()))?;
    let report = normalize_batch(raws);
    for rejected in &report.rejected {
        println!("Rejected: {}", rejected);
    }
    if report.accepted.is_empty() {
        println!("Nothing to import.");
        return Ok(());
    }
    let added = book.store.extend(report.accepted).context("Failed to save imported recipes")?;
    println!("Imported {} recipes ({} rejected).", added.len(), report.rejected.len());
    Ok(())
}

fn write_report(book: &mut RecipeBook, output: Option<&std::path::Path>) -> Result<()> {
    let rows = book.nutrition_for_all().context("Cannot build nutrition report")?;
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create report file '{}'", path.display()))?;
            write_nutrition_report(file, &rows)?;
            println!("Report written to {}", path.display());
        }
        None => write_nutrition_report(std::io::stdout().lock(), &rows)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = cli.config();
    let mut book = RecipeBook::from_config(&config);

    match cli.command {
        Command::List { query, no_color } => {
            let color = !no_color && std::io::stdout().is_terminal();
            list_recipes(&mut book, &query, color)
        }
        Command::Add { name, ingredients, steps, weights, counts, condiments } => {
            add_recipe(&book, name, ingredients, steps, weights, counts, condiments)
        }
        Command::Match => match_ingredients(&mut book, &config).await,
        Command::Unmatched => list_unmatched(&mut book),
        Command::Import { file } => import_recipes(&book, &file),
        Command::Report { output } => write_report(&mut book, output.as_deref()),
    }
}
