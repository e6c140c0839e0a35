use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const RECIPES_PATH_VAR: &str = "RECIPES_PATH";
pub const NUTRITION_PATH_VAR: &str = "NUTRITION_PATH";
pub const MATCHES_PATH_VAR: &str = "MATCHES_PATH";
pub const GLOSSARY_PATH_VAR: &str = "GLOSSARY_PATH";
pub const TRANSLATION_LANGUAGE_VAR: &str = "TRANSLATION_LANGUAGE";
pub const TRANSLATION_TIMEOUT_VAR: &str = "TRANSLATION_TIMEOUT_SECS";
pub const TRANSLATION_MODEL_VAR: &str = "TRANSLATION_MODEL";
/// Name of the variable that holds the OpenRouter key.
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

const DEFAULT_RECIPES_PATH: &str = "recipes_normed.json";
const DEFAULT_NUTRITION_PATH: &str = "fdc_survey_nutrition.json";
const DEFAULT_MATCHES_PATH: &str = "ingredient_matches.json";
const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_MODEL: &str = "qwen/qwen3-32b";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub recipes_path: PathBuf,
    pub nutrition_path: PathBuf,
    pub matches_path: PathBuf,
    pub glossary_path: Option<PathBuf>,
    pub translation_language: String,
    pub translation_timeout: Duration,
    pub translation_model: String,
    pub api_key_env_var: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recipes_path: PathBuf::from(DEFAULT_RECIPES_PATH),
            nutrition_path: PathBuf::from(DEFAULT_NUTRITION_PATH),
            matches_path: PathBuf::from(DEFAULT_MATCHES_PATH),
            glossary_path: None,
            translation_language: DEFAULT_LANGUAGE.to_string(),
            translation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            translation_model: DEFAULT_MODEL.to_string(),
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the environment (and a `.env` file if present).
    pub fn from_env() -> Self {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            recipes_path: get(RECIPES_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.recipes_path),
            nutrition_path: get(NUTRITION_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.nutrition_path),
            matches_path: get(MATCHES_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.matches_path),
            glossary_path: get(GLOSSARY_PATH_VAR).map(PathBuf::from),
            translation_language: get(TRANSLATION_LANGUAGE_VAR).unwrap_or(defaults.translation_language),
            translation_timeout: get(TRANSLATION_TIMEOUT_VAR)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.translation_timeout),
            translation_model: get(TRANSLATION_MODEL_VAR).unwrap_or(defaults.translation_model),
            api_key_env_var: defaults.api_key_env_var,
        }
    }
}
