use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;

/// Failures reading or writing one of the persisted resources.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("required file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid JSON for this resource: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is not a valid nutrition CSV: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid entry '{name}' in {}: {reason}", path.display())]
    InvalidEntry {
        path: PathBuf,
        name: String,
        reason: String,
    },

    #[error("refusing to save match registry: it would drop saved keys {keys:?}")]
    KeysDropped { keys: Vec<String> },
}

/// A nutrition table item with a negative or non-finite value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("nutrition entry '{name}' rejected: {reason}")]
pub struct InvalidNutrientEntry {
    pub name: String,
    pub reason: String,
}

/// A recipe record that breaks the fresh-ingredient weight/count rule.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("recipe '{recipe}' rejected: {reason}")]
pub struct ValidationError {
    pub recipe: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(recipe: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
            reason: reason.into(),
        }
    }
}

/// The translation collaborator could not produce a gloss. Never fatal.
#[derive(Error, Debug)]
pub enum TranslationUnavailable {
    #[error("translation is disabled")]
    Disabled,

    #[error("no translation known for '{0}'")]
    NoEntry(String),

    #[error("translation returned an empty answer")]
    EmptyResponse,

    #[error("translation timed out after {0:?}")]
    TimedOut(Duration),

    #[error("translation service failed: {0}")]
    Service(#[from] ApiConnectionError),
}
