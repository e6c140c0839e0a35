//! Best-effort glossing of raw ingredient names into the nutrition table's language.
//!
//! A translation is only ever a suggestion for the operator's search box; every
//! failure degrades to searching with the raw name.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider};
use crate::error::{StorageError, TranslationUnavailable};
use crate::storage::read_json;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationUnavailable>;
}

/// Asks an OpenRouter chat model for a short food-database style gloss.
pub struct OpenRouterTranslator {
    provider: Provider,
    model: String,
}

impl OpenRouterTranslator {
    pub fn new(api_key_env_var: &str, model: &str) -> Self {
        Self {
            provider: Provider::openrouter(api_key_env_var),
            model: model.to_string(),
        }
    }

    pub fn with_provider(provider: Provider, model: &str) -> Self {
        Self { provider, model: model.to_string() }
    }

    fn build_request(&self, text: &str, target_language: &str) -> ChatCompletionRequest {
        let system_prompt = format!(
            "/no_thinking
You translate ingredient names for searching a food composition database.
Translate the user's ingredient name into {target_language}.
Answer with the plain name only: no quotes, no explanation, no punctuation at the end."
        );
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(text)],
            temperature: Some(0.0),
            max_tokens: Some(30),
        }
    }
}

#[async_trait]
impl Translator for OpenRouterTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationUnavailable> {
        let request = self.build_request(text, target_language);
        let response = self.provider.call_chat_completion(&request).await?;
        let gloss = response
            .first_content()
            .map(|content| content.trim_matches(|c: char| c == '"' || c == '\'' || c == '.').trim().to_string())
            .unwrap_or_default();
        if gloss.is_empty() {
            return Err(TranslationUnavailable::EmptyResponse);
        }
        Ok(gloss)
    }
}

/// Fixed lookup table, e.g. a hand-maintained glossary file.
#[derive(Debug, Clone, Default)]
pub struct GlossaryTranslator {
    entries: HashMap<String, String>,
}

impl GlossaryTranslator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Reads a JSON object of raw name -> gloss.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(read_json(path)?))
    }
}

#[async_trait]
impl Translator for GlossaryTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String, TranslationUnavailable> {
        self.entries
            .get(text.trim())
            .filter(|gloss| !gloss.trim().is_empty())
            .cloned()
            .ok_or_else(|| TranslationUnavailable::NoEntry(text.to_string()))
    }
}

pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(&self, _text: &str, _target_language: &str) -> Result<String, TranslationUnavailable> {
        Err(TranslationUnavailable::Disabled)
    }
}

/// Runs the translator under `timeout`. Any failure is logged and yields `None`.
/// Blank input is never sent.
pub async fn gloss(
    translator: &dyn Translator,
    text: &str,
    target_language: &str,
    timeout: Duration,
) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let outcome = match tokio::time::timeout(timeout, translator.translate(text, target_language)).await {
        Ok(result) => result,
        Err(_) => Err(TranslationUnavailable::TimedOut(timeout)),
    };
    match outcome {
        Ok(translated) if !translated.trim().is_empty() => {
            debug!(%text, %translated, "translated ingredient name");
            Some(translated.trim().to_string())
        }
        Ok(_) => {
            warn!(%text, "translation came back blank, using raw name");
            None
        }
        Err(e) => {
            warn!(%text, error = %e, "translation unavailable, using raw name");
            None
        }
    }
}
