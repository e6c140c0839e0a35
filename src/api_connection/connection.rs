use dotenv::dotenv;
use reqwest::Client;
use std::env;
use thiserror::Error;
use tracing::debug;

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider, OPENROUTER_CHAT_URL};

#[derive(Error, Debug)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::OpenRouter {
            api_key_env_var: api_key_env_var_name.to_string(),
            endpoint: OPENROUTER_CHAT_URL.to_string(),
        }
    }

    /// Same provider pointed at another OpenAI-compatible endpoint.
    pub fn with_endpoint(self, url: &str) -> Self {
        match self {
            Provider::OpenRouter { api_key_env_var, .. } => Provider::OpenRouter {
                api_key_env_var,
                endpoint: url.to_string(),
            },
        }
    }

    pub async fn call_chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter { api_key_env_var, endpoint } => {
                dotenv().ok();
                let api_key = env::var(api_key_env_var)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var.clone()))?;

                let app_name = env::var("APP_NAME").unwrap_or_else(|_| "RecipeNutrition".to_string());
                debug!(model = %request.model, %endpoint, "sending chat completion");

                let response = Client::new()
                    .post(endpoint)
                    .bearer_auth(api_key)
                    .header("X-Title", app_name)
                    .json(request)
                    .send()
                    .await?;

                if response.status().is_success() {
                    Ok(response.json::<ChatCompletionResponse>().await?)
                } else {
                    let status = response.status();
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    Err(ApiConnectionError::ApiError { status, error_body })
                }
            }
        }
    }
}
