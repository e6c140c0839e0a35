use serde::{Deserialize, Serialize};

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Clone, Debug)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, not the key itself.
        api_key_env_var: String,
        endpoint: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, trimmed and with any markdown fence removed.
    pub fn first_content(&self) -> Option<String> {
        let choice = self.choices.first()?;
        let mut content = choice.message.content.trim().to_string();
        if content.starts_with("```") && content.ends_with("```") && content.len() >= 6 {
            content = content
                .trim_start_matches("```json")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
                .to_string();
        }
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(content: &str) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: None,
            model: "test".to_string(),
            choices: vec![ChatCompletionChoice {
                message: ChatCompletionResponseMessage {
                    role: "assistant".to_string(),
                    content: content.to_string(),
                },
                finish_reason: None,
            }],
        }
    }

    #[test]
    fn test_first_content_strips_fences() {
        assert_eq!(response_with("  carrot \n").first_content().as_deref(), Some("carrot"));
        assert_eq!(response_with("```\ncarrot\n```").first_content().as_deref(), Some("carrot"));
        assert_eq!(response_with("```json\n\"x\"\n```").first_content().as_deref(), Some("\"x\""));
    }

    #[test]
    fn test_first_content_without_choices() {
        let response = ChatCompletionResponse { id: None, model: "m".into(), choices: vec![] };
        assert_eq!(response.first_content(), None);
    }

    #[test]
    fn test_request_skips_unset_options() {
        let request = ChatCompletionRequest {
            model: "qwen/qwen3-32b".to_string(),
            messages: vec![ChatMessage::user("胡萝卜")],
            temperature: None,
            max_tokens: Some(20),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["max_tokens"], 20);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
