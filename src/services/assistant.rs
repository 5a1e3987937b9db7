//! AI assistant service implementation
//!
//! Client for the language-model messages API behind the campus assistant.
//! Prompts are rate limited per user; the reply is the first text block of
//! the model's response.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::middleware::{RateLimitConfig, RateLimiter};
use crate::utils::errors::{AssistantError, Result, SpartanvilleError};
use crate::utils::helpers::{generate_request_id, truncate_text};
use crate::utils::logging::log_api_error;

const API_VERSION: &str = "2023-06-01";

/// One content block of a model response
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Model response envelope
#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

/// AI assistant service
#[derive(Clone)]
pub struct AssistantService {
    client: Client,
    settings: Settings,
    rate_limiter: RateLimiter,
}

impl AssistantService {
    /// Create a new AssistantService instance
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.assistant.timeout_seconds))
            .user_agent("Spartanville/1.0")
            .build()
            .map_err(SpartanvilleError::Http)?;

        let rate_limiter = RateLimiter::new(RateLimitConfig {
            max_requests: settings.assistant.max_prompts_per_minute,
            window_duration: Duration::from_secs(60),
            burst_allowance: 2,
        });

        Ok(Self {
            client,
            settings,
            rate_limiter,
        })
    }

    /// Ask the assistant a question on behalf of a user
    pub async fn ask(&self, user_id: &str, prompt: &str) -> Result<String> {
        if !self.is_enabled() {
            return Err(SpartanvilleError::ServiceUnavailable(
                "The assistant is disabled".to_string(),
            ));
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SpartanvilleError::InvalidInput(
                "Prompt must not be empty".to_string(),
            ));
        }

        self.rate_limiter.check_rate_limit(user_id)?;

        debug!(
            user_id = user_id,
            prompt = %truncate_text(prompt, 80),
            "Sending assistant prompt"
        );

        let reply = self.send_prompt(prompt).await?;
        info!(user_id = user_id, reply_chars = reply.len(), "Assistant replied");
        Ok(reply)
    }

    async fn send_prompt(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.settings.assistant.api_url);
        let request_id = generate_request_id();

        let body = json!({
            "model": self.settings.assistant.model,
            "max_tokens": self.settings.assistant.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt,
                }
            ],
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.settings.assistant.api_key)
            .header("anthropic-version", API_VERSION)
            .header("x-request-id", &request_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpartanvilleError::Assistant(AssistantError::Timeout)
                } else if e.is_connect() {
                    SpartanvilleError::Assistant(AssistantError::ServiceUnavailable)
                } else {
                    SpartanvilleError::Assistant(AssistantError::RequestFailed(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(request_id = %request_id, status = %status, "Assistant request rejected");
            log_api_error("assistant", &format!("HTTP {}", status), None);
            return Err(SpartanvilleError::Assistant(AssistantError::RequestFailed(
                format!("HTTP {}: {}", status, truncate_text(&error_text, 200)),
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| SpartanvilleError::Assistant(AssistantError::InvalidResponse(e.to_string())))?;

        let reply = parsed
            .content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.clone())
            .ok_or(SpartanvilleError::Assistant(AssistantError::EmptyResponse))?;

        Ok(reply)
    }

    /// Check if the assistant feature is enabled
    pub fn is_enabled(&self) -> bool {
        self.settings.features.assistant
    }
}

impl std::fmt::Debug for AssistantService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantService")
            .field("model", &self.settings.assistant.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service(enabled: bool) -> AssistantService {
        let mut settings = Settings::default();
        settings.auth.api_key = "test-key".to_string();
        settings.assistant.api_key = "test-key".to_string();
        settings.features.assistant = enabled;
        AssistantService::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_assistant_rejects() {
        let assistant = service(false);
        let err = assistant.ask("user-1", "hello").await.unwrap_err();
        assert_matches!(err, SpartanvilleError::ServiceUnavailable(_));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_remote_call() {
        let assistant = service(true);
        let err = assistant.ask("user-1", "   ").await.unwrap_err();
        assert_matches!(err, SpartanvilleError::InvalidInput(_));
    }

    #[test]
    fn test_response_parsing_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
                {"type": "text", "text": "Welcome Week starts Monday."}
            ]
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        let text = parsed
            .content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.clone());
        assert_eq!(text.as_deref(), Some("Welcome Week starts Monday."));
    }
}
