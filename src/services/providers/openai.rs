use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::completion::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
    services::providers::CompletionProvider,
};
use reqwest::Client as HttpClient;

/// Completion provider backed by the OpenAI Chat Completions API
#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_key.clone(),
            config.openai_api_url.clone(),
            config.openai_model.clone(),
        )
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = self.build_request(prompt);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI API returned status {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let text = parsed.into_text().ok_or_else(|| {
            AppError::ExternalApi("OpenAI response contained no message content".to_string())
        })?;

        tracing::debug!(model = %self.model, chars = text.len(), "Completion received");

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_single_user_message() {
        let provider = OpenAiProvider::new("sk-test", "https://api.openai.com/v1/", "gpt-3.5-turbo");
        let request = provider.build_request("recommend something");
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content.as_deref(), Some("recommend something"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let provider = OpenAiProvider::new("sk-test", "http://llm.local/v1/", "m");
        assert_eq!(provider.api_url, "http://llm.local/v1");
    }
}
