use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, ChatModel};

/// OpenAI-compatible chat-completions client. Any endpoint speaking
/// `/v1/chat/completions` with image_url content parts works.
pub struct OpenAiChat {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    pub fn new(endpoint: &str, api_key: &str, model: &str, temperature: f32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            client,
        }
    }

    /// Read the API key from `OPENAI_API_KEY`.
    pub fn from_env(endpoint: &str, model: &str, temperature: f32) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY is not set"))?;
        Ok(Self::new(endpoint, &api_key, model, temperature))
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    anyhow!("Cannot connect to chat endpoint at {}", self.endpoint)
                } else {
                    anyhow!("Chat request failed: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat endpoint error ({}): {}", status, body));
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Chat endpoint returned no choices"))
    }
}
