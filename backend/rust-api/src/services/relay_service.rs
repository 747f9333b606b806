use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RelayConfig;
use crate::models::{ConversationTurn, RelayMessage};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("assistant returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("assistant response could not be decoded: {0}")]
    Decode(String),
    #[error("assistant returned no reply")]
    EmptyReply,
}

/// Outbound assistant call: ordered messages in, reply text out.
#[async_trait]
pub trait AssistantRelay: Send + Sync {
    async fn relay(&self, messages: Vec<RelayMessage>) -> Result<String, RelayError>;
}

/// Persona first, then the stored exchanges in order, then the new prompt.
pub fn assemble_messages(
    persona_prompt: &str,
    history: &[ConversationTurn],
    user_prompt: &str,
) -> Vec<RelayMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(RelayMessage::system(persona_prompt));
    for turn in history {
        messages.push(RelayMessage::user(turn.user_prompt.clone()));
        messages.push(RelayMessage::assistant(turn.result.clone()));
    }
    messages.push(RelayMessage::user(user_prompt));
    messages
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [RelayMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: RelayMessage,
}

/// OpenAI-compatible chat completions client.
pub struct ChatCompletionRelay {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AssistantRelay for ChatCompletionRelay {
    async fn relay(&self, messages: Vec<RelayMessage>) -> Result<String, RelayError> {
        tracing::debug!(
            "Calling assistant: model={}, messages={}",
            self.model,
            messages.len()
        );

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.bytes().await?;
        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&raw).map_err(|e| RelayError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(RelayError::EmptyReply)
    }
}
