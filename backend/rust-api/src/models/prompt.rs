use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct PromptRequest {
    #[validate(length(min = 1, message = "Prompt must not be empty"))]
    pub user_prompt: String,
    pub system_prompt_id: u32,
    /// Defaults to the user's current question when absent.
    #[serde(default)]
    pub question_id: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptResponse {
    pub result: String,
}

/// Chat message exchanged with the assistant backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub role: String,
    pub content: String,
}

impl RelayMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role("assistant", content)
    }

    fn with_role(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}
