use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A quiz question as loaded from the questions catalog.
///
/// Immutable after load. `penalty_try_count` is the number of wrong attempts
/// between two consecutive penalties; a catalog value of 0 is treated as 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: u32,
    pub answer: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub penalty: i64,
    #[serde(default = "default_penalty_try_count")]
    pub penalty_try_count: u32,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub per_user_answers: HashMap<String, String>,
}

fn default_penalty_try_count() -> u32 {
    1
}

impl QuestionDefinition {
    /// Canonical answer for `username`, honouring per-user overrides.
    pub fn correct_answer_for(&self, username: &str) -> &str {
        self.per_user_answers
            .get(username)
            .map(String::as_str)
            .unwrap_or(&self.answer)
    }

    pub fn penalty_period(&self) -> u32 {
        self.penalty_try_count.max(1)
    }
}

/// System prompt the assistant plays when hinting on a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: u32,
    pub prompt: String,
}
