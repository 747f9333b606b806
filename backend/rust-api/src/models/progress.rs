use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submitted answer. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub question_id: u32,
    pub answer: String,
    pub correct: bool,
    pub at: DateTime<Utc>,
}

/// One prompt/reply exchange with the assistant. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_prompt: String,
    pub system_prompt_id: u32,
    pub result: String,
    pub at: DateTime<Utc>,
}

/// Per-user, per-question history.
///
/// Whether the question is solved is derived from `attempt_history`; there is
/// no stored flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionProgress {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub attempt_history: Vec<AttemptRecord>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub prompt_history: Vec<ConversationTurn>,
}

impl QuestionProgress {
    pub fn count_by_correctness(&self, correct: bool) -> usize {
        self.attempt_history
            .iter()
            .filter(|attempt| attempt.correct == correct)
            .count()
    }

    pub fn is_solved(&self) -> bool {
        self.attempt_history.iter().any(|attempt| attempt.correct)
    }

    /// Timestamp of the first correct attempt.
    pub fn solved_at(&self) -> Option<DateTime<Utc>> {
        self.attempt_history
            .iter()
            .find(|attempt| attempt.correct)
            .map(|attempt| attempt.at)
    }
}

/// Mutable quiz state of a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub total_score: i64,
    /// Highest question id ever solved. Never decreases.
    #[serde(default)]
    pub last_solved_question: u32,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub per_question: BTreeMap<u32, QuestionProgress>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            total_score: 0,
            last_solved_question: 0,
            per_question: BTreeMap::new(),
        }
    }

    pub fn progress(&self, question_id: u32) -> Option<&QuestionProgress> {
        self.per_question.get(&question_id)
    }

    /// Returns the progress entry for `question_id`, creating an empty one on
    /// first use.
    pub fn progress_mut(&mut self, question_id: u32) -> &mut QuestionProgress {
        self.per_question.entry(question_id).or_default()
    }

    /// Question the user is expected to work on next. Stays on the last id
    /// once `u32::MAX` has been solved.
    pub fn current_question(&self) -> u32 {
        self.last_solved_question.saturating_add(1)
    }
}

/// Serialized form of the whole store, as written to the snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub users: BTreeMap<String, UserRecord>,
}
