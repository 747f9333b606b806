use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: u32,
    pub answer: String,
}

/// Result of evaluating one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    AlreadySolved,
    Correct,
    Incorrect,
}

impl AnswerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOutcome::AlreadySolved => "already_solved",
            AnswerOutcome::Correct => "correct",
            AnswerOutcome::Incorrect => "incorrect",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AnswerOutcome::AlreadySolved => "already solved",
            AnswerOutcome::Correct => "correct answer",
            AnswerOutcome::Incorrect => "wrong answer",
        }
    }

    /// `true` for anything but a wrong answer.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AnswerOutcome::Incorrect)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub ok: bool,
    pub description: String,
    pub outcome: AnswerOutcome,
    pub total_score: i64,
    pub last_solved_question: u32,
}
