use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedQuestion {
    pub question_id: u32,
    pub solved_at: DateTime<Utc>,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
    pub total_score: i64,
    pub solved_questions: Vec<SolvedQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RosterResponse {
    pub users: Vec<RosterEntry>,
}
