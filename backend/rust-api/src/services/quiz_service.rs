use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::metrics::{ANSWERS_SUBMITTED_TOTAL, PROMPTS_RELAYED_TOTAL};
use crate::models::{
    AnswerOutcome, ConversationTurn, RosterEntry, SolvedQuestion, StateDocument, UserRecord,
};

use super::catalog_service::{IdentityCatalog, PersonaCatalog, QuestionCatalog};
use super::relay_service::{assemble_messages, AssistantRelay, RelayError};
use super::scoring;
use super::state_store::StateStore;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unknown question {0}")]
    UnknownQuestion(u32),
    #[error("invalid system prompt ID {0}")]
    UnknownPersona(u32),
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Quiz operations over the shared state store and the read-only catalogs.
pub struct QuizService {
    store: StateStore,
    questions: QuestionCatalog,
    identities: IdentityCatalog,
    personas: PersonaCatalog,
    relay: Arc<dyn AssistantRelay>,
}

impl QuizService {
    pub fn new(
        store: StateStore,
        questions: QuestionCatalog,
        identities: IdentityCatalog,
        personas: PersonaCatalog,
        relay: Arc<dyn AssistantRelay>,
    ) -> Self {
        Self {
            store,
            questions,
            identities,
            personas,
            relay,
        }
    }

    /// Checks credentials and makes sure the user has a state record.
    pub async fn authenticate_login(&self, username: &str, password: &str) -> Result<(), QuizError> {
        if !self.identities.verify(username, password) {
            tracing::warn!("Rejected login for {}", username);
            return Err(QuizError::InvalidCredentials);
        }

        let known = self
            .store
            .read(|document| document.users.contains_key(username))
            .await;
        if !known {
            self.store
                .mutate(|document| {
                    document.get_or_create(username);
                })
                .await;
        }

        tracing::info!("User {} logged in", username);
        Ok(())
    }

    pub async fn submit_answer(
        &self,
        username: &str,
        question_id: u32,
        answer: &str,
    ) -> Result<(AnswerOutcome, UserRecord), QuizError> {
        let question = self
            .questions
            .get(question_id)
            .ok_or(QuizError::UnknownQuestion(question_id))?;

        let (outcome, user) = self
            .store
            .mutate(|document| {
                let user = document.get_or_create(username);
                let outcome = scoring::evaluate(user, question, answer, Utc::now());
                (outcome, user.clone())
            })
            .await;

        ANSWERS_SUBMITTED_TOTAL
            .with_label_values(&[outcome.as_str()])
            .inc();
        tracing::info!(
            "Answer evaluated: user={}, question={}, outcome={}, total_score={}",
            username,
            question_id,
            outcome.as_str(),
            user.total_score
        );

        Ok((outcome, user))
    }

    /// Current record of `username`; an empty record if they have no state yet.
    pub async fn get_user_state(&self, username: &str) -> UserRecord {
        self.store
            .read(|document| document.users.get(username).cloned())
            .await
            .unwrap_or_else(|| UserRecord::new(username))
    }

    /// Sends `prompt` to the assistant in the given persona and records the
    /// exchange.
    ///
    /// `question_id` defaults to the user's current question. The store lock
    /// is not held during the assistant call, and nothing is recorded unless
    /// the call succeeds.
    pub async fn submit_prompt(
        &self,
        username: &str,
        question_id: Option<u32>,
        persona_id: u32,
        prompt: &str,
    ) -> Result<String, QuizError> {
        if prompt.trim().is_empty() {
            return Err(QuizError::EmptyPrompt);
        }
        let persona = self
            .personas
            .prompt(persona_id)
            .ok_or(QuizError::UnknownPersona(persona_id))?;

        let (question_id, history) = self
            .store
            .read(|document| {
                let user = document.users.get(username);
                let question_id = question_id
                    .unwrap_or_else(|| user.map(UserRecord::current_question).unwrap_or(1));
                let history = user
                    .and_then(|user| user.progress(question_id))
                    .map(|progress| progress.prompt_history.clone())
                    .unwrap_or_default();
                (question_id, history)
            })
            .await;

        if self.questions.get(question_id).is_none() {
            return Err(QuizError::UnknownQuestion(question_id));
        }

        let messages = assemble_messages(persona, &history, prompt);
        let reply = match self.relay.relay(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                PROMPTS_RELAYED_TOTAL.with_label_values(&["error"]).inc();
                tracing::error!(
                    "Assistant call failed: user={}, question={}: {}",
                    username,
                    question_id,
                    e
                );
                return Err(e.into());
            }
        };
        PROMPTS_RELAYED_TOTAL.with_label_values(&["success"]).inc();

        let turn = ConversationTurn {
            user_prompt: prompt.to_string(),
            system_prompt_id: persona_id,
            result: reply.clone(),
            at: Utc::now(),
        };
        self.store
            .mutate(|document| {
                document
                    .get_or_create(username)
                    .progress_mut(question_id)
                    .prompt_history
                    .push(turn);
            })
            .await;

        tracing::info!(
            "Prompt recorded: user={}, question={}, persona={}",
            username,
            question_id,
            persona_id
        );
        Ok(reply)
    }

    /// Every user with score and solved questions, ordered by username.
    pub async fn list_all_users(&self) -> Vec<RosterEntry> {
        self.store
            .read(|document| build_roster(document, &self.questions))
            .await
    }

    pub fn questions(&self) -> &QuestionCatalog {
        &self.questions
    }

    pub fn identities(&self) -> &IdentityCatalog {
        &self.identities
    }

    pub fn personas(&self) -> &PersonaCatalog {
        &self.personas
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

fn build_roster(document: &StateDocument, questions: &QuestionCatalog) -> Vec<RosterEntry> {
    document
        .users
        .values()
        .map(|user| {
            let solved_questions = user
                .per_question
                .iter()
                .filter_map(|(id, progress)| {
                    progress.solved_at().map(|solved_at| SolvedQuestion {
                        question_id: *id,
                        solved_at,
                        // Questions removed from the catalog still show up, worth 0.
                        score: questions.get(*id).map(|q| q.score).unwrap_or(0),
                    })
                })
                .collect();

            RosterEntry {
                username: user.username.clone(),
                total_score: user.total_score,
                solved_questions,
            }
        })
        .collect()
}
