use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::middlewares::auth::JwtService;

use catalog_service::{IdentityCatalog, PersonaCatalog, QuestionCatalog};
use quiz_service::QuizService;
use relay_service::{AssistantRelay, ChatCompletionRelay};
use snapshot_service::SnapshotManager;
use state_store::StateStore;

pub struct AppState {
    pub config: Config,
    pub quiz: QuizService,
    pub jwt: JwtService,
}

impl AppState {
    /// Loads catalogs, restores the last snapshot and builds the assistant client.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let questions = QuestionCatalog::load(&config.storage.questions_path)
            .await
            .context("Failed to load questions")?;
        let identities = IdentityCatalog::load(&config.storage.users_path)
            .await
            .context("Failed to load users")?;
        let personas = match PersonaCatalog::load(&config.storage.personas_path).await {
            Ok(personas) => personas,
            Err(e) => {
                tracing::warn!("No personas loaded, prompts will be rejected: {}", e);
                PersonaCatalog::default()
            }
        };

        tracing::info!(
            "Catalogs loaded: {} questions, {} users, {} personas",
            questions.len(),
            identities.len(),
            personas.len()
        );

        let relay = ChatCompletionRelay::new(&config.relay)
            .context("Failed to build assistant client")?;
        if config.relay.api_key.is_empty() {
            tracing::warn!("RELAY_API_KEY is empty, assistant calls will likely fail");
        }

        let store =
            StateStore::restore(SnapshotManager::new(&config.storage.state_path)).await;

        Ok(Self::from_parts(
            config,
            store,
            questions,
            identities,
            personas,
            Arc::new(relay),
        ))
    }

    pub fn from_parts(
        config: Config,
        store: StateStore,
        questions: QuestionCatalog,
        identities: IdentityCatalog,
        personas: PersonaCatalog,
        relay: Arc<dyn AssistantRelay>,
    ) -> Self {
        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds);
        let quiz = QuizService::new(store, questions, identities, personas, relay);
        Self { config, quiz, jwt }
    }
}

pub mod catalog_service;
pub mod quiz_service;
pub mod relay_service;
pub mod scoring;
pub mod snapshot_service;
pub mod state_store;
